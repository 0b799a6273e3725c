//! Pre-write input validation. Runs before policy evaluation and never has
//! side effects — a validation failure never reaches the policy engine.

use memsub_types::memory_v2::{ContentBody, ContentFormat};
use memsub_types::{detect_shape, ValueShape};

use crate::error::EngineError;

const SUSPICIOUS_PATTERNS: &[&str] = &["--", ";--", "/*", "*/", "xp_cmdshell", "' or '1'='1"];

pub fn validate_ttl_days(ttl_days: u16) -> Result<(), EngineError> {
    if !(1..=365).contains(&ttl_days) {
        return Err(EngineError::Validation(format!("ttl_days must be in 1..365, got {ttl_days}")));
    }
    Ok(())
}

pub fn validate_value_shape(value: &serde_json::Value) -> Result<ValueShape, EngineError> {
    detect_shape(value).map_err(|_| EngineError::Validation("value_json matches no known shape".to_string()))
}

/// Rejects free-text fields carrying obvious SQL-injection-like markers.
/// The store never builds a query from these strings, but accepting them
/// unfiltered would still let one leak into audit rows and logs verbatim.
pub fn validate_free_text(field: &str, value: &str) -> Result<(), EngineError> {
    let lower = value.to_lowercase();
    if SUSPICIOUS_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Err(EngineError::Validation(format!("{field} contains a disallowed pattern")));
    }
    Ok(())
}

/// A v2 `ContentBody` must carry the payload its declared format names.
pub fn validate_content_body(content: &ContentBody) -> Result<(), EngineError> {
    match content.format {
        ContentFormat::Text if content.text.is_none() => Err(EngineError::Validation("content.format is text but content.text is absent".to_string())),
        ContentFormat::Json if content.json.is_none() => Err(EngineError::Validation("content.format is json but content.json is absent".to_string())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_out_of_range_is_rejected() {
        assert!(validate_ttl_days(0).is_err());
        assert!(validate_ttl_days(366).is_err());
        assert!(validate_ttl_days(1).is_ok());
        assert!(validate_ttl_days(365).is_ok());
    }

    #[test]
    fn unrecognized_shape_is_rejected() {
        assert!(validate_value_shape(&serde_json::json!(42)).is_err());
    }

    #[test]
    fn injection_like_free_text_is_rejected() {
        assert!(validate_free_text("purpose", "'; DROP TABLE memories; --").is_err());
        assert!(validate_free_text("purpose", "generate content").is_ok());
    }

    #[test]
    fn content_body_must_carry_its_declared_payload() {
        let text_ok = ContentBody { format: ContentFormat::Text, language: None, text: Some("hi".into()), json: None };
        let text_missing = ContentBody { format: ContentFormat::Text, language: None, text: None, json: None };
        assert!(validate_content_body(&text_ok).is_ok());
        assert!(validate_content_body(&text_missing).is_err());
    }
}
