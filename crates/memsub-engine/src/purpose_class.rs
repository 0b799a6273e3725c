//! Purpose-class derivation and the v1 purpose-to-scope policy matrix.
//! Normalization is pure and idempotent (property 2 in the testable
//! properties list): the derived class depends only on the normalized
//! purpose string.

use memsub_types::memory_v1::Scope;

/// Maps free-text purpose to a normalized class by keyword.
pub fn normalize_purpose(purpose: &str) -> String {
    let p = purpose.trim().to_lowercase();
    if p.contains("generate") || p.contains("content") {
        "content_generation".to_string()
    } else if p.contains("schedul") || p.contains("meeting") || p.contains("calendar") {
        "scheduling".to_string()
    } else if p.contains("communicat") || p.contains("tone") || p.contains("message") {
        "communication".to_string()
    } else if p.contains("accessib") {
        "accessibility".to_string()
    } else if p.contains("attention") || p.contains("focus") {
        "attention".to_string()
    } else if p.contains("constraint") || p.contains("rule") {
        "constraints".to_string()
    } else {
        "general".to_string()
    }
}

fn allowed_classes(scope: Scope) -> &'static [&'static str] {
    match scope {
        Scope::Preferences => &["content_generation", "general"],
        Scope::Constraints => &["constraints", "general"],
        Scope::Communication => &["communication", "general"],
        Scope::Accessibility => &["accessibility", "general"],
        Scope::Schedule => &["scheduling", "general"],
        Scope::Attention => &["attention", "general"],
    }
}

pub fn is_allowed(scope: Scope, purpose_class: &str) -> bool {
    allowed_classes(scope).contains(&purpose_class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_purpose("Generate Content for a blog");
        let twice = normalize_purpose(&once);
        assert_eq!(normalize_purpose(&once), normalize_purpose(&twice));
    }

    #[test]
    fn scheduling_purpose_is_denied_for_preferences_scope() {
        let class = normalize_purpose("schedule meeting");
        assert_eq!(class, "scheduling");
        assert!(!is_allowed(Scope::Preferences, &class));
    }

    #[test]
    fn content_generation_purpose_is_allowed_for_preferences_scope() {
        let class = normalize_purpose("generate content");
        assert_eq!(class, "content_generation");
        assert!(is_allowed(Scope::Preferences, &class));
    }
}
