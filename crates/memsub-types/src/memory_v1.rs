//! The v1 legacy memory shape: a single scope/domain keyed JSON payload
//! carrying a TTL and a detected [`ValueShape`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shape::ValueShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Preferences,
    Constraints,
    Communication,
    Accessibility,
    Schedule,
    Attention,
}

impl Scope {
    pub fn slug(self) -> &'static str {
        match self {
            Scope::Preferences => "preferences",
            Scope::Constraints => "constraints",
            Scope::Communication => "communication",
            Scope::Accessibility => "accessibility",
            Scope::Schedule => "schedule",
            Scope::Attention => "attention",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    ExplicitUserInput,
    InferredFromConversation,
    ImportedProfile,
    SystemDefault,
}

/// A single v1 memory row. Never updated after creation — superseding facts
/// are written as new rows and reconciled at read time by the merge engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryV1 {
    pub id: Uuid,
    pub user_id: String,
    pub scope: Scope,
    pub domain: Option<String>,
    pub value_json: serde_json::Value,
    pub value_shape: ValueShape,
    pub source: MemorySource,
    pub ttl_days: u16,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub app_id: Uuid,
}

impl MemoryV1 {
    /// `ttl_days` must already have been validated to the `1..=365` range by
    /// the caller (input validation happens before construction, per §7).
    pub fn new(
        user_id: impl Into<String>,
        scope: Scope,
        domain: Option<String>,
        value_json: serde_json::Value,
        value_shape: ValueShape,
        source: MemorySource,
        ttl_days: u16,
        app_id: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        let expires_at = now + Duration::days(ttl_days as i64);
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            scope,
            domain,
            value_json,
            value_shape,
            source,
            ttl_days,
            created_at: now,
            expires_at,
            app_id,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_at_is_monotone_with_created_at() {
        let now = Utc::now();
        let mem = MemoryV1::new(
            "u1",
            Scope::Preferences,
            None,
            serde_json::json!({}),
            ValueShape::KvMap,
            MemorySource::ExplicitUserInput,
            30,
            Uuid::new_v4(),
            now,
        );
        assert!(mem.expires_at > mem.created_at);
        assert!(mem.is_active(now));
        assert!(!mem.is_active(mem.expires_at));
    }
}
