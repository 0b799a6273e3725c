//! App (tenant principal) — the owner of all v1 memories and grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Created once by onboarding and never mutated beyond secret rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub id: Uuid,
    pub name: String,
    /// SHA-256 hex digest of the bearer secret; the clear secret is never stored.
    pub api_key_hash: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl App {
    pub fn new(name: impl Into<String>, api_key_hash: impl Into<String>, user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            api_key_hash: api_key_hash.into(),
            user_id: user_id.into(),
            created_at: now,
        }
    }
}
