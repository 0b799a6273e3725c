//! v1 read grant: a bearer-token record authorizing repeated reads under
//! fixed parameters for 24 hours.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::memory_v1::Scope;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadGrant {
    pub id: Uuid,
    /// SHA-256 hex digest of the bearer token; the clear token is never stored.
    pub token_hash: String,
    pub user_id: String,
    pub app_id: Uuid,
    pub scope: Scope,
    pub domain: Option<String>,
    pub purpose: String,
    pub purpose_class: String,
    pub max_age_days: Option<u16>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoke_reason: Option<String>,
}

impl ReadGrant {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}
