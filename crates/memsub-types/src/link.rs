//! Directed edges between v2 memories produced by derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{LinkId, MemoryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRelationship {
    DerivedImpact,
    DerivedSeed,
    SummaryOf,
    Supersedes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedObjectLink {
    pub id: LinkId,
    pub parent_id: MemoryId,
    pub child_id: MemoryId,
    pub relationship: LinkRelationship,
    pub rule: String,
    pub strength_transfer: f64,
    pub created_at: DateTime<Utc>,
}

impl DerivedObjectLink {
    pub fn new(
        parent_id: MemoryId,
        child_id: MemoryId,
        relationship: LinkRelationship,
        rule: impl Into<String>,
        strength_transfer: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LinkId::new(),
            parent_id,
            child_id,
            relationship,
            rule: rule.into(),
            strength_transfer,
            created_at: now,
        }
    }
}
