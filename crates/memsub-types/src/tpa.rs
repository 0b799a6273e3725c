//! ThoughtPatternArtifact — ephemeral, scope-local marker of a detected
//! cognitive pattern, consulted by policy to tighten thresholds for its TTL.
//! Never computed by this crate (an Open Question the core leaves
//! unimplemented); externally-supplied or test-seeded artifacts are honored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ArtifactId;
use crate::memory_v2::ScopeV2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    CatastrophicProjection,
    RunawayCounterfactual,
    CertaintyInflation,
    FutureCollapse,
    NegativeFeedbackLoop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtPatternArtifact {
    pub id: ArtifactId,
    pub tenant_id: crate::id::TenantId,
    pub scope: ScopeV2,
    pub pattern_type: PatternType,
    pub confidence: f64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Default 45 minutes from `created_at`.
    pub expires_at: DateTime<Utc>,
}

impl ThoughtPatternArtifact {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
