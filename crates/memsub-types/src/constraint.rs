//! Atomic, narrative-free directives carried inside an `impact` memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::id::{ConstraintId, MemoryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Avoid,
    Prefer,
    Require,
    Tone,
    Style,
    Boundary,
    Safety,
    ClarifyFirst,
    AskPermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintTarget {
    Response,
    PromptContext,
    ToolExecution,
    MemoryOps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    LatestWins,
    MaxWeight,
    MinWeight,
    Union,
    Intersection,
    AppendOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSlot {
    pub slot: String,
    pub strategy: MergeStrategy,
    #[serde(default)]
    pub tie_breakers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub constraint_id: ConstraintId,
    pub kind: ConstraintKind,
    pub topic: String,
    pub target: ConstraintTarget,
    /// Identifier of the extraction rule (e.g. policy rule id or `tx_impact_extract_v2.1.0`)
    /// that produced this constraint.
    pub rule: String,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
    pub weight: f64,
    pub priority: i32,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub source_refs: Vec<MemoryId>,
    pub merge: MergeSlot,
}

impl Constraint {
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }
}
