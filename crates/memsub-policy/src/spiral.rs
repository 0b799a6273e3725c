//! The frozen `spiral` sub-policy: tightens thresholds while a
//! [`ThoughtPatternArtifact`] is active in the target scope. This crate never
//! computes a TPA from ingest signals — only consults one if the caller
//! supplies or seeds it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpiralPolicy {
    pub ttl_minutes: u32,
    pub block_tool_execution: bool,
    pub block_reinforcement: bool,
    pub block_new_impacts: bool,
    pub seed_activation_threshold_delta: f64,
}

impl Default for SpiralPolicy {
    fn default() -> Self {
        Self {
            ttl_minutes: 45,
            block_tool_execution: true,
            block_reinforcement: true,
            block_new_impacts: true,
            seed_activation_threshold_delta: 0.15,
        }
    }
}

impl SpiralPolicy {
    pub fn blocks_reinforcement(&self, active_artifact_present: bool) -> bool {
        active_artifact_present && self.block_reinforcement
    }

    pub fn blocks_new_impacts(&self, active_artifact_present: bool) -> bool {
        active_artifact_present && self.block_new_impacts
    }

    pub fn blocks_tool_execution(&self, active_artifact_present: bool) -> bool {
        active_artifact_present && self.block_tool_execution
    }

    pub fn adjusted_seed_threshold(&self, base: f64, active_artifact_present: bool) -> f64 {
        if active_artifact_present {
            (base + self.seed_activation_threshold_delta).min(1.0)
        } else {
            base
        }
    }
}
