//! The shipped default policy, as a Rust literal rather than an external
//! asset — it must be available with no I/O at engine construction, the way
//! a constitution is built from functions rather than loaded from disk.

use std::collections::BTreeMap;

use memsub_types::MemoryState;

use crate::model::{Defaults, PolicyDocument, Rule, ThenActions, WhenValue};

pub const DEFAULT_POLICY_VERSION: &str = "pol_2026_01_06_01";

fn when(pairs: &[(&str, WhenValue)]) -> BTreeMap<String, WhenValue> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn scalar(s: &str) -> WhenValue {
    WhenValue::Scalar(s.to_string())
}

fn list(items: &[&str]) -> WhenValue {
    WhenValue::List(items.iter().map(|s| s.to_string()).collect())
}

/// The default policy's five named rules.
pub fn default_policy() -> PolicyDocument {
    let rules = vec![
        Rule {
            id: "seal_sensitive_events".to_string(),
            when: when(&[
                ("memory.type", scalar("event")),
                ("memory.sensitivity.has_sensitive_category", scalar("true")),
            ]),
            then: ThenActions { set_state: Some(MemoryState::Sealed), ..Default::default() },
        },
        Rule {
            id: "allow_impacts_in_chat_response".to_string(),
            when: when(&[
                ("memory.type", scalar("impact")),
                ("request.purpose", scalar("chat_response")),
                ("memory.sensitivity.level", list(&["low", "medium"])),
            ]),
            then: ThenActions { allow_read: Some(true), include_in_prompt: Some(true), ..Default::default() },
        },
        Rule {
            id: "deny_disputed_factual_claims_in_chat_response".to_string(),
            when: when(&[
                ("memory.truth_mode", scalar("factual_claim")),
                ("memory.ownership.dispute_state", list(&["disputed", "contested"])),
                ("request.purpose", scalar("chat_response")),
            ]),
            then: ThenActions { allow_read: Some(false), ..Default::default() },
        },
        Rule {
            id: "deny_nonfactual_truth_modes_for_task_execution".to_string(),
            when: when(&[
                ("memory.truth_mode", list(&["counterfactual", "imagined", "socially_sourced"])),
                ("request.purpose", scalar("task_execution")),
            ]),
            then: ThenActions { allow_read: Some(false), ..Default::default() },
        },
        Rule {
            id: "derive_impacts_from_events_by_default".to_string(),
            when: when(&[("memory.type", scalar("event"))]),
            then: ThenActions { derive_impacts: Some(true), derive_seeds: Some(false), ..Default::default() },
        },
    ];

    PolicyDocument { policy_version: DEFAULT_POLICY_VERSION.to_string(), defaults: Defaults::default(), rules }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_has_five_named_rules() {
        let doc = default_policy();
        assert_eq!(doc.rules.len(), 5);
    }

    #[test]
    fn default_policy_version_is_stable() {
        assert_eq!(default_policy().policy_version, DEFAULT_POLICY_VERSION);
    }
}
