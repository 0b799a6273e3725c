//! The policy engine: a versioned, declarative rule set with deterministic,
//! fail-closed evaluation for ingest, query, and tool-execution decisions.

pub mod context;
pub mod default_policy;
pub mod engine;
pub mod model;
pub mod spiral;

pub use default_policy::{default_policy, DEFAULT_POLICY_VERSION};
pub use engine::PolicyEngine;
pub use model::{Defaults, IngestDecision, PolicyDocument, PolicyTrace, QueryDecision, Rule, ThenActions, WhenValue};
pub use spiral::SpiralPolicy;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use memsub_types::audit_event::AccessPurpose;
    use memsub_types::memory_v2::*;
    use memsub_types::{ScopeType, ScopeV2, TenantId};

    fn base_memory(truth_mode: TruthMode, sensitivity_level: SensitivityLevel, categories: Vec<&str>) -> MemoryObject {
        let now = Utc::now();
        MemoryObject {
            id: memsub_types::MemoryId::new(),
            tenant_id: TenantId::new(),
            scope: ScopeV2 { scope_type: ScopeType::User, scope_id: "u1".to_string(), flags: vec![] },
            r#type: MemoryType::Event,
            truth_mode,
            state: MemoryState::Active,
            sensitivity: Sensitivity {
                level: sensitivity_level,
                categories: categories.into_iter().map(String::from).collect(),
                handling: SensitivityHandling::Normal,
            },
            ownership: Ownership {
                owner_type: OwnerType::User,
                owners: vec![],
                claimant: None,
                subjects: vec![],
                dispute_state: DisputeState::Undisputed,
                visibility: Visibility::Private,
            },
            temporal: Temporal {
                occurred_at_observed: now,
                occurred_at_claimed: None,
                precision: TemporalPrecision::Exact,
                confidence: 1.0,
                range: None,
                ordering_uncertainty: false,
            },
            content: ContentBody { format: ContentFormat::Text, language: None, text: Some("x".into()), json: None },
            affect: Affect { valence: 0.0, arousal: 0.0, labels: vec![], confidence: 1.0, history: vec![] },
            strength: Strength { initial: 1.0, current: 1.0, decay_model: DecayModel::None, half_life_days: None, last_reinforced_at: None },
            provenance: Provenance { source: ProvenanceSource::User, surface: None, transform_chain: vec![], policy_version: DEFAULT_POLICY_VERSION.to_string(), confidence: 1.0, derived_from: vec![] },
            reconsolidation_policy: ReconsolidationPolicy::AppendOnly,
            payloads: TypedPayloads::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn ingest_seals_events_with_sensitive_categories() {
        let engine = PolicyEngine::new(default_policy());
        let draft = base_memory(TruthMode::SubjectiveExperience, SensitivityLevel::Medium, vec!["shame"]);
        let decision = engine.evaluate_ingest(&draft);
        assert_eq!(decision.state, MemoryState::Sealed);
        assert!(decision.matched_rules_contains("seal_sensitive_events"));
    }

    #[test]
    fn query_denies_nonfactual_truth_modes_for_task_execution() {
        let engine = PolicyEngine::new(default_policy());
        let memory = base_memory(TruthMode::Counterfactual, SensitivityLevel::Low, vec![]);
        assert!(!engine.evaluate_tool_execution(&memory, AccessPurpose::TaskExecution));
        assert!(engine.evaluate_tool_execution(&memory, AccessPurpose::ChatResponse));
    }

    #[test]
    fn trace_matched_rules_are_a_subset_of_the_compiled_policy() {
        let engine = PolicyEngine::new(default_policy());
        let mut memory = base_memory(TruthMode::Procedural, SensitivityLevel::Low, vec![]);
        memory.r#type = MemoryType::Impact;
        let decision = engine.evaluate_query(&memory, AccessPurpose::ChatResponse);
        let all_ids: Vec<&str> = engine.document().rules.iter().map(|r| r.id.as_str()).collect();
        for matched in &decision.trace.matched_rules {
            assert!(all_ids.contains(&matched.as_str()));
        }
        assert_eq!(decision.trace.policy_version, engine.policy_version());
    }

    trait MatchedRulesContains {
        fn matched_rules_contains(&self, id: &str) -> bool;
    }

    impl MatchedRulesContains for IngestDecision {
        fn matched_rules_contains(&self, id: &str) -> bool {
            self.trace.matched_rules.iter().any(|r| r == id)
        }
    }
}
