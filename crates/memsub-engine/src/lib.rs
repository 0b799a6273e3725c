//! The memory substrate engine: retrieval, impact extraction, reconstruction,
//! the v1 legacy path, and v2 lifecycle operations, wired to a `Store`, a
//! `PolicyEngine`, and injected `Clock`/`RNG` collaborators.

pub mod clock;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod impact_extractor;
pub mod lifecycle;
pub mod purpose_class;
pub mod reconstruction;
pub mod retrieval;
pub mod rng;
pub mod v1;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::Engine;
pub use error::EngineError;
pub use reconstruction::ReconstructResult;
pub use retrieval::RetrievalResult;
pub use rng::{sha256_hex, SystemTokenRng, TokenRng};

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use memsub_policy::{default_policy, PolicyEngine};
    use memsub_types::memory_v1::{MemorySource, Scope};
    use memsub_types::memory_v2::{
        Affect, ContentBody, ContentFormat, DecayModel, DisputeState, MemoryType, OwnerType,
        Ownership, ReconsolidationPolicy, Sensitivity, SensitivityHandling, SensitivityLevel,
        Strength, Temporal, TemporalPrecision, TruthMode, TypedPayloads, Visibility,
    };
    use memsub_types::memory_v2::{Provenance, ProvenanceSource};
    use memsub_types::{ScopeType, ScopeV2, TenantId};
    use memsub_types::api::{
        ContinueReadRequest, CreateMemoryV1Request, CreateMemoryV2Request, ReadMemoryV1Request,
        RevokeReadRequest,
    };

    use super::*;

    fn test_engine(store: memsub_store::Store, now: chrono::DateTime<Utc>) -> Engine {
        Engine::new(store, PolicyEngine::new(default_policy()), Box::new(FixedClock(now)), Box::new(SystemTokenRng))
    }

    fn opened_store() -> (tempfile::TempDir, memsub_store::Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = memsub_store::Store::open(dir.path().join("s.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn v1_create_read_continue_revoke_round_trip() {
        let (_dir, store) = opened_store();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let engine = test_engine(store, now);

        let app_id = uuid::Uuid::new_v4();
        engine
            .create_memory_v1(CreateMemoryV1Request {
                user_id: "u1".to_string(),
                scope: Scope::Preferences,
                domain: None,
                source: MemorySource::ExplicitUserInput,
                ttl_days: 30,
                value_json: serde_json::json!({"likes": ["tea"]}),
                app_id,
            })
            .unwrap();

        let read = engine
            .read_memory_v1(ReadMemoryV1Request {
                user_id: "u1".to_string(),
                scope: Scope::Preferences,
                domain: None,
                purpose: "generate content".to_string(),
                max_age_days: None,
                app_id,
            })
            .unwrap();
        assert!(read.summary_text.contains("tea"));

        let continued = engine.continue_read(ContinueReadRequest { revocation_token: read.revocation_token.clone(), max_age_days: None }).unwrap();
        assert_eq!(continued.summary_struct, read.summary_struct);

        engine.revoke_read(RevokeReadRequest { revocation_token: read.revocation_token.clone() }).unwrap();
        let after_revoke = engine.continue_read(ContinueReadRequest { revocation_token: read.revocation_token, max_age_days: None });
        assert!(matches!(after_revoke, Err(EngineError::Revoked)));
    }

    #[test]
    fn scheduling_purpose_is_denied_for_preferences_scope() {
        let (_dir, store) = opened_store();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let engine = test_engine(store, now);
        let app_id = uuid::Uuid::new_v4();

        let result = engine.read_memory_v1(ReadMemoryV1Request {
            user_id: "u1".to_string(),
            scope: Scope::Preferences,
            domain: None,
            purpose: "schedule a meeting".to_string(),
            max_age_days: None,
            app_id,
        });
        assert!(matches!(result, Err(EngineError::PolicyDenied(_))));
    }

    fn v2_event(tenant_id: &TenantId, text: &str, categories: Vec<&str>, now: chrono::DateTime<Utc>) -> CreateMemoryV2Request {
        CreateMemoryV2Request {
            tenant_id: tenant_id.clone(),
            scope: ScopeV2 { scope_type: ScopeType::User, scope_id: "u1".to_string(), flags: vec![] },
            r#type: MemoryType::Event,
            truth_mode: TruthMode::SubjectiveExperience,
            sensitivity: Sensitivity {
                level: SensitivityLevel::Medium,
                categories: categories.into_iter().map(String::from).collect(),
                handling: SensitivityHandling::Normal,
            },
            ownership: Ownership { owner_type: OwnerType::User, owners: vec![], claimant: None, subjects: vec![], dispute_state: DisputeState::Undisputed, visibility: Visibility::Private },
            temporal: Temporal { occurred_at_observed: now, occurred_at_claimed: None, precision: TemporalPrecision::Exact, confidence: 1.0, range: None, ordering_uncertainty: false },
            content: ContentBody { format: ContentFormat::Text, language: None, text: Some(text.to_string()), json: None },
            affect: Affect { valence: 0.0, arousal: 0.0, labels: vec![], confidence: 0.5, history: vec![] },
            strength: Strength { initial: 1.0, current: 1.0, decay_model: DecayModel::None, half_life_days: None, last_reinforced_at: None },
            provenance: Provenance { source: ProvenanceSource::User, surface: None, transform_chain: vec![], policy_version: "unset".to_string(), confidence: 1.0, derived_from: vec![] },
            reconsolidation_policy: ReconsolidationPolicy::AppendOnly,
            payloads: TypedPayloads::default(),
        }
    }

    #[test]
    fn sensitive_event_is_sealed_and_does_not_derive_an_impact() {
        let (_dir, store) = opened_store();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let engine = test_engine(store, now);
        let tenant_id = TenantId::new();

        let resp = engine.create_memory_v2(v2_event(&tenant_id, "a gentle retelling", vec!["trauma"], now)).unwrap();
        assert_eq!(resp.state, memsub_types::MemoryState::Sealed);
    }

    #[test]
    fn ordinary_event_derives_an_impact_link() {
        let (_dir, store) = opened_store();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let engine = test_engine(store, now);
        let tenant_id = TenantId::new();

        let resp = engine.create_memory_v2(v2_event(&tenant_id, "please be gentle and caring", vec![], now)).unwrap();
        assert_eq!(resp.state, memsub_types::MemoryState::Active);

        let links = engine.store().links_from_parent(resp.id.as_str()).unwrap();
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn reconstruction_never_quotes_sealed_narrative() {
        let (_dir, store) = opened_store();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let engine = test_engine(store, now);
        let tenant_id = TenantId::new();

        let mut req = v2_event(&tenant_id, "private", vec!["trauma"], now);
        req.content.text = Some("private".to_string());
        let resp = engine.create_memory_v2(req).unwrap();
        assert_eq!(resp.state, memsub_types::MemoryState::Sealed);

        let scope = ScopeV2 { scope_type: ScopeType::User, scope_id: "u1".to_string(), flags: vec![] };
        let caller = memsub_types::audit_event::Caller { client_id: "test".to_string(), user_id: "u1".to_string(), ip: None };
        let (result, _log) = engine
            .reconstruct_v2(caller, tenant_id, scope, memsub_types::audit_event::AccessPurpose::ChatResponse, None, false)
            .unwrap();
        assert!(!result.reconstructed_context.contains("private"));
        assert!(result.sources.get("events").unwrap().as_array().unwrap().is_empty());
    }
}
