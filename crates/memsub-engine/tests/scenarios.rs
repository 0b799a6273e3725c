//! End-to-end scenarios from the testable-properties list: create/read
//! round-trips, policy denial, revocation, and the task-execution
//! truth-mode gate, driven through the same handlers a caller would use.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use memsub_engine::{handlers, Engine, EngineError, FixedClock, SystemTokenRng};
use memsub_policy::{default_policy, Defaults, PolicyDocument, PolicyEngine};
use memsub_store::Store;
use memsub_types::api::{
    ContinueReadRequest, CreateMemoryV1Request, CreateMemoryV2Request, QueryMemoriesRequest,
    ReadMemoryV1Request, RevokeReadRequest,
};
use memsub_types::audit_event::{AccessPurpose, Caller};
use memsub_types::memory_v1::{MemorySource, Scope};
use memsub_types::memory_v2::{
    Affect, ContentBody, ContentFormat, DecayModel, DisputeState, MemoryType, OwnerType,
    Ownership, Provenance, ProvenanceSource, ReconsolidationPolicy, Sensitivity,
    SensitivityHandling, SensitivityLevel, Strength, Temporal, TemporalPrecision, TruthMode,
    TypedPayloads, Visibility,
};
use memsub_types::{ApiErrorCode, AuditEventType, ScopeType, ScopeV2, TenantId};

fn opened_engine(now: chrono::DateTime<Utc>) -> (tempfile::TempDir, Engine) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("s.redb")).unwrap();
    let engine = Engine::new(store, PolicyEngine::new(default_policy()), Box::new(FixedClock(now)), Box::new(SystemTokenRng));
    (dir, engine)
}

fn caller() -> Caller {
    Caller { client_id: "test".to_string(), user_id: "u1".to_string(), ip: None }
}

/// S1 — create & read: case-insensitive dedupe + lexicographic sort on
/// write, a deterministic merge confidence of 0.6 for a single memory.
#[test]
fn s1_create_and_read_round_trip() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let (_dir, engine) = opened_engine(now);
    let app_id = Uuid::new_v4();

    let created = handlers::handle_create_memory_v1(
        &engine,
        CreateMemoryV1Request {
            user_id: "u1".to_string(),
            scope: Scope::Preferences,
            domain: None,
            source: MemorySource::ExplicitUserInput,
            ttl_days: 30,
            value_json: serde_json::json!({"likes": ["coffee", "Tea", "coffee"], "dislikes": ["milk"]}),
            app_id,
        },
    )
    .unwrap();
    assert_eq!(created.scope, Scope::Preferences);

    let read = handlers::handle_read_memory_v1(
        &engine,
        ReadMemoryV1Request {
            user_id: "u1".to_string(),
            scope: Scope::Preferences,
            domain: None,
            purpose: "generate content".to_string(),
            max_age_days: None,
            app_id,
        },
    )
    .unwrap();

    assert_eq!(read.summary_struct, serde_json::json!({"likes": ["Tea", "coffee"], "dislikes": ["milk"]}));
    assert_eq!(read.confidence, 0.6);
}

/// S2 — policy denial: a scheduling purpose against the preferences scope is
/// refused, and the denial leaves an audit row behind.
#[test]
fn s2_scheduling_purpose_denied_for_preferences_scope() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let (_dir, engine) = opened_engine(now);
    let app_id = Uuid::new_v4();

    handlers::handle_create_memory_v1(
        &engine,
        CreateMemoryV1Request {
            user_id: "u1".to_string(),
            scope: Scope::Preferences,
            domain: None,
            source: MemorySource::ExplicitUserInput,
            ttl_days: 30,
            value_json: serde_json::json!({"likes": ["tea"]}),
            app_id,
        },
    )
    .unwrap();

    let err = handlers::handle_read_memory_v1(
        &engine,
        ReadMemoryV1Request {
            user_id: "u1".to_string(),
            scope: Scope::Preferences,
            domain: None,
            purpose: "schedule a meeting".to_string(),
            max_age_days: None,
            app_id,
        },
    )
    .unwrap_err();

    assert_eq!(err.error.code, ApiErrorCode::AuthorizationError.as_upper_snake());
    assert!(err.error.message.contains("scheduling"));

    let rows = engine.store().audit_events_for_user("u1").unwrap();
    assert!(rows.iter().any(|r| r.event_type == AuditEventType::PolicyDenied && r.reason_code.as_deref() == Some("POLICY_DENIED")));
}

/// S3 — revoke kills continue: a revoked grant can no longer be continued,
/// and revoking it twice reports not-found rather than leaking its state.
#[test]
fn s3_revoke_kills_continue() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let (_dir, engine) = opened_engine(now);
    let app_id = Uuid::new_v4();

    handlers::handle_create_memory_v1(
        &engine,
        CreateMemoryV1Request {
            user_id: "u1".to_string(),
            scope: Scope::Preferences,
            domain: None,
            source: MemorySource::ExplicitUserInput,
            ttl_days: 30,
            value_json: serde_json::json!({"likes": ["tea"]}),
            app_id,
        },
    )
    .unwrap();

    let read = handlers::handle_read_memory_v1(
        &engine,
        ReadMemoryV1Request {
            user_id: "u1".to_string(),
            scope: Scope::Preferences,
            domain: None,
            purpose: "generate content".to_string(),
            max_age_days: None,
            app_id,
        },
    )
    .unwrap();
    let token = read.revocation_token;

    handlers::handle_continue_read(&engine, ContinueReadRequest { revocation_token: token.clone(), max_age_days: None }).unwrap();

    handlers::handle_revoke_read(&engine, RevokeReadRequest { revocation_token: token.clone() }).unwrap();

    let after_revoke = handlers::handle_continue_read(&engine, ContinueReadRequest { revocation_token: token.clone(), max_age_days: None });
    assert!(matches!(after_revoke, Err(ref e) if e.error.code == ApiErrorCode::AuthorizationError.as_upper_snake()));

    let second_revoke = handlers::handle_revoke_read(&engine, RevokeReadRequest { revocation_token: token });
    assert!(matches!(second_revoke, Err(ref e) if e.error.code == ApiErrorCode::NotFound.as_upper_snake()));
}

fn v2_memory(tenant_id: &TenantId, r#type: MemoryType, truth_mode: TruthMode, now: chrono::DateTime<Utc>) -> CreateMemoryV2Request {
    CreateMemoryV2Request {
        tenant_id: tenant_id.clone(),
        scope: ScopeV2 { scope_type: ScopeType::User, scope_id: "u1".to_string(), flags: vec![] },
        r#type,
        truth_mode,
        sensitivity: Sensitivity { level: SensitivityLevel::Low, categories: vec![], handling: SensitivityHandling::Normal },
        ownership: Ownership { owner_type: OwnerType::User, owners: vec![], claimant: None, subjects: vec![], dispute_state: DisputeState::Undisputed, visibility: Visibility::Private },
        temporal: Temporal { occurred_at_observed: now, occurred_at_claimed: None, precision: TemporalPrecision::Exact, confidence: 1.0, range: None, ordering_uncertainty: false },
        content: ContentBody { format: ContentFormat::Text, language: None, text: Some("noted".to_string()), json: None },
        affect: Affect { valence: 0.0, arousal: 0.0, labels: vec![], confidence: 0.5, history: vec![] },
        strength: Strength { initial: 1.0, current: 1.0, decay_model: DecayModel::None, half_life_days: None, last_reinforced_at: None },
        provenance: Provenance { source: ProvenanceSource::User, surface: None, transform_chain: vec![], policy_version: "unset".to_string(), confidence: 1.0, derived_from: vec![] },
        reconsolidation_policy: ReconsolidationPolicy::AppendOnly,
        payloads: TypedPayloads::default(),
    }
}

/// S5 — tool-execution safety: a counterfactual memory is never eligible
/// evidence for a task_execution purpose, regardless of policy defaults; a
/// factual memory in the same scope is unaffected. The test's policy
/// document reuses the shipped default rules but with permissive read
/// defaults, isolating the truth-mode gate (which §4.2 documents as
/// "independent of the declared rules") as the only thing under test.
#[test]
fn s5_nonfactual_memory_is_denied_for_task_execution() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("s.redb")).unwrap();
    let base = default_policy();
    let permissive = PolicyDocument {
        policy_version: base.policy_version.clone(),
        defaults: Defaults { write_allow: true, read_allow: true, include_in_prompt_allow: true },
        rules: base.rules,
    };
    let engine = Engine::new(store, PolicyEngine::new(permissive), Box::new(FixedClock(now)), Box::new(SystemTokenRng));
    let tenant_id = TenantId::new();

    let factual = engine.create_memory_v2(v2_memory(&tenant_id, MemoryType::Impact, TruthMode::FactualClaim, now)).unwrap();
    let counterfactual = engine.create_memory_v2(v2_memory(&tenant_id, MemoryType::Impact, TruthMode::Counterfactual, now)).unwrap();

    let resp = handlers::handle_query_memories(
        &engine,
        caller(),
        QueryMemoriesRequest {
            tenant_id,
            scope: ScopeV2 { scope_type: ScopeType::User, scope_id: "u1".to_string(), flags: vec![] },
            purpose: AccessPurpose::TaskExecution,
            query_text: None,
            filters: serde_json::Value::Null,
            limit: 10,
        },
    )
    .unwrap();

    assert!(resp.memory_ids.contains(&factual.id));
    assert!(!resp.memory_ids.contains(&counterfactual.id));
    assert!(resp.denied_ids.contains(&counterfactual.id));
    assert!(!resp.denied_ids.contains(&factual.id));
    assert_eq!(resp.policy_trace.get("policy_version").and_then(|v| v.as_str()), Some(base.policy_version.as_str()));
}

#[test]
fn policy_denied_v1_error_variant_carries_the_purpose_class() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let (_dir, engine) = opened_engine(now);
    let result = engine.read_memory_v1(ReadMemoryV1Request {
        user_id: "u1".to_string(),
        scope: Scope::Preferences,
        domain: None,
        purpose: "schedule a meeting".to_string(),
        max_age_days: None,
        app_id: Uuid::new_v4(),
    });
    match result {
        Err(EngineError::PolicyDenied(class)) => assert_eq!(class, "scheduling"),
        other => panic!("expected PolicyDenied, got {other:?}"),
    }
}
