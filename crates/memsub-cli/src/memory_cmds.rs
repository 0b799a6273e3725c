use anyhow::{anyhow, Result};
use uuid::Uuid;

use memsub_config::AppConfig;
use memsub_engine::handlers;
use memsub_engine::Engine;
use memsub_types::api::{
    ContinueReadRequest, CreateMemoryV1Request, CreateMemoryV2Request, DisputeAction,
    DisputeMemoryRequest, ExplainRequest, QueryMemoriesRequest, ReadMemoryV1Request,
    ReconstructRequest, ReinforceMemoryRequest, ReplayRequest, RevokeMemoryRequest,
    RevokeReadRequest, SealMemoryRequest,
};
use memsub_types::audit_event::{AccessPurpose, Caller};
use memsub_types::memory_v1::{MemorySource, Scope};
use memsub_types::memory_v2::ScopeV2;
use memsub_types::{ApiError, ScopeType, TenantId};

fn cli_caller() -> Caller {
    Caller { client_id: "memsub-cli".to_string(), user_id: "cli".to_string(), ip: None }
}

fn fail(err: ApiError) -> anyhow::Error {
    anyhow!("{err}")
}

pub(crate) fn run_stats(config: &AppConfig, engine: &Engine) -> Result<()> {
    let path = engine.store().path();
    println!("── memsub stats ──────────────────────────────────────");
    println!("  store path:      {}", path.display());
    match std::fs::metadata(path) {
        Ok(meta) => println!("  store size:      {} bytes", meta.len()),
        Err(_) => println!("  store size:      (not yet created)"),
    }
    println!("  grant ttl:       {}h", config.grant.ttl_hours);
    println!("  policy override: {}", if config.has_policy_override() { config.policy.document_path.as_str() } else { "(embedded default)" });
    println!("  policy version:  {}", engine.policy().policy_version());
    Ok(())
}

pub(crate) fn run_v1_create(
    engine: &Engine,
    user_id: String,
    scope: Scope,
    domain: Option<String>,
    source: MemorySource,
    ttl_days: u16,
    value_json: serde_json::Value,
    app_id: Uuid,
) -> Result<()> {
    let resp = handlers::handle_create_memory_v1(engine, CreateMemoryV1Request { user_id, scope, domain, source, ttl_days, value_json, app_id }).map_err(fail)?;
    println!("created {} (expires {})", resp.id, resp.expires_at);
    Ok(())
}

pub(crate) fn run_v1_read(
    engine: &Engine,
    user_id: String,
    scope: Scope,
    domain: Option<String>,
    purpose: String,
    max_age_days: Option<u16>,
    app_id: Uuid,
) -> Result<()> {
    let resp = handlers::handle_read_memory_v1(engine, ReadMemoryV1Request { user_id, scope, domain, purpose, max_age_days, app_id }).map_err(fail)?;
    println!("{}", resp.summary_text);
    println!("confidence: {:.2}", resp.confidence);
    println!("revocation_token: {}", resp.revocation_token);
    println!("expires_at: {}", resp.expires_at);
    Ok(())
}

pub(crate) fn run_v1_continue(engine: &Engine, token: String, max_age_days: Option<u16>) -> Result<()> {
    let resp = handlers::handle_continue_read(engine, ContinueReadRequest { revocation_token: token, max_age_days }).map_err(fail)?;
    println!("{}", resp.summary_text);
    println!("confidence: {:.2}", resp.confidence);
    Ok(())
}

pub(crate) fn run_v1_revoke(engine: &Engine, token: String) -> Result<()> {
    let resp = handlers::handle_revoke_read(engine, RevokeReadRequest { revocation_token: token }).map_err(fail)?;
    println!("revoked at {}", resp.revoked_at);
    Ok(())
}

pub(crate) fn run_v2_create(engine: &Engine, tenant_id: String, mut body: serde_json::Value) -> Result<()> {
    if let Some(obj) = body.as_object_mut() {
        obj.insert("tenant_id".to_string(), serde_json::to_value(TenantId::from(tenant_id.as_str()))?);
    }
    let req: CreateMemoryV2Request = serde_json::from_value(body)?;
    let resp = handlers::handle_create_memory_v2(engine, req).map_err(fail)?;
    println!("created {} state={:?} at {}", resp.id, resp.state, resp.created_at);
    Ok(())
}

pub(crate) fn run_v2_query(
    engine: &Engine,
    tenant_id: String,
    scope_type: ScopeType,
    scope_id: String,
    purpose: AccessPurpose,
    query_text: Option<String>,
    limit: usize,
) -> Result<()> {
    let req = QueryMemoriesRequest {
        tenant_id: tenant_id.as_str().into(),
        scope: ScopeV2 { scope_type, scope_id, flags: vec![] },
        purpose,
        query_text,
        filters: serde_json::Value::Null,
        limit,
    };
    let resp = handlers::handle_query_memories(engine, cli_caller(), req).map_err(fail)?;
    println!("memory_ids: {:?}", resp.memory_ids.iter().map(|id| id.as_str()).collect::<Vec<_>>());
    println!("impacts: {}", resp.impacts.len());
    println!("seeds: {}", resp.seeds.len());
    println!("events: {}", resp.events.len());
    println!("denied: {}", resp.denied_ids.len());
    println!("access_log_id: {}", resp.access_log_id);
    Ok(())
}

pub(crate) fn run_v2_reconstruct(
    engine: &Engine,
    tenant_id: String,
    scope_type: ScopeType,
    scope_id: String,
    purpose: AccessPurpose,
    query_text: Option<String>,
    include_events: bool,
) -> Result<()> {
    let req = ReconstructRequest { tenant_id: tenant_id.as_str().into(), scope: ScopeV2 { scope_type, scope_id, flags: vec![] }, purpose, query_text, include_events };
    let resp = handlers::handle_reconstruct(engine, cli_caller(), req).map_err(fail)?;
    println!("{}", resp.reconstructed_context);
    println!("confidence: {:.2}", resp.confidence);
    println!("access_log_id: {}", resp.access_log_id);
    Ok(())
}

pub(crate) fn run_v2_seal(engine: &Engine, tenant_id: String, memory_id: String) -> Result<()> {
    let state = handlers::handle_seal_memory(engine, SealMemoryRequest { tenant_id: tenant_id.as_str().into(), memory_id: memory_id.as_str().into() }).map_err(fail)?;
    println!("state: {state:?}");
    Ok(())
}

pub(crate) fn run_v2_revoke(engine: &Engine, tenant_id: String, memory_id: String) -> Result<()> {
    let resp = handlers::handle_revoke_memory(engine, RevokeMemoryRequest { tenant_id: tenant_id.as_str().into(), memory_id: memory_id.as_str().into() }).map_err(fail)?;
    println!("revoked {} at {}", resp.id, resp.revoked_at);
    if !resp.propagated_to.is_empty() {
        println!("cascaded to: {:?}", resp.propagated_to.iter().map(|id| id.as_str()).collect::<Vec<_>>());
    }
    Ok(())
}

pub(crate) fn run_v2_reinforce(engine: &Engine, tenant_id: String, memory_id: String, delta: Option<f64>) -> Result<()> {
    let resp = handlers::handle_reinforce_memory(engine, ReinforceMemoryRequest { tenant_id: tenant_id.as_str().into(), memory_id: memory_id.as_str().into(), delta }).map_err(fail)?;
    println!("strength now {:.3} (last reinforced {})", resp.strength_current, resp.last_reinforced_at);
    Ok(())
}

pub(crate) fn run_v2_recall(engine: &Engine, tenant_id: String, memory_id: String, body: Option<serde_json::Value>) -> Result<()> {
    let body = body.unwrap_or_else(|| serde_json::json!({}));
    let affect_update = body.get("affect_update").cloned().map(serde_json::from_value).transpose()?;
    let claim_confidence = body.get("claim_confidence").and_then(|v| v.as_f64());
    let append_history_note = body.get("append_history_note").and_then(|v| v.as_str()).map(String::from);
    let req = memsub_types::api::RecallMemoryRequest {
        tenant_id: tenant_id.as_str().into(),
        memory_id: memory_id.as_str().into(),
        affect_update,
        claim_confidence,
        append_history_note,
    };
    let resp = handlers::handle_recall_memory(engine, req).map_err(fail)?;
    println!("updated {} at {}", resp.id, resp.updated_at);
    Ok(())
}

pub(crate) fn run_v2_dispute(engine: &Engine, tenant_id: String, memory_id: String, action: DisputeAction) -> Result<()> {
    let resp = handlers::handle_dispute_memory(engine, DisputeMemoryRequest { tenant_id: tenant_id.as_str().into(), memory_id: memory_id.as_str().into(), action }).map_err(fail)?;
    println!("dispute_state: {:?} (at {})", resp.dispute_state, resp.updated_at);
    Ok(())
}

pub(crate) fn run_v2_explain(engine: &Engine, access_log_id: String) -> Result<()> {
    let resp = handlers::handle_explain(engine, ExplainRequest { access_log_id: access_log_id.as_str().into() }).map_err(fail)?;
    println!("{}", serde_json::to_string_pretty(&resp.access_log)?);
    println!("memories referenced: {}", resp.memories.len());
    println!("constraints referenced: {}", resp.constraints.len());
    println!("denied: {}", resp.denied_ids.len());
    Ok(())
}

pub(crate) fn run_v2_replay(
    engine: &Engine,
    access_log_id: String,
    query_text_override: Option<String>,
    include_events_override: Option<bool>,
) -> Result<()> {
    let resp = handlers::handle_replay(engine, ReplayRequest { access_log_id: access_log_id.as_str().into(), query_text_override, include_events_override }).map_err(fail)?;
    println!("recomputed memory_ids: {:?}", resp.recomputed.memory_ids.iter().map(|id| id.as_str()).collect::<Vec<_>>());
    println!("recomputed denied: {}", resp.recomputed.denied_ids.len());
    Ok(())
}
