//! Thin wire-shaped handlers (§6.1): each takes the matching request DTO,
//! drives the engine, and converts any failure into the `ApiError` envelope
//! at the boundary. No business logic lives here.

use memsub_types::api::{
    ContinueReadRequest, CreateMemoryV1Request, CreateMemoryV1Response, CreateMemoryV2Request,
    CreateMemoryV2Response, DisputeMemoryRequest, DisputeMemoryResponse, ExplainRequest,
    ExplainResponse, QueryMemoriesRequest, QueryMemoriesResponse, ReadMemoryV1Request,
    ReadMemoryV1Response, ReconstructRequest, ReconstructResponse, RecallMemoryRequest,
    RecallMemoryResponse, ReinforceMemoryRequest, ReinforceMemoryResponse, ReplayRequest,
    ReplayResponse, RevokeMemoryRequest, RevokeMemoryResponse, RevokeReadRequest,
    RevokeReadResponse, SealMemoryRequest,
};
use memsub_types::audit_event::Caller;
use memsub_types::{ApiError, MemoryState};

use crate::engine::Engine;

pub fn handle_create_memory_v1(engine: &Engine, req: CreateMemoryV1Request) -> Result<CreateMemoryV1Response, ApiError> {
    engine.create_memory_v1(req).map_err(ApiError::from)
}

pub fn handle_read_memory_v1(engine: &Engine, req: ReadMemoryV1Request) -> Result<ReadMemoryV1Response, ApiError> {
    engine.read_memory_v1(req).map_err(ApiError::from)
}

pub fn handle_continue_read(engine: &Engine, req: ContinueReadRequest) -> Result<ReadMemoryV1Response, ApiError> {
    engine.continue_read(req).map_err(ApiError::from)
}

pub fn handle_revoke_read(engine: &Engine, req: RevokeReadRequest) -> Result<RevokeReadResponse, ApiError> {
    engine.revoke_read(req).map_err(ApiError::from)
}

pub fn handle_create_memory_v2(engine: &Engine, req: CreateMemoryV2Request) -> Result<CreateMemoryV2Response, ApiError> {
    engine.create_memory_v2(req).map_err(ApiError::from)
}

pub fn handle_query_memories(engine: &Engine, caller: Caller, req: QueryMemoriesRequest) -> Result<QueryMemoriesResponse, ApiError> {
    let (result, access_log) = engine
        .retrieve_v2(caller, req.tenant_id, req.scope, req.purpose, req.query_text.as_deref(), req.limit)
        .map_err(ApiError::from)?;
    Ok(QueryMemoriesResponse {
        memory_ids: result.memory_ids,
        impacts: result.impacts,
        seeds: result.seeds,
        events: result.events,
        denied_ids: result.denied_ids,
        policy_trace: serde_json::json!({"matched_rules": result.matched_rules, "policy_version": result.policy_version}),
        access_log_id: access_log.log_id,
    })
}

pub fn handle_reconstruct(engine: &Engine, caller: Caller, req: ReconstructRequest) -> Result<ReconstructResponse, ApiError> {
    let (reconstructed, access_log) = engine
        .reconstruct_v2(caller, req.tenant_id, req.scope, req.purpose, req.query_text.as_deref(), req.include_events)
        .map_err(ApiError::from)?;
    Ok(ReconstructResponse {
        reconstructed_context: reconstructed.reconstructed_context,
        confidence: reconstructed.confidence,
        sources: reconstructed.sources,
        policy_trace: serde_json::json!({"matched_rules": access_log.decision.matched_rules, "policy_version": engine.policy().policy_version()}),
        access_log_id: access_log.log_id,
    })
}

pub fn handle_seal_memory(engine: &Engine, req: SealMemoryRequest) -> Result<MemoryState, ApiError> {
    engine.seal_memory(req).map_err(ApiError::from)
}

pub fn handle_revoke_memory(engine: &Engine, req: RevokeMemoryRequest) -> Result<RevokeMemoryResponse, ApiError> {
    engine.revoke_memory_v2(req).map_err(ApiError::from)
}

pub fn handle_reinforce_memory(engine: &Engine, req: ReinforceMemoryRequest) -> Result<ReinforceMemoryResponse, ApiError> {
    engine.reinforce_memory(req).map_err(ApiError::from)
}

pub fn handle_recall_memory(engine: &Engine, req: RecallMemoryRequest) -> Result<RecallMemoryResponse, ApiError> {
    engine.recall_memory(req).map_err(ApiError::from)
}

pub fn handle_dispute_memory(engine: &Engine, req: DisputeMemoryRequest) -> Result<DisputeMemoryResponse, ApiError> {
    engine.dispute_memory(req).map_err(ApiError::from)
}

pub fn handle_explain(engine: &Engine, req: ExplainRequest) -> Result<ExplainResponse, ApiError> {
    engine.explain(req).map_err(ApiError::from)
}

pub fn handle_replay(engine: &Engine, req: ReplayRequest) -> Result<ReplayResponse, ApiError> {
    engine.replay(req).map_err(ApiError::from)
}
