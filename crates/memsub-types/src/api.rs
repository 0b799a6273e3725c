//! Wire request/response shapes (§6.1). HTTP transport itself is out of
//! scope; these are plain structs an external transport layer would
//! (de)serialize and hand to `memsub-engine`'s handler functions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::{MemoryId, TenantId};
use crate::memory_v1::{MemorySource, Scope};
use crate::memory_v2::{
    Affect, ContentBody, MemoryState, MemoryType, Ownership, Provenance, ReconsolidationPolicy,
    ScopeV2, Sensitivity, Strength, Temporal, TruthMode, TypedPayloads,
};

// ---- v1 ----

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMemoryV1Request {
    pub user_id: String,
    pub scope: Scope,
    pub domain: Option<String>,
    pub source: MemorySource,
    pub ttl_days: u16,
    pub value_json: serde_json::Value,
    pub app_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateMemoryV1Response {
    pub id: Uuid,
    pub user_id: String,
    pub scope: Scope,
    pub domain: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadMemoryV1Request {
    pub user_id: String,
    pub scope: Scope,
    pub domain: Option<String>,
    pub purpose: String,
    pub max_age_days: Option<u16>,
    pub app_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadMemoryV1Response {
    pub summary_text: String,
    pub summary_struct: serde_json::Value,
    pub confidence: f64,
    pub revocation_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContinueReadRequest {
    pub revocation_token: String,
    pub max_age_days: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevokeReadRequest {
    pub revocation_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevokeReadResponse {
    pub revoked: bool,
    pub revoked_at: DateTime<Utc>,
}

// ---- v2 ----

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMemoryV2Request {
    pub tenant_id: TenantId,
    pub scope: ScopeV2,
    pub r#type: MemoryType,
    pub truth_mode: TruthMode,
    pub sensitivity: Sensitivity,
    pub ownership: Ownership,
    pub temporal: Temporal,
    pub content: ContentBody,
    pub affect: Affect,
    pub strength: Strength,
    pub provenance: Provenance,
    pub reconsolidation_policy: ReconsolidationPolicy,
    #[serde(default)]
    pub payloads: TypedPayloads,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateMemoryV2Response {
    pub id: MemoryId,
    pub tenant_id: TenantId,
    pub state: MemoryState,
    pub created_at: DateTime<Utc>,
    pub policy_trace: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryMemoriesRequest {
    pub tenant_id: TenantId,
    pub scope: ScopeV2,
    pub purpose: crate::audit_event::AccessPurpose,
    pub query_text: Option<String>,
    #[serde(default)]
    pub filters: serde_json::Value,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryMemoriesResponse {
    pub memory_ids: Vec<MemoryId>,
    pub impacts: Vec<serde_json::Value>,
    pub seeds: Vec<serde_json::Value>,
    pub events: Vec<MemoryId>,
    pub denied_ids: Vec<MemoryId>,
    pub policy_trace: serde_json::Value,
    pub access_log_id: crate::id::LogId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconstructRequest {
    pub tenant_id: TenantId,
    pub scope: ScopeV2,
    pub purpose: crate::audit_event::AccessPurpose,
    pub query_text: Option<String>,
    pub include_events: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconstructResponse {
    pub reconstructed_context: String,
    pub confidence: f64,
    pub sources: serde_json::Value,
    pub policy_trace: serde_json::Value,
    pub access_log_id: crate::id::LogId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SealMemoryRequest {
    pub tenant_id: TenantId,
    pub memory_id: MemoryId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevokeMemoryRequest {
    pub tenant_id: TenantId,
    pub memory_id: MemoryId,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevokeMemoryResponse {
    pub id: MemoryId,
    pub state: MemoryState,
    pub revoked_at: DateTime<Utc>,
    pub propagated_to: Vec<MemoryId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReinforceMemoryRequest {
    pub tenant_id: TenantId,
    pub memory_id: MemoryId,
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReinforceMemoryResponse {
    pub id: MemoryId,
    pub strength_current: f64,
    pub last_reinforced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecallMemoryRequest {
    pub tenant_id: TenantId,
    pub memory_id: MemoryId,
    pub affect_update: Option<Affect>,
    pub claim_confidence: Option<f64>,
    pub append_history_note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecallMemoryResponse {
    pub id: MemoryId,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeAction {
    Dispute,
    Attest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisputeMemoryRequest {
    pub tenant_id: TenantId,
    pub memory_id: MemoryId,
    pub action: DisputeAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisputeMemoryResponse {
    pub id: MemoryId,
    pub dispute_state: crate::memory_v2::DisputeState,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplainRequest {
    pub access_log_id: crate::id::LogId,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplainResponse {
    pub access_log: serde_json::Value,
    pub memories: Vec<serde_json::Value>,
    pub constraints: Vec<serde_json::Value>,
    pub denied_ids: Vec<MemoryId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayRequest {
    pub access_log_id: crate::id::LogId,
    pub query_text_override: Option<String>,
    pub include_events_override: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayResponse {
    pub access_log: serde_json::Value,
    pub recomputed: QueryMemoriesResponse,
}
