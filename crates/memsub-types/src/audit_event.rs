//! Append-only audit records: v1's flat `AuditEvent` and v2's structured
//! `AccessLog`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::{LogId, MemoryId, TenantId};
use crate::memory_v1::Scope;
use crate::memory_v2::ScopeV2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    MemoryWrite,
    MemoryRead,
    MemoryRevoke,
    Continue,
    PolicyDenied,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub user_id: String,
    pub app_id: Uuid,
    pub scope: Scope,
    pub domain: Option<String>,
    pub purpose: String,
    pub purpose_class: String,
    pub memory_ids: Vec<Uuid>,
    pub revocation_grant_id: Option<Uuid>,
    pub reason_code: Option<String>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPurpose {
    ChatResponse,
    TaskExecution,
    SafetyFiltering,
    ReflectionRequestedByUser,
    SupportAgentReview,
    ComplianceAudit,
    DebuggingReplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOp {
    Ingest,
    Query,
    Reconstruct,
    ToolGate,
    Reinforce,
    Recall,
    Revoke,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub client_id: String,
    pub user_id: String,
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessQuery {
    pub text: Option<String>,
    pub op: AccessOp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub returned_ids: Vec<MemoryId>,
    pub denied_ids: Vec<MemoryId>,
    pub matched_rules: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLogV2 {
    pub id: Uuid,
    pub log_id: LogId,
    pub time: DateTime<Utc>,
    pub tenant_id: TenantId,
    pub caller: Caller,
    pub scope: ScopeV2,
    pub purpose: AccessPurpose,
    pub query: AccessQuery,
    pub decision: AccessDecision,
}
