//! Policy-filtered retrieval: indexed fetch by `(tenant, scope)`, an optional
//! token match, per-row policy evaluation, and type-partitioned output.

use memsub_types::audit_event::{AccessDecision, AccessOp, AccessPurpose, AccessQuery, Caller};
use memsub_types::memory_v2::{DisputeState, MemoryObject, MemoryState, MemoryType, ScopeV2};
use memsub_types::{AccessLogV2, LogId, MemoryId, TenantId};
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::EngineError;

const OVER_FETCH_FACTOR: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub memory_ids: Vec<MemoryId>,
    pub impacts: Vec<serde_json::Value>,
    pub seeds: Vec<serde_json::Value>,
    pub events: Vec<MemoryId>,
    pub denied_ids: Vec<MemoryId>,
    pub matched_rules: Vec<String>,
    pub policy_version: String,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| t.chars().count() > 2)
        .collect()
}

fn matches_query_text(memory: &MemoryObject, query_text: &str) -> bool {
    let tokens = tokenize(query_text);
    if tokens.is_empty() {
        return true;
    }
    let haystack = memory.content.text.as_deref().unwrap_or("").to_lowercase();
    tokens.iter().any(|t| haystack.contains(t.as_str()))
}

fn passes_base_filter(memory: &MemoryObject, purpose: AccessPurpose) -> bool {
    let excludes_sealed_and_disputed = matches!(purpose, AccessPurpose::ChatResponse | AccessPurpose::TaskExecution);
    if excludes_sealed_and_disputed {
        if memory.state == MemoryState::Sealed {
            return false;
        }
        if matches!(memory.ownership.dispute_state, DisputeState::Disputed | DisputeState::Contested) {
            return false;
        }
    }
    true
}

impl Engine {
    /// Runs the retrieval pipeline (§4.3) and persists the resulting access
    /// log row. A store-layer error is swallowed into an empty result per the
    /// best-effort failure contract; it is not itself returned to the caller.
    pub fn retrieve_v2(
        &self,
        caller: Caller,
        tenant_id: TenantId,
        scope: ScopeV2,
        purpose: AccessPurpose,
        query_text: Option<&str>,
        limit: usize,
    ) -> Result<(RetrievalResult, AccessLogV2), EngineError> {
        let now = self.clock.now();
        let result = match self.fetch_and_filter(&tenant_id, &scope, purpose, query_text, limit) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval store error, returning empty result");
                RetrievalResult::default()
            }
        };

        let access_log = AccessLogV2 {
            id: Uuid::new_v4(),
            log_id: LogId::new(),
            time: now,
            tenant_id: tenant_id.clone(),
            caller,
            scope,
            purpose,
            query: AccessQuery { text: query_text.map(String::from), op: AccessOp::Query },
            decision: AccessDecision {
                allowed: true,
                returned_ids: result.memory_ids.clone(),
                denied_ids: result.denied_ids.clone(),
                matched_rules: result.matched_rules.clone(),
                explanation: format!("{} returned, {} denied", result.memory_ids.len(), result.denied_ids.len()),
            },
        };
        self.store.insert_access_log(&access_log)?;

        Ok((result, access_log))
    }

    fn fetch_and_filter(
        &self,
        tenant_id: &TenantId,
        scope: &ScopeV2,
        purpose: AccessPurpose,
        query_text: Option<&str>,
        limit: usize,
    ) -> Result<RetrievalResult, EngineError> {
        let ids = self.store.memory_v2_ids_for_scope(tenant_id.as_str(), scope)?;
        let over_fetch = limit.saturating_mul(OVER_FETCH_FACTOR);

        let mut memory_ids = Vec::new();
        let mut impacts = Vec::new();
        let mut seeds = Vec::new();
        let mut events = Vec::new();
        let mut denied_ids = Vec::new();
        let mut matched_rules = Vec::new();

        for id in ids.into_iter().take(over_fetch) {
            if memory_ids.len() >= limit {
                break;
            }
            let Some(memory) = self.store.get_memory_v2(&id)? else { continue };
            if !passes_base_filter(&memory, purpose) {
                continue;
            }
            if let Some(q) = query_text {
                if !matches_query_text(&memory, q) {
                    continue;
                }
            }

            let decision = self.policy.evaluate_query(&memory, purpose);
            matched_rules.extend(decision.trace.matched_rules.iter().cloned());
            if !decision.allowed {
                denied_ids.push(memory.id.clone());
                continue;
            }
            if !self.policy.evaluate_tool_execution(&memory, purpose) {
                denied_ids.push(memory.id.clone());
                continue;
            }

            match memory.r#type {
                MemoryType::Impact => {
                    let constraints = memory
                        .payloads
                        .impact_payload
                        .as_ref()
                        .map(|p| serde_json::to_value(&p.constraints).unwrap_or(serde_json::Value::Null))
                        .unwrap_or(serde_json::Value::Array(Vec::new()));
                    impacts.push(serde_json::json!({"id": memory.id.as_str(), "constraints": constraints}));
                }
                MemoryType::Seed => {
                    let cues = memory.payloads.seed_payload.as_ref().map(|p| p.cues.clone()).unwrap_or_default();
                    seeds.push(serde_json::json!({"id": memory.id.as_str(), "cues": cues}));
                }
                MemoryType::Event => {
                    events.push(memory.id.clone());
                }
            }
            memory_ids.push(memory.id);
        }

        let policy_version = self.policy.policy_version().to_string();
        Ok(RetrievalResult { memory_ids, impacts, seeds, events, denied_ids, matched_rules, policy_version })
    }
}
