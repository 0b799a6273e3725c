//! v2 memory lifecycle operations (§4.7): create, seal, revoke (with the
//! cascade rule resolving the parent/child propagation question), reinforce,
//! recall/reconsolidate, dispute/attest, explain, replay.

use memsub_types::api::{
    CreateMemoryV2Request, CreateMemoryV2Response, DisputeAction, DisputeMemoryRequest,
    DisputeMemoryResponse, ExplainRequest, ExplainResponse, QueryMemoriesResponse,
    ReinforceMemoryRequest, ReinforceMemoryResponse, RecallMemoryRequest, RecallMemoryResponse,
    ReplayRequest, ReplayResponse, RevokeMemoryRequest, RevokeMemoryResponse, SealMemoryRequest,
};
use memsub_types::audit_event::{AccessDecision, AccessOp, AccessPurpose, AccessQuery, Caller};
use memsub_types::link::LinkRelationship;
use memsub_types::memory_v2::{DisputeState, MemoryObject, MemoryState, MemoryType, ReconsolidationPolicy};
use memsub_types::{AccessLogV2, LogId, MemoryId};
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::impact_extractor::extract_impact;
use crate::validation::validate_content_body;

const REINFORCE_DEFAULT_DELTA: f64 = 0.1;
const STRENGTH_CAP: f64 = 1.0;
const REPLAY_DEFAULT_LIMIT: usize = 100;

fn system_caller() -> Caller {
    Caller { client_id: "memsub-engine".to_string(), user_id: "system".to_string(), ip: None }
}

impl Engine {
    fn require_memory(&self, id: &MemoryId) -> Result<MemoryObject, EngineError> {
        self.store.get_memory_v2(id.as_str())?.ok_or(EngineError::NotFound)
    }

    fn require_tenant_owned(&self, memory: &MemoryObject, tenant_id: &memsub_types::TenantId) -> Result<(), EngineError> {
        if &memory.tenant_id != tenant_id {
            return Err(EngineError::NotFound);
        }
        Ok(())
    }

    pub fn create_memory_v2(&self, req: CreateMemoryV2Request) -> Result<CreateMemoryV2Response, EngineError> {
        validate_content_body(&req.content)?;
        let now = self.clock.now();

        let mut draft = MemoryObject {
            id: MemoryId::new(),
            tenant_id: req.tenant_id,
            scope: req.scope,
            r#type: req.r#type,
            truth_mode: req.truth_mode,
            state: MemoryState::Active,
            sensitivity: req.sensitivity,
            ownership: req.ownership,
            temporal: req.temporal,
            content: req.content,
            affect: req.affect,
            strength: req.strength,
            provenance: req.provenance,
            reconsolidation_policy: req.reconsolidation_policy,
            payloads: req.payloads,
            created_at: now,
            updated_at: now,
        };

        let decision = self.policy.evaluate_ingest(&draft);
        draft.state = decision.state;
        draft.provenance.policy_version = self.policy.policy_version().to_string();

        let derivation = if decision.derive_impacts && draft.r#type == MemoryType::Event && draft.state != MemoryState::Sealed {
            extract_impact(&draft, self.policy.policy_version(), now)
        } else {
            None
        };

        let access_log = AccessLogV2 {
            id: Uuid::new_v4(),
            log_id: LogId::new(),
            time: now,
            tenant_id: draft.tenant_id.clone(),
            caller: system_caller(),
            scope: draft.scope.clone(),
            purpose: AccessPurpose::ChatResponse,
            query: AccessQuery { text: None, op: AccessOp::Ingest },
            decision: AccessDecision {
                allowed: decision.allowed,
                returned_ids: vec![draft.id.clone()],
                denied_ids: Vec::new(),
                matched_rules: decision.trace.matched_rules.clone(),
                explanation: decision.trace.final_decision.clone(),
            },
        };

        match &derivation {
            Some((impact, link)) => self.store.ingest_v2(&draft, Some(impact), Some(link), &access_log)?,
            None => self.store.ingest_v2(&draft, None, None, &access_log)?,
        }

        Ok(CreateMemoryV2Response {
            id: draft.id,
            tenant_id: draft.tenant_id,
            state: draft.state,
            created_at: draft.created_at,
            policy_trace: serde_json::to_value(&decision.trace).unwrap_or(serde_json::Value::Null),
        })
    }

    pub fn seal_memory(&self, req: SealMemoryRequest) -> Result<MemoryState, EngineError> {
        let mut memory = self.require_memory(&req.memory_id)?;
        self.require_tenant_owned(&memory, &req.tenant_id)?;
        memory.state = MemoryState::Sealed;
        memory.updated_at = self.clock.now();
        self.store.update_memory_v2(&memory)?;
        Ok(memory.state)
    }

    /// Revoking an `event` cascades to every `derived_impact`/`derived_seed`
    /// child; revoking an `impact` or `seed` directly does not cascade.
    pub fn revoke_memory_v2(&self, req: RevokeMemoryRequest) -> Result<RevokeMemoryResponse, EngineError> {
        let mut memory = self.require_memory(&req.memory_id)?;
        self.require_tenant_owned(&memory, &req.tenant_id)?;
        let now = self.clock.now();
        memory.state = MemoryState::Revoked;
        memory.updated_at = now;
        self.store.update_memory_v2(&memory)?;

        let mut propagated_to = Vec::new();
        if memory.r#type == MemoryType::Event {
            for link in self.store.links_from_parent(memory.id.as_str())? {
                if !matches!(link.relationship, LinkRelationship::DerivedImpact | LinkRelationship::DerivedSeed) {
                    continue;
                }
                if let Some(mut child) = self.store.get_memory_v2(link.child_id.as_str())? {
                    if child.state != MemoryState::Revoked {
                        child.state = MemoryState::Revoked;
                        child.updated_at = now;
                        self.store.update_memory_v2(&child)?;
                    }
                    propagated_to.push(child.id);
                }
            }
        }

        Ok(RevokeMemoryResponse { id: memory.id, state: memory.state, revoked_at: now, propagated_to })
    }

    pub fn reinforce_memory(&self, req: ReinforceMemoryRequest) -> Result<ReinforceMemoryResponse, EngineError> {
        let mut memory = self.require_memory(&req.memory_id)?;
        self.require_tenant_owned(&memory, &req.tenant_id)?;
        let now = self.clock.now();

        let spiral_active = self.store.active_spiral_artifact(memory.tenant_id.as_str(), &memory.scope, now)?.is_some();
        let spiral = memsub_policy::SpiralPolicy::default();
        if spiral.blocks_reinforcement(spiral_active) {
            return Err(EngineError::PolicyDenied("reinforcement_blocked_by_active_spiral".to_string()));
        }

        let delta = req.delta.unwrap_or(REINFORCE_DEFAULT_DELTA);
        memory.strength.current = (memory.strength.current + delta).min(STRENGTH_CAP);
        memory.strength.last_reinforced_at = Some(now);
        memory.updated_at = now;
        self.store.update_memory_v2(&memory)?;

        Ok(ReinforceMemoryResponse { id: memory.id, strength_current: memory.strength.current, last_reinforced_at: now })
    }

    pub fn recall_memory(&self, req: RecallMemoryRequest) -> Result<RecallMemoryResponse, EngineError> {
        let mut memory = self.require_memory(&req.memory_id)?;
        self.require_tenant_owned(&memory, &req.tenant_id)?;
        let now = self.clock.now();

        match memory.reconsolidation_policy {
            ReconsolidationPolicy::NeverEditSource => {
                if req.affect_update.is_some() || req.claim_confidence.is_some() || req.append_history_note.is_some() {
                    return Err(EngineError::PolicyDenied("reconsolidation_forbidden".to_string()));
                }
            }
            ReconsolidationPolicy::AppendOnly => {
                if req.claim_confidence.is_some() {
                    return Err(EngineError::PolicyDenied("reconsolidation_forbidden".to_string()));
                }
                if let Some(affect) = &req.affect_update {
                    memory.affect.history.push(memsub_types::memory_v2::AffectHistoryEntry { recorded_at: now, valence: affect.valence, arousal: affect.arousal });
                }
                if req.append_history_note.is_some() {
                    memory.affect.history.push(memsub_types::memory_v2::AffectHistoryEntry { recorded_at: now, valence: memory.affect.valence, arousal: memory.affect.arousal });
                }
            }
            ReconsolidationPolicy::AllowRelabelAffectOnly => {
                if req.claim_confidence.is_some() || req.append_history_note.is_some() {
                    return Err(EngineError::PolicyDenied("reconsolidation_forbidden".to_string()));
                }
                if let Some(affect) = req.affect_update {
                    memory.affect = affect;
                }
            }
            ReconsolidationPolicy::AllowUpdateClaimConfidence => {
                if req.affect_update.is_some() || req.append_history_note.is_some() {
                    return Err(EngineError::PolicyDenied("reconsolidation_forbidden".to_string()));
                }
                if let Some(confidence) = req.claim_confidence {
                    memory.temporal.confidence = confidence;
                }
            }
        }

        memory.updated_at = now;
        self.store.update_memory_v2(&memory)?;
        Ok(RecallMemoryResponse { id: memory.id, updated_at: now })
    }

    pub fn dispute_memory(&self, req: DisputeMemoryRequest) -> Result<DisputeMemoryResponse, EngineError> {
        let mut memory = self.require_memory(&req.memory_id)?;
        self.require_tenant_owned(&memory, &req.tenant_id)?;
        let now = self.clock.now();

        let next = match (req.action, memory.ownership.dispute_state) {
            (DisputeAction::Dispute, DisputeState::Undisputed) => DisputeState::Unverified,
            (DisputeAction::Dispute, DisputeState::Unverified) => DisputeState::Disputed,
            (DisputeAction::Dispute, DisputeState::Disputed) => DisputeState::Contested,
            (DisputeAction::Dispute, DisputeState::Contested) => DisputeState::Contested,
            (DisputeAction::Attest, DisputeState::Contested) => DisputeState::Disputed,
            (DisputeAction::Attest, DisputeState::Disputed) => DisputeState::Unverified,
            (DisputeAction::Attest, DisputeState::Unverified) => DisputeState::Undisputed,
            (DisputeAction::Attest, DisputeState::Undisputed) => DisputeState::Undisputed,
        };

        memory.ownership.dispute_state = next;
        memory.updated_at = now;
        self.store.update_memory_v2(&memory)?;

        Ok(DisputeMemoryResponse { id: memory.id, dispute_state: next, updated_at: now })
    }

    pub fn explain(&self, req: ExplainRequest) -> Result<ExplainResponse, EngineError> {
        let log = self.store.get_access_log(req.access_log_id.as_str())?.ok_or(EngineError::NotFound)?;

        let mut memories = Vec::new();
        let mut constraints = Vec::new();
        for id in &log.decision.returned_ids {
            if let Some(memory) = self.store.get_memory_v2(id.as_str())? {
                if memory.r#type == MemoryType::Impact {
                    if let Some(payload) = &memory.payloads.impact_payload {
                        constraints.push(serde_json::to_value(&payload.constraints).unwrap_or(serde_json::Value::Null));
                    }
                }
                memories.push(serde_json::to_value(&memory).unwrap_or(serde_json::Value::Null));
            }
        }

        Ok(ExplainResponse {
            access_log: serde_json::to_value(&log).unwrap_or(serde_json::Value::Null),
            memories,
            constraints,
            denied_ids: log.decision.denied_ids.clone(),
        })
    }

    pub fn replay(&self, req: ReplayRequest) -> Result<ReplayResponse, EngineError> {
        let log = self.store.get_access_log(req.access_log_id.as_str())?.ok_or(EngineError::NotFound)?;

        let query_text = req.query_text_override.or_else(|| log.query.text.clone());
        let (retrieved, new_log) = self.retrieve_v2(log.caller.clone(), log.tenant_id.clone(), log.scope.clone(), log.purpose, query_text.as_deref(), REPLAY_DEFAULT_LIMIT)?;

        let recomputed = QueryMemoriesResponse {
            memory_ids: retrieved.memory_ids,
            impacts: retrieved.impacts,
            seeds: retrieved.seeds,
            events: retrieved.events,
            denied_ids: retrieved.denied_ids,
            policy_trace: serde_json::json!({"matched_rules": retrieved.matched_rules, "policy_version": retrieved.policy_version}),
            access_log_id: new_log.log_id,
        };

        Ok(ReplayResponse { access_log: serde_json::to_value(&log).unwrap_or(serde_json::Value::Null), recomputed })
    }
}
