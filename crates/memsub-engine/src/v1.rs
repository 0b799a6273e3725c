//! The v1 legacy path: simple scope/value-shape memories, a deterministic
//! read-time merge, and a bearer-token read-grant protocol.

use chrono::Duration;
use memsub_types::api::{
    ContinueReadRequest, CreateMemoryV1Request, CreateMemoryV1Response, ReadMemoryV1Request,
    ReadMemoryV1Response, RevokeReadRequest, RevokeReadResponse,
};
use memsub_types::{MemoryV1, ReadGrant};
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::purpose_class::{is_allowed, normalize_purpose};
use crate::rng::sha256_hex;
use crate::validation::{validate_free_text, validate_ttl_days, validate_value_shape};

impl Engine {
    pub fn create_memory_v1(&self, req: CreateMemoryV1Request) -> Result<CreateMemoryV1Response, EngineError> {
        validate_ttl_days(req.ttl_days)?;
        let shape = validate_value_shape(&req.value_json)?;
        let now = self.clock.now();
        let canonical = memsub_normalize::canonicalize(shape, &req.value_json);

        let memory = MemoryV1::new(req.user_id.clone(), req.scope, req.domain.clone(), canonical, shape, req.source, req.ttl_days, req.app_id, now);
        let audit_event = memsub_audit::write_event(&memory.user_id, memory.app_id, memory.scope, memory.domain.clone(), memory.id, now);
        self.store.insert_memory_v1_with_audit(&memory, &audit_event)?;
        tracing::info!(user_id = %memory.user_id, app_id = %memory.app_id, memory_id = %memory.id, "memory write audited");

        Ok(CreateMemoryV1Response {
            id: memory.id,
            user_id: memory.user_id,
            scope: memory.scope,
            domain: memory.domain,
            created_at: memory.created_at,
            expires_at: memory.expires_at,
        })
    }

    pub fn read_memory_v1(&self, req: ReadMemoryV1Request) -> Result<ReadMemoryV1Response, EngineError> {
        validate_free_text("purpose", &req.purpose)?;
        let purpose_class = normalize_purpose(&req.purpose);
        let now = self.clock.now();

        if !is_allowed(req.scope, &purpose_class) {
            memsub_audit::log_policy_denied(&self.store, &req.user_id, req.app_id, req.scope, req.domain.clone(), &req.purpose, &purpose_class, now)?;
            return Err(EngineError::PolicyDenied(purpose_class));
        }

        let memories = self.fetch_active_v1(&req.user_id, req.scope, req.domain.as_deref(), req.max_age_days, now)?;
        let merged = memsub_normalize::merge(req.scope, &memories);

        let (grant, token) = self.mint_grant(&req.user_id, req.app_id, req.scope, req.domain.clone(), req.purpose.clone(), purpose_class.clone(), req.max_age_days, now)?;
        memsub_audit::log_read(&self.store, &req.user_id, req.app_id, req.scope, req.domain, &req.purpose, &purpose_class, None, grant.id, now)?;

        Ok(ReadMemoryV1Response {
            summary_text: merged.summary_text,
            summary_struct: merged.summary_struct,
            confidence: merged.confidence,
            revocation_token: token,
            expires_at: grant.expires_at,
        })
    }

    pub fn continue_read(&self, req: ContinueReadRequest) -> Result<ReadMemoryV1Response, EngineError> {
        let now = self.clock.now();
        let token_hash = sha256_hex(&req.revocation_token);
        let grant = self.store.get_grant_by_token_hash(&token_hash)?.ok_or(EngineError::NotFound)?;
        if !grant.is_live(now) {
            return Err(EngineError::Revoked);
        }

        let max_age_days = req.max_age_days.or(grant.max_age_days);
        let memories = self.fetch_active_v1(&grant.user_id, grant.scope, grant.domain.as_deref(), max_age_days, now)?;
        let merged = memsub_normalize::merge(grant.scope, &memories);

        memsub_audit::log_read(&self.store, &grant.user_id, grant.app_id, grant.scope, grant.domain.clone(), &grant.purpose, &grant.purpose_class, Some("CONTINUE"), grant.id, now)?;

        Ok(ReadMemoryV1Response {
            summary_text: merged.summary_text,
            summary_struct: merged.summary_struct,
            confidence: merged.confidence,
            revocation_token: req.revocation_token,
            expires_at: grant.expires_at,
        })
    }

    pub fn revoke_read(&self, req: RevokeReadRequest) -> Result<RevokeReadResponse, EngineError> {
        let now = self.clock.now();
        let token_hash = sha256_hex(&req.revocation_token);
        let mut grant = self.store.get_grant_by_token_hash(&token_hash)?.ok_or(EngineError::NotFound)?;
        if grant.revoked_at.is_some() {
            return Err(EngineError::NotFound);
        }
        grant.revoked_at = Some(now);
        grant.revoke_reason = Some("user_requested".to_string());
        self.store.update_grant(&grant)?;
        memsub_audit::log_revoke(&self.store, &grant.user_id, grant.app_id, grant.scope, grant.id, now)?;
        Ok(RevokeReadResponse { revoked: true, revoked_at: now })
    }

    fn fetch_active_v1(
        &self,
        user_id: &str,
        scope: memsub_types::memory_v1::Scope,
        domain: Option<&str>,
        max_age_days: Option<u16>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<MemoryV1>, EngineError> {
        let all = self.store.query_memories_v1(user_id, scope.slug(), domain)?;
        let cutoff = max_age_days.map(|d| now - Duration::days(d as i64));
        Ok(all
            .into_iter()
            .filter(|m| m.is_active(now))
            .filter(|m| cutoff.map(|c| m.created_at >= c).unwrap_or(true))
            .collect())
    }

    #[allow(clippy::too_many_arguments)]
    fn mint_grant(
        &self,
        user_id: &str,
        app_id: Uuid,
        scope: memsub_types::memory_v1::Scope,
        domain: Option<String>,
        purpose: String,
        purpose_class: String,
        max_age_days: Option<u16>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(ReadGrant, String), EngineError> {
        let token = self.rng.random_token();
        let token_hash = sha256_hex(&token);
        let grant = ReadGrant {
            id: Uuid::new_v4(),
            token_hash,
            user_id: user_id.to_string(),
            app_id,
            scope,
            domain,
            purpose,
            purpose_class,
            max_age_days,
            created_at: now,
            expires_at: now + Duration::hours(24),
            revoked_at: None,
            revoke_reason: None,
        };
        self.store.insert_grant(&grant)?;
        Ok((grant, token))
    }
}
