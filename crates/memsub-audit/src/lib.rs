//! Append-only structured audit writer: one row per ingest, read, continue,
//! revoke, and policy denial. Every write also emits a `tracing` event —
//! the store row is the record of truth, the trace line is for live
//! observability.

use chrono::{DateTime, Utc};
use memsub_store::{Store, StoreError};
use memsub_types::audit_event::{AuditEvent, AuditEventType};
use memsub_types::memory_v1::Scope;
use memsub_types::AccessLogV2;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn base_event(
    event_type: AuditEventType,
    user_id: &str,
    app_id: Uuid,
    scope: Scope,
    domain: Option<String>,
    purpose: &str,
    purpose_class: &str,
    memory_ids: Vec<Uuid>,
    revocation_grant_id: Option<Uuid>,
    reason_code: Option<String>,
    now: DateTime<Utc>,
) -> AuditEvent {
    AuditEvent {
        id: Uuid::new_v4(),
        timestamp: now,
        event_type,
        user_id: user_id.to_string(),
        app_id,
        scope,
        domain,
        purpose: purpose.to_string(),
        purpose_class: purpose_class.to_string(),
        memory_ids,
        revocation_grant_id,
        reason_code,
        meta: serde_json::Value::Null,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn log_write(store: &Store, user_id: &str, app_id: Uuid, scope: Scope, domain: Option<String>, memory_id: Uuid, now: DateTime<Utc>) -> Result<(), AuditError> {
    let event = base_event(AuditEventType::MemoryWrite, user_id, app_id, scope, domain, "", "", vec![memory_id], None, None, now);
    store.insert_audit_event(&event)?;
    tracing::info!(user_id, %app_id, memory_id = %memory_id, "memory write audited");
    Ok(())
}

/// Builds the audit row a v1 create would log, without persisting it. Lets a
/// caller commit it in the same store transaction as the memory it covers
/// (`Store::insert_memory_v1_with_audit`) instead of in a second transaction.
pub fn write_event(user_id: &str, app_id: Uuid, scope: Scope, domain: Option<String>, memory_id: Uuid, now: DateTime<Utc>) -> AuditEvent {
    base_event(AuditEventType::MemoryWrite, user_id, app_id, scope, domain, "", "", vec![memory_id], None, None, now)
}

#[allow(clippy::too_many_arguments)]
pub fn log_read(
    store: &Store,
    user_id: &str,
    app_id: Uuid,
    scope: Scope,
    domain: Option<String>,
    purpose: &str,
    purpose_class: &str,
    reason_code: Option<&str>,
    grant_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), AuditError> {
    let event = base_event(
        AuditEventType::MemoryRead,
        user_id,
        app_id,
        scope,
        domain,
        purpose,
        purpose_class,
        vec![],
        Some(grant_id),
        reason_code.map(String::from),
        now,
    );
    store.insert_audit_event(&event)?;
    tracing::info!(user_id, %app_id, purpose_class, %grant_id, "memory read audited");
    Ok(())
}

pub fn log_revoke(store: &Store, user_id: &str, app_id: Uuid, scope: Scope, grant_id: Uuid, now: DateTime<Utc>) -> Result<(), AuditError> {
    let event = base_event(AuditEventType::MemoryRevoke, user_id, app_id, scope, None, "", "", vec![], Some(grant_id), Some("user_requested".to_string()), now);
    store.insert_audit_event(&event)?;
    tracing::info!(user_id, %app_id, %grant_id, "grant revocation audited");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn log_policy_denied(
    store: &Store,
    user_id: &str,
    app_id: Uuid,
    scope: Scope,
    domain: Option<String>,
    purpose: &str,
    purpose_class: &str,
    now: DateTime<Utc>,
) -> Result<(), AuditError> {
    let event = base_event(AuditEventType::PolicyDenied, user_id, app_id, scope, domain, purpose, purpose_class, vec![], None, Some("POLICY_DENIED".to_string()), now);
    store.insert_audit_event(&event)?;
    tracing::warn!(user_id, %app_id, purpose_class, "read denied by policy");
    Ok(())
}

/// Persists a v2 access log row. `memsub-store::ingest_v2` already writes the
/// row as part of an ingest transaction; this path is for query/reconstruct/
/// revoke/reinforce/recall calls that write the access log on its own.
pub fn log_access_v2(store: &Store, log: &AccessLogV2) -> Result<(), AuditError> {
    store.insert_access_log(log)?;
    tracing::info!(log_id = %log.log_id, tenant_id = %log.tenant_id, allowed = log.decision.allowed, "v2 access audited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsub_types::memory_v1::Scope;

    #[test]
    fn log_write_persists_a_retrievable_audit_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("s.redb")).unwrap();
        let now = Utc::now();
        let app_id = Uuid::new_v4();
        log_write(&store, "u1", app_id, Scope::Preferences, None, Uuid::new_v4(), now).unwrap();
        let rows = store.audit_events_for_user("u1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_type, AuditEventType::MemoryWrite);
    }
}
