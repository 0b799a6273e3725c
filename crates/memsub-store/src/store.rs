use std::path::{Path, PathBuf};

use memsub_types::{
    AccessLogV2, App, DerivedObjectLink, MemoryObject, MemoryV1, ReadGrant, ScopeV2,
    ThoughtPatternArtifact,
};
use redb::{Database, ReadableTable};
use uuid::Uuid;

use crate::error::StoreError;
use crate::tables::*;

fn scope_key(tenant_id: &str, scope: &ScopeV2) -> String {
    format!("{tenant_id}|{:?}|{}", scope.scope_type, scope.scope_id)
}

fn v1_scope_key(user_id: &str, scope: &str, domain: Option<&str>) -> String {
    format!("{user_id}|{scope}|{}", domain.unwrap_or(""))
}

fn append_to_list(existing: Option<&str>, item: &str) -> String {
    match existing {
        None | Some("") => item.to_string(),
        Some(s) => format!("{s}\n{item}"),
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.lines().filter(|l| !l.is_empty()).map(String::from).collect()
}

/// Transactional key-value store over the substrate's persisted tables.
/// The JSON documents hold the canonical object; the secondary index tables
/// are denormalized projections kept consistent within each write transaction.
pub struct Store {
    db: Database,
    path: PathBuf,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Redb(e.to_string()))?;
        }
        let db = Database::create(&path)?;
        {
            let tx = db.begin_write()?;
            tx.open_table(APPS)?;
            tx.open_table(APPS_BY_KEY_HASH)?;
            tx.open_table(MEMORIES_V1)?;
            tx.open_table(MEMORIES_V1_BY_USER_SCOPE)?;
            tx.open_table(READ_GRANTS)?;
            tx.open_table(READ_GRANTS_BY_TOKEN_HASH)?;
            tx.open_table(AUDIT_EVENTS)?;
            tx.open_table(AUDIT_EVENTS_BY_USER)?;
            tx.open_table(MEMORIES_V2)?;
            tx.open_table(MEMORIES_V2_BY_SCOPE)?;
            tx.open_table(MEMORIES_V2_BY_STATE_TYPE)?;
            tx.open_table(MEMORY_LINKS_V2)?;
            tx.open_table(MEMORY_LINKS_BY_PARENT)?;
            tx.open_table(ACCESS_LOGS_V2)?;
            tx.open_table(SPIRAL_ARTIFACTS_V2)?;
            tx.open_table(SPIRAL_ARTIFACTS_BY_SCOPE)?;
            tx.commit()?;
        }
        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ---- apps ----

    pub fn insert_app(&self, app: &App) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(app)?;
        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(APPS)?;
            tbl.insert(app.id.to_string().as_str(), bytes.as_slice())?;
            let mut by_key = tx.open_table(APPS_BY_KEY_HASH)?;
            by_key.insert(app.api_key_hash.as_str(), app.id.to_string().as_str())?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_app(&self, id: Uuid) -> Result<Option<App>, StoreError> {
        let tx = self.db.begin_read()?;
        let tbl = tx.open_table(APPS)?;
        match tbl.get(id.to_string().as_str())? {
            None => Ok(None),
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
        }
    }

    // ---- memories v1 ----

    pub fn insert_memory_v1(&self, memory: &MemoryV1) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(memory)?;
        let id_str = memory.id.to_string();
        let key = v1_scope_key(&memory.user_id, memory.scope.slug(), memory.domain.as_deref());
        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(MEMORIES_V1)?;
            tbl.insert(id_str.as_str(), bytes.as_slice())?;
            let mut idx = tx.open_table(MEMORIES_V1_BY_USER_SCOPE)?;
            let existing = idx.get(key.as_str())?.map(|v| v.value().to_string());
            let updated = append_to_list(existing.as_deref(), &id_str);
            idx.insert(key.as_str(), updated.as_str())?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Atomically persists a v1 memory and its write-audit row in a single
    /// transaction, so a failure partway through never leaves a committed
    /// memory with no audit row (or vice versa) — mirrors `ingest_v2`'s
    /// single-commit discipline for the v2 path.
    pub fn insert_memory_v1_with_audit(&self, memory: &MemoryV1, audit_event: &memsub_types::AuditEvent) -> Result<(), StoreError> {
        let mem_bytes = serde_json::to_vec(memory)?;
        let id_str = memory.id.to_string();
        let key = v1_scope_key(&memory.user_id, memory.scope.slug(), memory.domain.as_deref());
        let audit_bytes = serde_json::to_vec(audit_event)?;
        let row_key = format!("{:020}|{}", audit_event.timestamp.timestamp_nanos_opt().unwrap_or(0), audit_event.id);

        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(MEMORIES_V1)?;
            tbl.insert(id_str.as_str(), mem_bytes.as_slice())?;
            let mut idx = tx.open_table(MEMORIES_V1_BY_USER_SCOPE)?;
            let existing = idx.get(key.as_str())?.map(|v| v.value().to_string());
            let updated = append_to_list(existing.as_deref(), &id_str);
            idx.insert(key.as_str(), updated.as_str())?;

            let mut audit_tbl = tx.open_table(AUDIT_EVENTS)?;
            audit_tbl.insert(row_key.as_str(), audit_bytes.as_slice())?;
            let mut by_user = tx.open_table(AUDIT_EVENTS_BY_USER)?;
            let existing = by_user.get(audit_event.user_id.as_str())?.map(|v| v.value().to_string());
            let updated = append_to_list(existing.as_deref(), &row_key);
            by_user.insert(audit_event.user_id.as_str(), updated.as_str())?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Returns every v1 memory ever written for `(user_id, scope, domain)`,
    /// including expired rows — filtering `expires_at` is the caller's job
    /// (normalization/merge runs at read time per the store's documented
    /// contract).
    pub fn query_memories_v1(
        &self,
        user_id: &str,
        scope: &str,
        domain: Option<&str>,
    ) -> Result<Vec<MemoryV1>, StoreError> {
        let key = v1_scope_key(user_id, scope, domain);
        let tx = self.db.begin_read()?;
        let idx = tx.open_table(MEMORIES_V1_BY_USER_SCOPE)?;
        let ids = match idx.get(key.as_str())? {
            None => return Ok(Vec::new()),
            Some(v) => split_list(v.value()),
        };
        let tbl = tx.open_table(MEMORIES_V1)?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(v) = tbl.get(id.as_str())? {
                out.push(serde_json::from_slice(v.value())?);
            }
        }
        Ok(out)
    }

    // ---- read grants (v1) ----

    pub fn insert_grant(&self, grant: &ReadGrant) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(grant)?;
        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(READ_GRANTS)?;
            tbl.insert(grant.id.to_string().as_str(), bytes.as_slice())?;
            let mut by_hash = tx.open_table(READ_GRANTS_BY_TOKEN_HASH)?;
            by_hash.insert(grant.token_hash.as_str(), grant.id.to_string().as_str())?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_grant_by_token_hash(&self, token_hash: &str) -> Result<Option<ReadGrant>, StoreError> {
        let tx = self.db.begin_read()?;
        let by_hash = tx.open_table(READ_GRANTS_BY_TOKEN_HASH)?;
        let id = match by_hash.get(token_hash)? {
            None => return Ok(None),
            Some(v) => v.value().to_string(),
        };
        let tbl = tx.open_table(READ_GRANTS)?;
        match tbl.get(id.as_str())? {
            None => Ok(None),
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
        }
    }

    pub fn update_grant(&self, grant: &ReadGrant) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(grant)?;
        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(READ_GRANTS)?;
            tbl.insert(grant.id.to_string().as_str(), bytes.as_slice())?;
        }
        tx.commit()?;
        Ok(())
    }

    // ---- audit events (v1) ----

    pub fn insert_audit_event(&self, event: &memsub_types::AuditEvent) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(event)?;
        let row_key = format!("{:020}|{}", event.timestamp.timestamp_nanos_opt().unwrap_or(0), event.id);
        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(AUDIT_EVENTS)?;
            tbl.insert(row_key.as_str(), bytes.as_slice())?;
            let mut by_user = tx.open_table(AUDIT_EVENTS_BY_USER)?;
            let existing = by_user.get(event.user_id.as_str())?.map(|v| v.value().to_string());
            let updated = append_to_list(existing.as_deref(), &row_key);
            by_user.insert(event.user_id.as_str(), updated.as_str())?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn audit_events_for_user(&self, user_id: &str) -> Result<Vec<memsub_types::AuditEvent>, StoreError> {
        let tx = self.db.begin_read()?;
        let by_user = tx.open_table(AUDIT_EVENTS_BY_USER)?;
        let keys = match by_user.get(user_id)? {
            None => return Ok(Vec::new()),
            Some(v) => split_list(v.value()),
        };
        let tbl = tx.open_table(AUDIT_EVENTS)?;
        let mut out = Vec::with_capacity(keys.len());
        for k in keys {
            if let Some(v) = tbl.get(k.as_str())? {
                out.push(serde_json::from_slice(v.value())?);
            }
        }
        Ok(out)
    }

    // ---- memories v2 ----

    pub fn get_memory_v2(&self, id: &str) -> Result<Option<MemoryObject>, StoreError> {
        let tx = self.db.begin_read()?;
        let tbl = tx.open_table(MEMORIES_V2)?;
        match tbl.get(id)? {
            None => Ok(None),
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
        }
    }

    pub fn update_memory_v2(&self, memory: &MemoryObject) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(memory)?;
        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(MEMORIES_V2)?;
            tbl.insert(memory.id.as_str(), bytes.as_slice())?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Ordered, time-descending ids for a `(tenant, scope_type, scope_id)` key.
    pub fn memory_v2_ids_for_scope(&self, tenant_id: &str, scope: &ScopeV2) -> Result<Vec<String>, StoreError> {
        let key = scope_key(tenant_id, scope);
        let tx = self.db.begin_read()?;
        let idx = tx.open_table(MEMORIES_V2_BY_SCOPE)?;
        let raw = match idx.get(key.as_str())? {
            None => return Ok(Vec::new()),
            Some(v) => v.value().to_string(),
        };
        let mut entries: Vec<(i64, String)> = split_list(&raw)
            .into_iter()
            .filter_map(|line| {
                let (nanos, id) = line.split_once(':')?;
                Some((nanos.parse().ok()?, id.to_string()))
            })
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, id)| id).collect())
    }

    /// Atomically persists one ingested event/impact/seed, its optional
    /// derived impact, the link between them, and the resulting audit row —
    /// all four writes commit together or none do (§4.8's single-transaction
    /// ingest requirement).
    pub fn ingest_v2(
        &self,
        primary: &MemoryObject,
        derived: Option<&MemoryObject>,
        link: Option<&DerivedObjectLink>,
        access_log: &AccessLogV2,
    ) -> Result<(), StoreError> {
        let tx = self.db.begin_write()?;
        {
            let mut mem_tbl = tx.open_table(MEMORIES_V2)?;
            let mut scope_idx = tx.open_table(MEMORIES_V2_BY_SCOPE)?;
            let mut state_idx = tx.open_table(MEMORIES_V2_BY_STATE_TYPE)?;

            for obj in std::iter::once(primary).chain(derived) {
                let bytes = serde_json::to_vec(obj)?;
                mem_tbl.insert(obj.id.as_str(), bytes.as_slice())?;

                let skey = scope_key(obj.tenant_id.as_str(), &obj.scope);
                let existing = scope_idx.get(skey.as_str())?.map(|v| v.value().to_string());
                let nanos = obj.temporal.occurred_at_observed.timestamp_nanos_opt().unwrap_or(0);
                let entry = format!("{nanos}:{}", obj.id.as_str());
                let updated = append_to_list(existing.as_deref(), &entry);
                scope_idx.insert(skey.as_str(), updated.as_str())?;

                let tkey = format!("{:?}|{:?}", obj.state, obj.r#type);
                let existing = state_idx.get(tkey.as_str())?.map(|v| v.value().to_string());
                let updated = append_to_list(existing.as_deref(), obj.id.as_str());
                state_idx.insert(tkey.as_str(), updated.as_str())?;
            }

            if let Some(link) = link {
                let bytes = serde_json::to_vec(link)?;
                let mut link_tbl = tx.open_table(MEMORY_LINKS_V2)?;
                link_tbl.insert(link.id.as_str(), bytes.as_slice())?;
                let mut by_parent = tx.open_table(MEMORY_LINKS_BY_PARENT)?;
                let existing = by_parent.get(link.parent_id.as_str())?.map(|v| v.value().to_string());
                let updated = append_to_list(existing.as_deref(), link.id.as_str());
                by_parent.insert(link.parent_id.as_str(), updated.as_str())?;
            }

            let log_bytes = serde_json::to_vec(access_log)?;
            let mut log_tbl = tx.open_table(ACCESS_LOGS_V2)?;
            log_tbl.insert(access_log.log_id.as_str(), log_bytes.as_slice())?;
        }
        tx.commit()?;
        Ok(())
    }

    // ---- links ----

    pub fn links_from_parent(&self, parent_id: &str) -> Result<Vec<DerivedObjectLink>, StoreError> {
        let tx = self.db.begin_read()?;
        let by_parent = tx.open_table(MEMORY_LINKS_BY_PARENT)?;
        let ids = match by_parent.get(parent_id)? {
            None => return Ok(Vec::new()),
            Some(v) => split_list(v.value()),
        };
        let tbl = tx.open_table(MEMORY_LINKS_V2)?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(v) = tbl.get(id.as_str())? {
                out.push(serde_json::from_slice(v.value())?);
            }
        }
        Ok(out)
    }

    // ---- access logs ----

    pub fn insert_access_log(&self, log: &AccessLogV2) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(log)?;
        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(ACCESS_LOGS_V2)?;
            tbl.insert(log.log_id.as_str(), bytes.as_slice())?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_access_log(&self, log_id: &str) -> Result<Option<AccessLogV2>, StoreError> {
        let tx = self.db.begin_read()?;
        let tbl = tx.open_table(ACCESS_LOGS_V2)?;
        match tbl.get(log_id)? {
            None => Ok(None),
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
        }
    }

    // ---- spiral artifacts ----

    pub fn insert_spiral_artifact(&self, artifact: &ThoughtPatternArtifact) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(artifact)?;
        let key = scope_key(artifact.tenant_id.as_str(), &artifact.scope);
        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(SPIRAL_ARTIFACTS_V2)?;
            tbl.insert(artifact.id.as_str(), bytes.as_slice())?;
            let mut by_scope = tx.open_table(SPIRAL_ARTIFACTS_BY_SCOPE)?;
            let existing = by_scope.get(key.as_str())?.map(|v| v.value().to_string());
            let updated = append_to_list(existing.as_deref(), artifact.id.as_str());
            by_scope.insert(key.as_str(), updated.as_str())?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Returns the first still-active spiral artifact for the scope, if any.
    /// Policy only needs to know whether one applies, not an ordered set.
    pub fn active_spiral_artifact(
        &self,
        tenant_id: &str,
        scope: &ScopeV2,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<ThoughtPatternArtifact>, StoreError> {
        let key = scope_key(tenant_id, scope);
        let tx = self.db.begin_read()?;
        let by_scope = tx.open_table(SPIRAL_ARTIFACTS_BY_SCOPE)?;
        let ids = match by_scope.get(key.as_str())? {
            None => return Ok(None),
            Some(v) => split_list(v.value()),
        }
        .into_iter();
        let tbl = tx.open_table(SPIRAL_ARTIFACTS_V2)?;
        for id in ids {
            if let Some(v) = tbl.get(id.as_str())? {
                let artifact: ThoughtPatternArtifact = serde_json::from_slice(v.value())?;
                if artifact.is_active(now) {
                    return Ok(Some(artifact));
                }
            }
        }
        Ok(None)
    }
}
