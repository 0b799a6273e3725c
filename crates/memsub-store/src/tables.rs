//! `redb` table definitions standing in for the nine named tables and their
//! indexed columns. JSON-document values, hand-maintained secondary index
//! tables in place of SQL secondary indexes.

use redb::TableDefinition;

pub const APPS: TableDefinition<&str, &[u8]> = TableDefinition::new("apps");
pub const APPS_BY_KEY_HASH: TableDefinition<&str, &str> = TableDefinition::new("apps_by_key_hash");

pub const MEMORIES_V1: TableDefinition<&str, &[u8]> = TableDefinition::new("memories_v1");
/// Key: `"{user_id}|{scope}|{domain}"`. Value: newline-joined memory id list.
pub const MEMORIES_V1_BY_USER_SCOPE: TableDefinition<&str, &str> =
    TableDefinition::new("memories_v1_by_user_scope");

pub const READ_GRANTS: TableDefinition<&str, &[u8]> = TableDefinition::new("read_grants");
pub const READ_GRANTS_BY_TOKEN_HASH: TableDefinition<&str, &str> =
    TableDefinition::new("read_grants_by_token_hash");

/// Key: `"{timestamp_nanos:020}|{id}"` so iteration comes back time-ordered.
pub const AUDIT_EVENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("audit_events");
/// Key: user_id. Value: newline-joined audit row keys (see `AUDIT_EVENTS`).
pub const AUDIT_EVENTS_BY_USER: TableDefinition<&str, &str> =
    TableDefinition::new("audit_events_by_user");

pub const MEMORIES_V2: TableDefinition<&str, &[u8]> = TableDefinition::new("memories_v2");
/// Key: `"{tenant_id}|{scope_type}|{scope_id}"`.
/// Value: newline-joined `"{occurred_at_nanos}:{id}"` entries.
pub const MEMORIES_V2_BY_SCOPE: TableDefinition<&str, &str> =
    TableDefinition::new("memories_v2_by_scope");
/// Key: `"{state}|{type}"`. Value: newline-joined memory ids.
pub const MEMORIES_V2_BY_STATE_TYPE: TableDefinition<&str, &str> =
    TableDefinition::new("memories_v2_by_state_type");

pub const MEMORY_LINKS_V2: TableDefinition<&str, &[u8]> = TableDefinition::new("memory_links_v2");
/// Key: parent memory id. Value: newline-joined link ids.
pub const MEMORY_LINKS_BY_PARENT: TableDefinition<&str, &str> =
    TableDefinition::new("memory_links_by_parent");

pub const ACCESS_LOGS_V2: TableDefinition<&str, &[u8]> = TableDefinition::new("access_logs_v2");

pub const SPIRAL_ARTIFACTS_V2: TableDefinition<&str, &[u8]> =
    TableDefinition::new("spiral_artifacts_v2");
/// Key: `"{tenant_id}|{scope_type}|{scope_id}"`. Value: newline-joined artifact ids.
pub const SPIRAL_ARTIFACTS_BY_SCOPE: TableDefinition<&str, &str> =
    TableDefinition::new("spiral_artifacts_by_scope");
