//! Transactional key-value store adapter: CRUD and indexed queries over
//! memories (v1 and v2), grants, audit log, and derivation links.

pub mod error;
pub mod store;
mod tables;

pub use error::StoreError;
pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use memsub_types::memory_v1::{MemorySource, Scope};
    use memsub_types::shape::ValueShape;
    use memsub_types::MemoryV1;
    use uuid::Uuid;

    fn temp_store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("store.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn round_trips_a_v1_memory_through_the_scope_index() {
        let (store, _dir) = temp_store();
        let now = Utc::now();
        let mem = MemoryV1::new(
            "u1",
            Scope::Preferences,
            None,
            serde_json::json!({"likes": ["coffee"]}),
            ValueShape::LikesDislikes,
            MemorySource::ExplicitUserInput,
            30,
            Uuid::new_v4(),
            now,
        );
        store.insert_memory_v1(&mem).unwrap();
        let found = store.query_memories_v1("u1", "preferences", None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, mem.id);
    }

    #[test]
    fn missing_grant_lookup_returns_none() {
        let (store, _dir) = temp_store();
        assert!(store.get_grant_by_token_hash("does-not-exist").unwrap().is_none());
    }
}
