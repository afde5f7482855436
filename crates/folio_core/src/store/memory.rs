//! In-memory store implementation for testing.
//!
//! This provides a simple in-memory implementation of [`DocumentStore`]
//! for use in unit tests and for embedding without persistence.

use std::sync::RwLock;

use indexmap::IndexMap;
use serde_json::Value;

use super::{DocumentStore, StoreResult, VersionedDoc, WriteCondition};
use crate::error::FolioError;

/// In-memory document store.
///
/// Collections are maps of key to (value, version), kept in insertion
/// order so listings are deterministic. Thread-safe via `RwLock`; data
/// is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<IndexMap<String, IndexMap<String, (Value, u64)>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<VersionedDoc>> {
        let collections = self.collections.read().unwrap();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .map(|(value, version)| VersionedDoc {
                value: value.clone(),
                version: *version,
            }))
    }

    fn put(
        &self,
        collection: &str,
        key: &str,
        value: Value,
        condition: WriteCondition,
    ) -> StoreResult<u64> {
        let mut collections = self.collections.write().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();

        let current = docs.get(key).map(|(_, version)| *version);
        let holds = match condition {
            WriteCondition::Any => true,
            WriteCondition::MustNotExist => current.is_none(),
            WriteCondition::Version(expected) => current == Some(expected),
        };
        if !holds {
            return Err(FolioError::WriteConflict {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        }

        let version = current.unwrap_or(0) + 1;
        docs.insert(key.to_string(), (value, version));
        Ok(version)
    }

    fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().unwrap();
        if let Some(docs) = collections.get_mut(collection) {
            docs.shift_remove(key);
        }
        Ok(())
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<String>> {
        let collections = self.collections.read().unwrap();
        Ok(collections
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_and_get() {
        let store = MemoryStore::new();
        let version = store
            .put("books", "b1", json!({"title": "Dune"}), WriteCondition::Any)
            .unwrap();
        assert_eq!(version, 1);

        let doc = store.get("books", "b1").unwrap().unwrap();
        assert_eq!(doc.value, json!({"title": "Dune"}));
        assert_eq!(doc.version, 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let store = MemoryStore::new();
        assert!(store.get("books", "missing").unwrap().is_none());
    }

    #[test]
    fn test_versions_increase_per_key() {
        let store = MemoryStore::new();
        store.put("c", "k", json!(1), WriteCondition::Any).unwrap();
        let v2 = store.put("c", "k", json!(2), WriteCondition::Any).unwrap();
        assert_eq!(v2, 2);
        assert_eq!(store.get("c", "k").unwrap().unwrap().version, 2);
    }

    #[test]
    fn test_must_not_exist() {
        let store = MemoryStore::new();
        store
            .put("c", "k", json!(1), WriteCondition::MustNotExist)
            .unwrap();
        let err = store
            .put("c", "k", json!(2), WriteCondition::MustNotExist)
            .unwrap_err();
        assert!(matches!(err, FolioError::WriteConflict { .. }));
    }

    #[test]
    fn test_version_condition() {
        let store = MemoryStore::new();
        let v1 = store.put("c", "k", json!(1), WriteCondition::Any).unwrap();

        // Stale version loses.
        store
            .put("c", "k", json!(2), WriteCondition::Version(v1))
            .unwrap();
        let err = store
            .put("c", "k", json!(3), WriteCondition::Version(v1))
            .unwrap_err();
        assert!(matches!(err, FolioError::WriteConflict { .. }));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.put("c", "k", json!(1), WriteCondition::Any).unwrap();
        store.delete("c", "k").unwrap();
        store.delete("c", "k").unwrap();
        assert!(store.get("c", "k").unwrap().is_none());
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let store = MemoryStore::new();
        store.put("c", "b", json!(1), WriteCondition::Any).unwrap();
        store.put("c", "a", json!(2), WriteCondition::Any).unwrap();
        store.put("c", "m", json!(3), WriteCondition::Any).unwrap();

        assert_eq!(store.list("c").unwrap(), vec!["b", "a", "m"]);
        assert!(store.list("empty").unwrap().is_empty());
    }
}
