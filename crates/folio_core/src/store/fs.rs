//! Filesystem store implementation.
//!
//! One JSON file per document under `<root>/<collection>/<key>.json`,
//! wrapped in a `{version, value}` envelope. Writes go to a temp file in
//! the same directory and are renamed into place, so readers never see a
//! partial document. An in-process mutex serializes writers so the
//! version check and the rename are not interleaved.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DocumentStore, StoreResult, VersionedDoc, WriteCondition};
use crate::error::FolioError;

/// On-disk shape of one document.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u64,
    value: Value,
}

/// Document store backed by a directory of JSON files.
pub struct FsStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn doc_path(&self, collection: &str, key: &str) -> StoreResult<PathBuf> {
        check_component(collection)?;
        check_component(key)?;
        Ok(self.root.join(collection).join(format!("{}.json", key)))
    }

    fn read_envelope(&self, path: &Path, collection: &str, key: &str) -> StoreResult<Option<Envelope>> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FolioError::Store {
                    collection: collection.to_string(),
                    key: key.to_string(),
                    source: e,
                });
            }
        };
        Ok(Some(serde_json::from_str(&content)?))
    }
}

/// Keys and collection names become path components; reject anything
/// that could escape the store root.
fn check_component(name: &str) -> StoreResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(FolioError::InvalidKey(name.to_string()));
    }
    Ok(())
}

impl DocumentStore for FsStore {
    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<VersionedDoc>> {
        let path = self.doc_path(collection, key)?;
        Ok(self
            .read_envelope(&path, collection, key)?
            .map(|envelope| VersionedDoc {
                value: envelope.value,
                version: envelope.version,
            }))
    }

    fn put(
        &self,
        collection: &str,
        key: &str,
        value: Value,
        condition: WriteCondition,
    ) -> StoreResult<u64> {
        let path = self.doc_path(collection, key)?;
        let _guard = self.write_lock.lock().unwrap();

        let current = self
            .read_envelope(&path, collection, key)?
            .map(|envelope| envelope.version);
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
        let envelope = Envelope { version, value };
        let content = serde_json::to_string_pretty(&envelope)?;

        let io_err = |source: std::io::Error| FolioError::Store {
            collection: collection.to_string(),
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp).map_err(io_err)?;
            file.write_all(content.as_bytes()).map_err(io_err)?;
        }
        fs::rename(&tmp, &path).map_err(io_err)?;
        Ok(version)
    }

    fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        let path = self.doc_path(collection, key)?;
        let _guard = self.write_lock.lock().unwrap();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FolioError::Store {
                collection: collection.to_string(),
                key: key.to_string(),
                source: e,
            }),
        }
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<String>> {
        check_component(collection)?;
        let dir = self.root.join(collection);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, FsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path().join("data")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_put_get_round_trip() {
        let (_dir, store) = temp_store();
        let version = store
            .put("books", "b1", json!({"title": "Dune"}), WriteCondition::Any)
            .unwrap();
        assert_eq!(version, 1);

        let doc = store.get("books", "b1").unwrap().unwrap();
        assert_eq!(doc.value, json!({"title": "Dune"}));
        assert_eq!(doc.version, 1);
    }

    #[test]
    fn test_versions_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        {
            let store = FsStore::open(&root).unwrap();
            store.put("c", "k", json!(1), WriteCondition::Any).unwrap();
            store.put("c", "k", json!(2), WriteCondition::Any).unwrap();
        }
        let store = FsStore::open(&root).unwrap();
        assert_eq!(store.get("c", "k").unwrap().unwrap().version, 2);
    }

    #[test]
    fn test_version_condition_conflict() {
        let (_dir, store) = temp_store();
        let v1 = store.put("c", "k", json!(1), WriteCondition::Any).unwrap();
        store
            .put("c", "k", json!(2), WriteCondition::Version(v1))
            .unwrap();
        let err = store
            .put("c", "k", json!(3), WriteCondition::Version(v1))
            .unwrap_err();
        assert!(matches!(err, FolioError::WriteConflict { .. }));
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let (_dir, store) = temp_store();
        store.delete("c", "missing").unwrap();
    }

    #[test]
    fn test_list_sorted() {
        let (_dir, store) = temp_store();
        store.put("c", "b", json!(1), WriteCondition::Any).unwrap();
        store.put("c", "a", json!(2), WriteCondition::Any).unwrap();
        assert_eq!(store.list("c").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let (_dir, store) = temp_store();
        let err = store.get("c", "../escape").unwrap_err();
        assert!(matches!(err, FolioError::InvalidKey(_)));
        let err = store.get("..", "k").unwrap_err();
        assert!(matches!(err, FolioError::InvalidKey(_)));
    }
}
