//! Document store abstraction.
//!
//! This module defines the [`DocumentStore`] trait which abstracts over
//! the database that holds books, chapters, and revision chains. The
//! trait mirrors the hosted document-store model the app grew up with:
//! JSON documents addressed by (collection, key), written whole.
//!
//! Two backends ship with the crate: [`MemoryStore`] (tests, embedding)
//! and [`FsStore`] (one JSON file per document).

use serde_json::Value;

use crate::error::FolioError;

mod memory;
pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
mod fs;
#[cfg(not(target_arch = "wasm32"))]
pub use fs::FsStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, FolioError>;

/// A stored document plus the version stamp its last write produced.
///
/// Versions start at 1 and increase by 1 per write to the same key.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedDoc {
    /// The document body.
    pub value: Value,
    /// Monotonic per-key write counter.
    pub version: u64,
}

/// Condition attached to a [`DocumentStore::put`].
///
/// Conditional writes are the serialization point for read-modify-write
/// callers: load a document, recompute, and write back with
/// `Version(loaded)`. A concurrent writer that got there first makes the
/// write fail with [`FolioError::WriteConflict`] instead of silently
/// overwriting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCondition {
    /// Unconditional overwrite.
    Any,
    /// The document must not exist yet.
    MustNotExist,
    /// The document's current version must equal the given one.
    Version(u64),
}

/// Trait for document store backends.
///
/// # Contract
///
/// - A `put` replaces the whole document atomically: concurrent readers
///   observe either the previous or the new document, never a partial
///   one.
/// - `WriteCondition` checks and the write itself are a single atomic
///   step with respect to other writers of the same key.
/// - Calls must not block indefinitely. The shipped backends are local;
///   a networked implementation owns its own deadlines and surfaces
///   timeouts as [`FolioError::Store`].
pub trait DocumentStore: Send + Sync {
    /// Read a document. Returns `Ok(None)` if it does not exist;
    /// an `Err` means the store itself failed, which is a different
    /// condition than absence.
    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<VersionedDoc>>;

    /// Write a document, subject to `condition`.
    ///
    /// Returns the version the write produced. Fails with
    /// [`FolioError::WriteConflict`] when the condition does not hold.
    fn put(
        &self,
        collection: &str,
        key: &str,
        value: Value,
        condition: WriteCondition,
    ) -> StoreResult<u64>;

    /// Delete a document. Deleting an absent document is a no-op.
    fn delete(&self, collection: &str, key: &str) -> StoreResult<()>;

    /// List all keys in a collection, in a stable order.
    fn list(&self, collection: &str) -> StoreResult<Vec<String>>;
}
