//! Chapter revision history over a document store.
//!
//! Every save of a chapter goes through [`HistoryStore::append_revision`]:
//! the first save writes a chain holding a full-text snapshot, every
//! later save appends one patch against the replayed prior text. Saving
//! identical text twice appends nothing, so autosave loops do not bloat
//! history.
//!
//! Appends are read-modify-write against shared state. Each write is
//! conditioned on the chain version observed at load and retried on
//! conflict, so two racing saves serialize instead of one silently
//! overwriting the other.

use std::sync::Arc;

use crate::error::{FolioError, Result};
use crate::patch::create_patch;
use crate::store::{DocumentStore, WriteCondition};

mod chain;
pub use chain::{ChainDoc, ChainEntry, ReconstructedRevision, RevisionChain};

/// Collection revision chains are stored under, keyed by chapter id.
pub const HISTORY_COLLECTION: &str = "history";

/// Conflicted append attempts before the conflict propagates.
const MAX_APPEND_ATTEMPTS: usize = 5;

/// What an append did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// No chain existed; one was created with a snapshot of the text.
    Created,
    /// A patch against the prior revision was appended.
    Appended,
    /// The text matched the newest revision; nothing was written.
    Unchanged,
}

/// Store for chapter revision chains.
///
/// Constructed over an injected [`DocumentStore`] handle; there is no
/// process-wide store.
pub struct HistoryStore {
    store: Arc<dyn DocumentStore>,
}

impl HistoryStore {
    /// Create a history store over the given document store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record `text` as the newest revision of `identity`.
    ///
    /// Retries a bounded number of times when a concurrent save wins the
    /// write race; after that the [`FolioError::WriteConflict`]
    /// propagates. A chain that fails to replay also fails the append:
    /// nothing may be stacked on top of a broken chain.
    pub fn append_revision(&self, identity: &str, text: &str) -> Result<AppendOutcome> {
        let mut attempt = 1;
        loop {
            match self.try_append(identity, text) {
                Err(FolioError::WriteConflict { .. }) if attempt < MAX_APPEND_ATTEMPTS => {
                    log::debug!(
                        "append race on '{}', retrying (attempt {} of {})",
                        identity,
                        attempt,
                        MAX_APPEND_ATTEMPTS
                    );
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    fn try_append(&self, identity: &str, text: &str) -> Result<AppendOutcome> {
        match self.load(identity)? {
            None => {
                let chain = RevisionChain::new(identity, text.to_string());
                let value = serde_json::to_value(chain.to_doc())?;
                self.store.put(
                    HISTORY_COLLECTION,
                    identity,
                    value,
                    WriteCondition::MustNotExist,
                )?;
                Ok(AppendOutcome::Created)
            }
            Some((mut chain, version)) => {
                let prior = chain.last_text()?;
                if prior == text {
                    return Ok(AppendOutcome::Unchanged);
                }
                chain.push_patch(create_patch(identity, &prior, text));
                let value = serde_json::to_value(chain.to_doc())?;
                self.store.put(
                    HISTORY_COLLECTION,
                    identity,
                    value,
                    WriteCondition::Version(version),
                )?;
                Ok(AppendOutcome::Appended)
            }
        }
    }

    /// Alias for [`append_revision`](Self::append_revision); the verb the
    /// editor-facing API uses.
    pub fn save_revision(&self, chapterid: &str, text: &str) -> Result<AppendOutcome> {
        self.append_revision(chapterid, text)
    }

    /// Load the chain for `identity`. `Ok(None)` means no history yet,
    /// which is a different condition than a store failure.
    pub fn get_chain(&self, identity: &str) -> Result<Option<RevisionChain>> {
        Ok(self.load(identity)?.map(|(chain, _version)| chain))
    }

    /// Every revision of `identity`, newest first, for display.
    /// A chapter with no history yet yields an empty list.
    pub fn list_revisions(&self, chapterid: &str) -> Result<Vec<ReconstructedRevision>> {
        let Some(chain) = self.get_chain(chapterid)? else {
            return Ok(Vec::new());
        };
        let mut revisions = chain.reconstruct_all()?;
        revisions.reverse();
        Ok(revisions)
    }

    /// Remove the chain for `identity`. Called by the library layer when
    /// the owning chapter is deleted; chains are never deleted on their
    /// own.
    pub fn delete_chain(&self, identity: &str) -> Result<()> {
        log::debug!("deleting revision chain for '{}'", identity);
        self.store.delete(HISTORY_COLLECTION, identity)
    }

    fn load(&self, identity: &str) -> Result<Option<(RevisionChain, u64)>> {
        let Some(doc) = self.store.get(HISTORY_COLLECTION, identity)? else {
            return Ok(None);
        };
        let chain_doc: ChainDoc = serde_json::from_value(doc.value)?;
        let chain = RevisionChain::from_doc(identity, chain_doc)?;
        Ok(Some((chain, doc.version)))
    }
}
