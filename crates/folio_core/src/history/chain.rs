//! Revision chains: a snapshot plus the patches that follow it.
//!
//! Index 0 of a chain is always a full-text snapshot; every later entry
//! is a patch transforming the text at the previous index into the text
//! at its own. Replaying entries `0..=i` reconstructs the full text as
//! of revision `i`.

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};
use crate::patch::{self, Patch};

/// One entry in a revision chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainEntry {
    /// Full text of the earliest recorded revision. Only at index 0.
    Snapshot(String),
    /// Transforms the previous revision's text into this one's.
    Patch(Patch),
}

/// Wire shape of a persisted chain: `{ "history": [string, ...] }`.
///
/// `history[0]` is the snapshot text; `history[1..]` are patch scripts
/// in the format produced by [`Patch`]'s `Display` impl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDoc {
    /// Snapshot text first, then patch scripts in order.
    pub history: Vec<String>,
}

/// A revision materialized by replay. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedRevision {
    /// Position in the chain.
    pub index: usize,
    /// Full text at that position.
    pub text: String,
}

/// The ordered snapshot-plus-patches history of one document.
///
/// Entries are append-only: a save never edits history, it appends one
/// patch. The constructors keep the snapshot-at-index-0 shape an
/// invariant rather than a convention.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionChain {
    identity: String,
    entries: Vec<ChainEntry>,
}

impl RevisionChain {
    /// Start a chain from the first saved text.
    pub fn new(identity: impl Into<String>, snapshot: String) -> Self {
        Self {
            identity: identity.into(),
            entries: vec![ChainEntry::Snapshot(snapshot)],
        }
    }

    /// The key this chain is stored under (the chapter id).
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The entries, snapshot first.
    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    /// Number of recorded revisions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chain has no entries. Never true for a chain built
    /// through this type's constructors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one patch, recording a new revision.
    pub fn push_patch(&mut self, patch: Patch) {
        self.entries.push(ChainEntry::Patch(patch));
    }

    /// Rebuild a chain from its wire shape, validating that it is
    /// non-empty and that every entry past the snapshot parses as a
    /// patch. A script that does not parse marks the chain broken at
    /// that index.
    pub fn from_doc(identity: impl Into<String>, doc: ChainDoc) -> Result<Self> {
        let mut texts = doc.history.into_iter();
        let Some(snapshot) = texts.next() else {
            return Err(FolioError::EmptyChain);
        };

        let mut entries = vec![ChainEntry::Snapshot(snapshot)];
        for (offset, script) in texts.enumerate() {
            let index = offset + 1;
            let parsed = Patch::parse(&script).map_err(|e| FolioError::BrokenChain {
                index,
                source: Box::new(e),
            })?;
            entries.push(ChainEntry::Patch(parsed));
        }

        Ok(Self {
            identity: identity.into(),
            entries,
        })
    }

    /// Render the chain back to its wire shape.
    pub fn to_doc(&self) -> ChainDoc {
        let history = self
            .entries
            .iter()
            .map(|entry| match entry {
                ChainEntry::Snapshot(text) => text.clone(),
                ChainEntry::Patch(patch) => patch.to_string(),
            })
            .collect();
        ChainDoc { history }
    }

    /// Reconstruct the full text at `index` by replaying the chain.
    ///
    /// Pure and restartable; calling it twice with no intervening writes
    /// returns identical text. A patch that fails to apply surfaces as
    /// [`FolioError::BrokenChain`] naming the failing entry, since every
    /// later revision depends on it.
    pub fn reconstruct_at(&self, index: usize) -> Result<String> {
        if index >= self.entries.len() {
            return Err(FolioError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }

        let mut text: Option<String> = None;
        for revision in self.iter_revisions().take(index + 1) {
            text = Some(revision?.text);
        }
        // iter_revisions yields exactly index + 1 items for a valid index.
        text.ok_or(FolioError::EmptyChain)
    }

    /// Text of the newest revision.
    pub fn last_text(&self) -> Result<String> {
        match self.entries.len() {
            0 => Err(FolioError::EmptyChain),
            n => self.reconstruct_at(n - 1),
        }
    }

    /// Lazily replay every revision, oldest first.
    ///
    /// The iterator is finite and restartable. It stops after the first
    /// error: once an entry fails to apply, every later revision is
    /// unreconstructible.
    pub fn iter_revisions(&self) -> impl Iterator<Item = Result<ReconstructedRevision>> + '_ {
        let mut text: Option<String> = None;
        let mut broken = false;
        self.entries
            .iter()
            .enumerate()
            .map_while(move |(index, entry)| {
                if broken {
                    return None;
                }
                let next = match entry {
                    ChainEntry::Snapshot(snapshot) => {
                        if index == 0 {
                            Ok(snapshot.clone())
                        } else {
                            Err(FolioError::SnapshotMisplaced { index })
                        }
                    }
                    ChainEntry::Patch(patch) => match text.as_deref() {
                        Some(prev) => patch::apply_patch(prev, patch).map_err(|e| {
                            FolioError::BrokenChain {
                                index,
                                source: Box::new(e),
                            }
                        }),
                        None => Err(FolioError::SnapshotMisplaced { index }),
                    },
                };
                match next {
                    Ok(t) => {
                        text = Some(t.clone());
                        Some(Ok(ReconstructedRevision { index, text: t }))
                    }
                    Err(e) => {
                        broken = true;
                        Some(Err(e))
                    }
                }
            })
    }

    /// Replay every revision into a vector, oldest first.
    pub fn reconstruct_all(&self) -> Result<Vec<ReconstructedRevision>> {
        self.iter_revisions().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::create_patch;

    fn chain_of(identity: &str, texts: &[&str]) -> RevisionChain {
        let mut chain = RevisionChain::new(identity, texts[0].to_string());
        for pair in texts.windows(2) {
            chain.push_patch(create_patch(identity, pair[0], pair[1]));
        }
        chain
    }

    #[test]
    fn test_reconstruct_at_every_index() {
        let chain = chain_of("c1", &["Hello", "Hello world", "Hello world!"]);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.reconstruct_at(0).unwrap(), "Hello");
        assert_eq!(chain.reconstruct_at(1).unwrap(), "Hello world");
        assert_eq!(chain.reconstruct_at(2).unwrap(), "Hello world!");
    }

    #[test]
    fn test_reconstruct_at_out_of_range() {
        let chain = chain_of("c1", &["only one"]);
        let err = chain.reconstruct_at(1).unwrap_err();
        assert!(matches!(
            err,
            FolioError::IndexOutOfRange { index: 1, len: 1 }
        ));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let chain = chain_of("c1", &["a\nb\n", "a\nB\n", "a\nB\nc\n"]);
        assert_eq!(
            chain.reconstruct_at(2).unwrap(),
            chain.reconstruct_at(2).unwrap()
        );
    }

    #[test]
    fn test_reconstruct_all_in_order() {
        let chain = chain_of("c1", &["one", "two", "three"]);
        let revisions = chain.reconstruct_all().unwrap();
        assert_eq!(revisions.len(), 3);
        assert_eq!(revisions[0].index, 0);
        assert_eq!(revisions[0].text, "one");
        assert_eq!(revisions[2].text, "three");
    }

    #[test]
    fn test_broken_chain_detected_at_exact_index() {
        let chain = chain_of("c1", &["a\nb\nc\n", "a\nb\nsea\n", "a\nb\nsea!\n", "z\n"]);
        // Corrupt entry 2 so its context no longer matches entry 1's text.
        let mut doc = chain.to_doc();
        doc.history[2] = create_patch("c1", "totally\ndifferent\n", "base\ntext\n").to_string();
        let corrupted = RevisionChain::from_doc("c1", doc).unwrap();

        let err = corrupted.reconstruct_at(3).unwrap_err();
        assert!(matches!(err, FolioError::BrokenChain { index: 2, .. }));

        // Entries before the break still reconstruct.
        assert_eq!(corrupted.reconstruct_at(1).unwrap(), "a\nb\nsea\n");
    }

    #[test]
    fn test_iter_stops_after_break() {
        let chain = chain_of("c1", &["a\n", "b\n", "c\n"]);
        let mut doc = chain.to_doc();
        doc.history[1] = create_patch("c1", "x\n", "y\n").to_string();
        let corrupted = RevisionChain::from_doc("c1", doc).unwrap();

        let results: Vec<_> = corrupted.iter_revisions().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1].as_ref().unwrap_err(),
            FolioError::BrokenChain { index: 1, .. }
        ));
    }

    #[test]
    fn test_doc_round_trip() {
        let chain = chain_of("c1", &["one\n", "two\n"]);
        let restored = RevisionChain::from_doc("c1", chain.to_doc()).unwrap();
        assert_eq!(restored, chain);
    }

    #[test]
    fn test_from_doc_rejects_empty() {
        let err = RevisionChain::from_doc("c1", ChainDoc { history: vec![] }).unwrap_err();
        assert!(matches!(err, FolioError::EmptyChain));
    }

    #[test]
    fn test_from_doc_rejects_unparseable_patch() {
        let doc = ChainDoc {
            history: vec!["snapshot".to_string(), "not a patch".to_string()],
        };
        let err = RevisionChain::from_doc("c1", doc).unwrap_err();
        assert!(matches!(err, FolioError::BrokenChain { index: 1, .. }));
    }
}
