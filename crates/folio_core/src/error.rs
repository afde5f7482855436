use thiserror::Error;

/// Unified error type for folio operations
#[derive(Debug, Error)]
pub enum FolioError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Store errors
    #[error("store error for '{collection}/{key}': {source}")]
    Store {
        collection: String,
        key: String,
        source: std::io::Error,
    },

    #[error("write conflict for '{collection}/{key}'")]
    WriteConflict { collection: String, key: String },

    #[error("invalid document key '{0}'")]
    InvalidKey(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Patch errors
    #[error("malformed patch at line {line}: {reason}")]
    PatchParse { line: usize, reason: String },

    #[error("patch does not apply: hunk {hunk} expected {expected:?}, found {found:?}")]
    PatchMismatch {
        hunk: usize,
        expected: String,
        found: Option<String>,
    },

    // Chain errors
    #[error("revision chain is empty")]
    EmptyChain,

    #[error("chain entry {index} is a snapshot, but only entry 0 may be one")]
    SnapshotMisplaced { index: usize },

    #[error("revision chain is broken at entry {index}: {source}")]
    BrokenChain {
        index: usize,
        source: Box<FolioError>,
    },

    #[error("revision index {index} out of range for chain of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    // Library errors
    #[error("book '{0}' not found")]
    BookNotFound(String),

    #[error("chapter '{0}' not found")]
    ChapterNotFound(String),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias for folio operations
pub type Result<T> = std::result::Result<T, FolioError>;
