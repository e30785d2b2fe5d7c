//! Error types for calnote.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in calnote operations.
#[derive(Error, Debug)]
pub enum CalNoteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task store unavailable at {path}: {reason}")]
    StorageUnavailable { path: PathBuf, reason: String },

    #[error("Task store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Calendar fetch failed: {0}")]
    Fetch(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Could not append to {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for calnote operations.
pub type CalNoteResult<T> = Result<T, CalNoteError>;
