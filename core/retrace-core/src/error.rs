//! Error types for retrace-core operations.
//!
//! Only persistence can fail in a way callers need to see; everything else
//! degrades in place (stale entries are dropped, invalid session state is a
//! no-op). See the module docs on [`crate::store`].

use std::path::PathBuf;

/// All errors that can surface from history operations.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("History file malformed: {path}: {details}")]
    Corrupt { path: PathBuf, details: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using HistoryError.
pub type Result<T> = std::result::Result<T, HistoryError>;

// Conversion for string error compatibility
impl From<HistoryError> for String {
    fn from(err: HistoryError) -> String {
        err.to_string()
    }
}
