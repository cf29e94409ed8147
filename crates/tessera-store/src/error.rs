//! Store errors

use std::path::PathBuf;

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A record with the same identity already exists
    #[error("Record already exists: {0}")]
    Conflict(String),

    /// Reading or writing the snapshot file failed
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file could not be (de)serialized
    #[error("Storage snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Store result type
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Create a not found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a conflict error
    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
