//! Error types for store adapters

use crate::token::VersionToken;
use std::path::PathBuf;

/// Errors raised by a [`KeyValueStore`](crate::KeyValueStore) backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing file exists but is not a JSON object of strings
    #[error("corrupt backing file {path}: {source}")]
    CorruptBackingFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Backing map could not be encoded
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Value changed since it was read (optimistic concurrency failure)
    #[error("version conflict on '{key}': expected {expected}, found {actual}")]
    VersionConflict {
        key: String,
        expected: VersionToken,
        actual: VersionToken,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create version conflict for key
    pub fn conflict(key: impl Into<String>, expected: VersionToken, actual: VersionToken) -> Self {
        Self::VersionConflict {
            key: key.into(),
            expected,
            actual,
        }
    }

    /// Check if error is an optimistic concurrency conflict
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
