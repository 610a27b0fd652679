//! Error types for the dashboard services

use opsdash_model::{EntityKind, ModelError, RecordId};
use opsdash_repo::RepoError;

/// Main dashboard error type
#[derive(Debug, thiserror::Error)]
pub enum DashError {
    /// Referenced record does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: RecordId },

    /// Repository failure
    #[error(transparent)]
    Repo(RepoError),

    /// Invalid input
    #[error("invalid input: {0}")]
    Validation(#[from] ModelError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl DashError {
    /// Create not found error
    #[inline]
    pub fn not_found(kind: EntityKind, id: impl Into<RecordId>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    /// Create configuration error
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if a referenced record was missing
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if a write was refused because stored elements did not decode
    #[inline]
    #[must_use]
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::Repo(e) if e.is_unreadable())
    }

    /// Check if a write lost its race after all retries
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Repo(e) if e.is_conflict())
    }
}

impl From<RepoError> for DashError {
    fn from(err: RepoError) -> Self {
        // Lift repository not-found and validation so callers match one variant
        match err {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Validation(e) => Self::Validation(e),
            other => Self::Repo(other),
        }
    }
}

/// Result type for dashboard operations
pub type DashResult<T> = Result<T, DashError>;
