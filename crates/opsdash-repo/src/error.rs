//! Error types for repositories

use opsdash_model::{EntityKind, ModelError, RecordId};
use opsdash_store::StoreError;

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Underlying store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Collection could not be encoded
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Record invariant violated
    #[error("validation failed: {0}")]
    Validation(#[from] ModelError),

    /// No record with this id in the collection
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: RecordId },

    /// Scoped collection addressed without its parent id
    #[error("{0} collections require a parent id")]
    MissingScope(EntityKind),

    /// Fenced write kept losing to concurrent writers
    #[error("write conflict on '{key}' after {attempts} attempts")]
    Conflict { key: String, attempts: u32 },

    /// Collection has elements that do not decode; rewriting it would drop them
    #[error("refusing to rewrite '{key}': {dropped} stored elements are unreadable")]
    Unreadable { key: String, dropped: usize },

    /// Legacy collection could not be upgraded
    #[error("cannot migrate {kind} from v{from}: {reason}")]
    Migration {
        kind: EntityKind,
        from: u32,
        reason: String,
    },
}

impl RepoError {
    /// Create not found error
    #[inline]
    pub fn not_found(kind: EntityKind, id: impl Into<RecordId>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create migration error
    #[inline]
    pub fn migration(kind: EntityKind, from: u32, reason: impl Into<String>) -> Self {
        Self::Migration {
            kind,
            from,
            reason: reason.into(),
        }
    }

    /// Check if error is a missing record
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if error is a refused rewrite of a partly unreadable collection
    #[inline]
    #[must_use]
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::Unreadable { .. })
    }

    /// Check if error is an exhausted write conflict
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Result type alias for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
