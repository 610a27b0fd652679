//! Key-value store contract
//!
//! A synchronous, string-keyed, string-valued store scoped to the running
//! client. There is no atomicity across keys.

use crate::error::{StoreError, StoreResult};
use crate::token::VersionToken;
use std::fmt::Debug;

/// Synchronous string key-value store
///
/// # Contract
/// - A value survives until it is removed or the store is cleared externally
/// - Calls never suspend; they may block on local I/O
/// - No ordering guarantee between different keys
pub trait KeyValueStore: Send + Sync + Debug {
    /// Read the value stored under `key`
    ///
    /// # Errors
    /// Returns error if the backend cannot be read
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove the value under `key` (no-op when absent)
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Read a value together with its version token
    ///
    /// # Errors
    /// Returns error if the backend cannot be read
    fn get_versioned(&self, key: &str) -> StoreResult<(Option<String>, VersionToken)> {
        let value = self.get(key)?;
        let token = VersionToken::of(value.as_deref());
        Ok((value, token))
    }

    /// Store `value` only if the current value still matches `expected`
    ///
    /// The default implementation is a plain read-compare-write and is NOT
    /// atomic. Backends that can hold a lock across the check override it.
    ///
    /// # Errors
    /// Returns [`StoreError::VersionConflict`] if the value changed since
    /// `expected` was observed
    fn compare_and_set(&self, key: &str, expected: &VersionToken, value: &str) -> StoreResult<()> {
        let (_, actual) = self.get_versioned(key)?;
        if actual != *expected {
            return Err(StoreError::conflict(key, *expected, actual));
        }
        self.set(key, value)
    }
}
