//! Whole-collection reads and fenced rewrites
//!
//! Every collection is one JSON array under one key. A write replaces the
//! whole array. [`Collections::modify`] fences the read-modify-write cycle
//! with a [`VersionToken`] and re-applies the mutation to fresh state when
//! another writer got there first.

use crate::error::{RepoError, RepoResult};
use crate::key::CollectionKey;
use crate::schema::SchemaRegistry;
use opsdash_model::Record;
use opsdash_store::{KeyValueStore, StoreError, VersionToken};
use serde_json::Value;
use std::sync::Arc;

/// Default number of re-applications after a lost race
pub const DEFAULT_MAX_WRITE_RETRIES: u32 = 3;

/// Records of one collection as read, with the token of the raw value
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<R> {
    /// Records in stored order
    pub records: Vec<R>,
    /// Version of the raw value the records were decoded from
    pub token: VersionToken,
    /// Stored elements skipped because they did not decode as `R`
    pub dropped: usize,
}


/// Result of a mutation closure passed to [`Collections::modify`]
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T> {
    /// Records changed; write them back and return the value
    Write(T),
    /// Nothing changed; return the value without writing
    Skip(T),
}

/// Access to the JSON collections of one store
#[derive(Debug, Clone)]
pub struct Collections {
    store: Arc<dyn KeyValueStore>,
    registry: Arc<SchemaRegistry>,
    max_retries: u32,
}

impl Collections {
    /// Create with the default schema registry
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            registry: Arc::new(SchemaRegistry::with_defaults()),
            max_retries: DEFAULT_MAX_WRITE_RETRIES,
        }
    }

    /// With schema registry
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// With maximum number of retries after a conflict
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Schema registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Read and decode a collection
    ///
    /// A value that is not a JSON array reads as an empty collection.
    /// Elements of an array are decoded one by one; an element that does not
    /// decode as `R` is skipped and counted in [`Snapshot::dropped`]. The
    /// returned token still describes the raw value, so a later fenced write
    /// replaces exactly what was read.
    ///
    /// # Errors
    /// Returns error if the store fails or a legacy collection cannot be
    /// migrated
    pub fn read<R: Record>(&self, key: &CollectionKey) -> RepoResult<Snapshot<R>> {
        let (raw, token) = self.load(key)?;
        let (records, dropped) = match raw {
            None => (Vec::new(), 0),
            Some(raw) => decode(key, &raw),
        };
        Ok(Snapshot {
            records,
            token,
            dropped,
        })
    }

    /// Fenced write: store `records` only if the value still matches `expected`
    ///
    /// Callers holding an incomplete [`Snapshot`] must not commit it; the
    /// skipped elements would be lost.
    ///
    /// # Errors
    /// Returns [`StoreError::VersionConflict`] (wrapped) if another writer
    /// changed the collection since `expected` was read
    pub fn commit<R: Record>(
        &self,
        key: &CollectionKey,
        expected: &VersionToken,
        records: &[R],
    ) -> RepoResult<VersionToken> {
        let encoded = serde_json::to_string(records)?;
        self.store.compare_and_set(&key.render(), expected, &encoded)?;
        tracing::debug!("Committed {} {} records to {}", records.len(), key.kind(), key);
        Ok(VersionToken::of(Some(encoded.as_str())))
    }

    /// Unfenced write: last writer wins
    ///
    /// Used for seeding and imports. Two callers that read, modify and
    /// overwrite the same key concurrently lose one of the updates.
    ///
    /// # Errors
    /// Returns error if encoding or the store fails
    pub fn overwrite<R: Record>(&self, key: &CollectionKey, records: &[R]) -> RepoResult<()> {
        let encoded = serde_json::to_string(records)?;
        self.store.set(&key.render(), &encoded)?;
        tracing::debug!("Overwrote {} with {} records", key, records.len());
        Ok(())
    }

    /// Remove a collection entirely
    ///
    /// # Errors
    /// Returns error if the store fails
    pub fn remove(&self, key: &CollectionKey) -> RepoResult<()> {
        self.store.remove(&key.render())?;
        Ok(())
    }

    /// Fenced read-modify-write with retry-with-merge
    ///
    /// `mutate` receives the current records and may be called more than
    /// once: after a lost race it is re-applied to the fresh collection, so
    /// it must derive its changes from the records it is given.
    ///
    /// A collection with undecodable elements is never rewritten: the
    /// closure may still run and return [`Mutation::Skip`], but a
    /// [`Mutation::Write`] fails with [`RepoError::Unreadable`].
    ///
    /// # Errors
    /// Returns the closure's error, a store error, [`RepoError::Unreadable`],
    /// or [`RepoError::Conflict`] once retries are exhausted
    pub fn modify<R, T, F>(&self, key: &CollectionKey, mut mutate: F) -> RepoResult<T>
    where
        R: Record,
        F: FnMut(&mut Vec<R>) -> RepoResult<Mutation<T>>,
    {
        let attempts = self.max_retries + 1;
        for attempt in 1..=attempts {
            let Snapshot {
                mut records,
                token,
                dropped,
            } = self.read::<R>(key)?;

            let value = match mutate(&mut records)? {
                Mutation::Skip(value) => return Ok(value),
                Mutation::Write(value) => value,
            };
            if dropped > 0 {
                return Err(RepoError::Unreadable {
                    key: key.render(),
                    dropped,
                });
            }

            match self.commit(key, &token, &records) {
                Ok(_) => return Ok(value),
                Err(RepoError::Store(StoreError::VersionConflict { .. })) => {
                    tracing::warn!(
                        "Write conflict on {} (attempt {}/{}), re-applying",
                        key,
                        attempt,
                        attempts
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(RepoError::Conflict {
            key: key.render(),
            attempts,
        })
    }

    /// Raw value and token, migrating a legacy versioned key when needed
    fn load(&self, key: &CollectionKey) -> RepoResult<(Option<String>, VersionToken)> {
        let (raw, token) = self.store.get_versioned(&key.render())?;
        if raw.is_some() || !key.is_versioned() {
            return Ok((raw, token));
        }

        match self.migrate_legacy(key)? {
            Some(encoded) => {
                let token = VersionToken::of(Some(encoded.as_str()));
                Ok((Some(encoded), token))
            }
            None => Ok((None, token)),
        }
    }

    /// Move the newest legacy version of `key` to the current key
    fn migrate_legacy(&self, key: &CollectionKey) -> RepoResult<Option<String>> {
        for version in (1..key.version()).rev() {
            let legacy = key.with_version(version);
            let Some(raw) = self.store.get(&legacy.render())? else {
                continue;
            };

            let Ok(values) = serde_json::from_str::<Vec<Value>>(&raw) else {
                tracing::warn!("Legacy collection {} is not a JSON array; skipping migration", legacy);
                continue;
            };

            let count = values.len();
            let upgraded = self.registry.upgrade(key.kind(), version, values)?;
            let encoded = serde_json::to_string(&upgraded)?;

            match self
                .store
                .compare_and_set(&key.render(), &VersionToken::absent(), &encoded)
            {
                Ok(()) => {}
                // Another writer already populated the current key; theirs wins
                Err(StoreError::VersionConflict { .. }) => return Ok(self.store.get(&key.render())?),
                Err(e) => return Err(e.into()),
            }
            self.store.remove(&legacy.render())?;

            tracing::info!(
                "Migrated {} {} records from {} to {}",
                count,
                key.kind(),
                legacy,
                key
            );
            return Ok(Some(encoded));
        }
        Ok(None)
    }
}

/// Decode a collection element by element
///
/// Returns the decoded records and the number of elements skipped. A value
/// that is not a JSON array reads as empty with nothing skipped, so the next
/// write replaces it.
fn decode<R: Record>(key: &CollectionKey, raw: &str) -> (Vec<R>, usize) {
    let values = match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!("Collection {} is malformed ({}); reading as empty", key, e);
            return (Vec::new(), 0);
        }
    };

    let mut records = Vec::with_capacity(values.len());
    let mut dropped = 0;
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<R>(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Skipping element {} of {}: {}", index, key, e);
                dropped += 1;
            }
        }
    }
    (records, dropped)
}
