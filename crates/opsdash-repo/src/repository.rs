//! Typed repository over one entity kind
//!
//! [`Repository<R>`] addresses the collection of `R` under an optional
//! parent namespace and performs whole-collection CRUD through
//! [`Collections`]. Nothing is cached between calls.

use crate::clock::{Clock, SystemClock};
use crate::collection::{Collections, Mutation, Snapshot};
use crate::error::{RepoError, RepoResult};
use crate::ids::IdGenerator;
use crate::key::CollectionKey;
use opsdash_model::{Patchable, Record, RecordId};
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

/// CRUD over the ordered collections of `R`
pub struct Repository<R: Record> {
    collections: Collections,
    ids: Arc<IdGenerator>,
    clock: Arc<dyn Clock>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            collections: self.collections.clone(),
            ids: Arc::clone(&self.ids),
            clock: Arc::clone(&self.clock),
            _record: PhantomData,
        }
    }
}

impl<R: Record> Debug for Repository<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("kind", &R::KIND)
            .field("ids", &self.ids.strategy())
            .finish_non_exhaustive()
    }
}

impl<R: Record> Repository<R> {
    /// Create repository with a system clock and default id strategy
    #[inline]
    #[must_use]
    pub fn new(collections: Collections) -> Self {
        Self::with_parts(collections, Arc::new(IdGenerator::default()), Arc::new(SystemClock))
    }

    /// Create repository sharing an id generator and clock
    #[inline]
    #[must_use]
    pub fn with_parts(collections: Collections, ids: Arc<IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            collections,
            ids,
            clock,
            _record: PhantomData,
        }
    }

    /// Collection access shared by this repository
    #[inline]
    #[must_use]
    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    /// Key of the collection under `parent`
    ///
    /// # Errors
    /// Returns [`RepoError::MissingScope`] for a scoped kind without parent
    pub fn key(&self, parent: Option<&RecordId>) -> RepoResult<CollectionKey> {
        let kind = R::KIND;
        if kind.is_scoped() && parent.is_none() {
            return Err(RepoError::MissingScope(kind));
        }
        let version = self.collections.registry().current_version(kind);
        Ok(CollectionKey::new(kind, parent.cloned(), version))
    }

    /// All records under `parent`, in insertion order
    ///
    /// Malformed stored data reads as an empty collection; elements that do
    /// not decode are skipped.
    ///
    /// # Errors
    /// Returns error if the store fails or a legacy collection cannot be
    /// migrated
    pub fn list(&self, parent: Option<&RecordId>) -> RepoResult<Vec<R>> {
        Ok(self.snapshot(parent)?.records)
    }

    /// Records plus the version token they were read at
    ///
    /// # Errors
    /// Returns error if the store fails
    pub fn snapshot(&self, parent: Option<&RecordId>) -> RepoResult<Snapshot<R>> {
        let key = self.key(parent)?;
        self.collections.read(&key)
    }

    /// Record with `id`, if present
    ///
    /// # Errors
    /// Returns error if the store fails
    pub fn get(&self, parent: Option<&RecordId>, id: &RecordId) -> RepoResult<Option<R>> {
        Ok(self.list(parent)?.into_iter().find(|r| r.id() == id))
    }

    /// Append a new record built from `draft`
    ///
    /// # Errors
    /// Returns error if the draft is invalid or the write fails
    pub fn create(&self, parent: Option<&RecordId>, draft: R::Draft) -> RepoResult<R> {
        let key = self.key(parent)?;
        let record = R::from_draft(self.ids.next_id(), key.parent(), draft, self.clock.now())?;

        self.collections.modify(&key, |records: &mut Vec<R>| {
            records.push(record.clone());
            Ok(Mutation::Write(()))
        })?;

        tracing::info!("Created {} {} in {}", R::KIND, record.id(), key);
        Ok(record)
    }

    /// Remove the record with `id`, returning it
    ///
    /// # Errors
    /// Returns [`RepoError::NotFound`] if no record has `id`
    pub fn delete(&self, parent: Option<&RecordId>, id: &RecordId) -> RepoResult<R> {
        let key = self.key(parent)?;
        let removed = self.collections.modify(&key, |records: &mut Vec<R>| {
            let index = records
                .iter()
                .position(|r| r.id() == id)
                .ok_or_else(|| RepoError::not_found(R::KIND, id.clone()))?;
            Ok(Mutation::Write(records.remove(index)))
        })?;

        tracing::info!("Deleted {} {} from {}", R::KIND, id, key);
        Ok(removed)
    }

    /// Rewrite the record with `id` through `edit`
    ///
    /// `edit` returns whether it changed the record; when it did not, nothing
    /// is written. It may run more than once if a concurrent write forces a
    /// retry.
    ///
    /// # Errors
    /// Returns [`RepoError::NotFound`] if no record has `id`, or the error
    /// returned by `edit`
    pub fn modify_record<F>(&self, parent: Option<&RecordId>, id: &RecordId, mut edit: F) -> RepoResult<R>
    where
        F: FnMut(&mut R) -> RepoResult<bool>,
    {
        let key = self.key(parent)?;
        self.collections.modify(&key, |records: &mut Vec<R>| {
            let record = records
                .iter_mut()
                .find(|r| r.id() == id)
                .ok_or_else(|| RepoError::not_found(R::KIND, id.clone()))?;
            let changed = edit(record)?;
            let updated = record.clone();
            Ok(if changed {
                Mutation::Write(updated)
            } else {
                Mutation::Skip(updated)
            })
        })
    }

    /// Replace the whole collection without fencing (last writer wins)
    ///
    /// # Errors
    /// Returns error if the write fails
    pub fn replace_all(&self, parent: Option<&RecordId>, records: &[R]) -> RepoResult<()> {
        let key = self.key(parent)?;
        self.collections.overwrite(&key, records)
    }
}

impl<R: Patchable> Repository<R> {
    /// Apply `patch` to the record with `id`
    ///
    /// Idempotent: a patch that changes nothing writes nothing.
    ///
    /// # Errors
    /// Returns [`RepoError::NotFound`] if no record has `id`, or a
    /// validation error if the patched record would be invalid
    pub fn update(&self, parent: Option<&RecordId>, id: &RecordId, patch: &R::Patch) -> RepoResult<R> {
        let now = self.clock.now();
        let updated = self.modify_record(parent, id, |record| Ok(record.apply_patch(patch, now)?))?;
        tracing::debug!("Updated {} {}", R::KIND, id);
        Ok(updated)
    }
}
