//! Record trait
//!
//! Defines [`Record`] for every entity stored as an element of a JSON
//! collection, and [`Patchable`] for entities edited in place.

use crate::error::ModelError;
use crate::id::RecordId;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self, Debug, Display, Formatter};

/// Entity kinds known to the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// Top-level knowledge grouping
    Shelf,
    /// Child of a shelf
    Book,
    /// Child of a book
    Article,
    /// Monthly KPI report
    KpiReport,
    /// Scored call evaluation
    QualityRecord,
}

impl EntityKind {
    /// All kinds, leaf-last
    pub const ALL: [Self; 5] = [
        Self::Shelf,
        Self::Book,
        Self::Article,
        Self::KpiReport,
        Self::QualityRecord,
    ];

    /// Stable lowercase identifier
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shelf => "shelf",
            Self::Book => "book",
            Self::Article => "article",
            Self::KpiReport => "kpi_report",
            Self::QualityRecord => "quality_record",
        }
    }

    /// Whether collections of this kind live under a parent namespace
    #[inline]
    #[must_use]
    pub const fn is_scoped(self) -> bool {
        matches!(self, Self::Book | Self::Article)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An element of a JSON-encoded ordered collection
///
/// # Contract
/// - `id` is unique within its collection
/// - `from_draft` must validate the draft before building the record
/// - Serialization is the stored (camelCase) form
pub trait Record: Serialize + DeserializeOwned + Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Input accepted by `create`
    type Draft: Debug;

    /// Entity kind
    const KIND: EntityKind;

    /// Record id
    fn id(&self) -> &RecordId;

    /// Build a new record from a draft
    ///
    /// `parent` is the namespace id for scoped kinds (shelf for books, book
    /// for articles) and `None` for top-level kinds.
    ///
    /// # Errors
    /// Returns error if the draft violates record invariants
    fn from_draft(
        id: RecordId,
        parent: Option<&RecordId>,
        draft: Self::Draft,
        now: DateTime<Utc>,
    ) -> Result<Self, ModelError>;
}

/// A record that supports in-place edits
pub trait Patchable: Record {
    /// Partial update; `None` fields are left untouched
    type Patch: Debug;

    /// Apply a patch, returning whether any field changed
    ///
    /// Applying the same patch twice must leave the record as applying it
    /// once did, and the second call must return `false`.
    ///
    /// # Errors
    /// Returns error if the patched record would violate invariants
    fn apply_patch(&mut self, patch: &Self::Patch, now: DateTime<Utc>) -> Result<bool, ModelError>;
}

/// Stored timestamp format (RFC 3339, millisecond precision, `Z` suffix)
#[inline]
#[must_use]
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Field deserializer that reads an explicit `null` as the type's default
///
/// Older clients wrote `null` for unset counters and text fields.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Overwrite `slot` with `value` if it differs, reporting the change
pub(crate) fn assign<T: PartialEq + Clone>(slot: &mut T, value: Option<&T>) -> bool {
    match value {
        Some(v) if slot != v => {
            *slot = v.clone();
            true
        }
        _ => false,
    }
}
