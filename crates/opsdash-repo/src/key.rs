//! Collection key templates
//!
//! One collection per (entity kind, parent id) pair. Scoped kinds carry a
//! `_v{n}` suffix so a schema change can move data to a fresh key.

use opsdash_model::{EntityKind, RecordId};
use std::fmt::{self, Display, Formatter};

/// Address of one JSON collection in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionKey {
    kind: EntityKind,
    parent: Option<RecordId>,
    version: u32,
}

impl CollectionKey {
    /// Create key for a kind, parent and schema version
    ///
    /// The parent is dropped for top-level kinds.
    #[inline]
    #[must_use]
    pub fn new(kind: EntityKind, parent: Option<RecordId>, version: u32) -> Self {
        let parent = if kind.is_scoped() { parent } else { None };
        Self {
            kind,
            parent,
            version,
        }
    }

    /// Books of a shelf (`knowledge_books_shelf_{id}_v{n}`)
    #[inline]
    #[must_use]
    pub fn books(shelf_id: &RecordId, version: u32) -> Self {
        Self::new(EntityKind::Book, Some(shelf_id.clone()), version)
    }

    /// Articles of a book (`knowledge_articles_book_{id}_v{n}`)
    #[inline]
    #[must_use]
    pub fn articles(book_id: &RecordId, version: u32) -> Self {
        Self::new(EntityKind::Article, Some(book_id.clone()), version)
    }

    /// Top-level collection for an unscoped kind
    #[inline]
    #[must_use]
    pub fn top_level(kind: EntityKind) -> Self {
        Self::new(kind, None, 1)
    }

    /// Entity kind stored under this key
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Parent namespace id
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&RecordId> {
        self.parent.as_ref()
    }

    /// Schema version
    #[inline]
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Whether the rendered key carries a version suffix
    #[inline]
    #[must_use]
    pub fn is_versioned(&self) -> bool {
        self.kind.is_scoped()
    }

    /// Same collection at another schema version
    #[inline]
    #[must_use]
    pub fn with_version(&self, version: u32) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    /// Render the store key
    #[must_use]
    pub fn render(&self) -> String {
        let parent = self.parent.as_ref().map_or("", RecordId::as_str);
        match self.kind {
            EntityKind::Shelf => "knowledge_shelves".to_string(),
            EntityKind::Book => format!("knowledge_books_shelf_{parent}_v{}", self.version),
            EntityKind::Article => format!("knowledge_articles_book_{parent}_v{}", self.version),
            EntityKind::KpiReport => "kpi_reports".to_string(),
            EntityKind::QualityRecord => "quality_records".to_string(),
        }
    }
}

impl Display for CollectionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
