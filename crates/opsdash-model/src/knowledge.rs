//! Knowledge base records: shelves, books and articles

use crate::error::{require, ModelError};
use crate::id::RecordId;
use crate::record::{assign, lenient, timestamp, EntityKind, Patchable, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level grouping of books
///
/// Shelves are seeded externally; this layer only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shelf {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
}

/// Draft for seeding a shelf
#[derive(Debug, Clone, Default)]
pub struct ShelfDraft {
    pub title: String,
}

impl Record for Shelf {
    type Draft = ShelfDraft;

    const KIND: EntityKind = EntityKind::Shelf;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(
        id: RecordId,
        _parent: Option<&RecordId>,
        draft: Self::Draft,
        _now: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        require("shelf", "title", &draft.title)?;
        Ok(Self {
            id,
            title: draft.title,
        })
    }
}

/// A book on a shelf
///
/// `article_count` is a stored summary of the book's article collection.
/// It is kept in step by the cascade synchronizer, not by this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient")]
    pub shelf_id: RecordId,
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient")]
    pub details: String,
    /// Cover image as a data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub article_count: u32,
}

/// Draft for seeding a book
#[derive(Debug, Clone, Default)]
pub struct BookDraft {
    pub title: String,
    pub details: String,
    pub cover: Option<String>,
}

/// In-place edit of a book's descriptive fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub details: Option<String>,
    /// `Some(None)` clears the cover
    pub cover: Option<Option<String>>,
}

impl BookPatch {
    /// Patch that only renames the book
    #[inline]
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// With details
    #[inline]
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// With cover (or `None` to clear it)
    #[inline]
    #[must_use]
    pub fn with_cover(mut self, cover: Option<String>) -> Self {
        self.cover = Some(cover);
        self
    }
}

impl Record for Book {
    type Draft = BookDraft;

    const KIND: EntityKind = EntityKind::Book;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(
        id: RecordId,
        parent: Option<&RecordId>,
        draft: Self::Draft,
        _now: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        let shelf_id = parent.ok_or(ModelError::MissingParent("book"))?;
        require("book", "title", &draft.title)?;
        Ok(Self {
            id,
            shelf_id: shelf_id.clone(),
            title: draft.title,
            details: draft.details,
            cover: draft.cover,
            article_count: 0,
        })
    }
}

impl Patchable for Book {
    type Patch = BookPatch;

    fn apply_patch(&mut self, patch: &Self::Patch, _now: DateTime<Utc>) -> Result<bool, ModelError> {
        if let Some(title) = &patch.title {
            require("book", "title", title)?;
        }
        let mut changed = assign(&mut self.title, patch.title.as_ref());
        changed |= assign(&mut self.details, patch.details.as_ref());
        changed |= assign(&mut self.cover, patch.cover.as_ref());
        Ok(changed)
    }
}

/// An article inside a book
///
/// `content` is opaque rich-text markup, stored and returned verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient")]
    pub book_id: RecordId,
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: String,
    #[serde(default, deserialize_with = "lenient")]
    pub views: u64,
}

/// Draft for a new article
#[derive(Debug, Clone, Default)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub author: String,
}

impl ArticleDraft {
    /// Create draft with title and content
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author: String::new(),
        }
    }

    /// With author
    #[inline]
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }
}

/// In-place edit of an article
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl ArticlePatch {
    /// Patch rewriting both title and content
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }
}

impl Record for Article {
    type Draft = ArticleDraft;

    const KIND: EntityKind = EntityKind::Article;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(
        id: RecordId,
        parent: Option<&RecordId>,
        draft: Self::Draft,
        now: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        let book_id = parent.ok_or(ModelError::MissingParent("article"))?;
        require("article", "title", &draft.title)?;
        Ok(Self {
            id,
            book_id: book_id.clone(),
            title: draft.title,
            content: draft.content,
            author: draft.author,
            updated_at: timestamp(now),
            views: 0,
        })
    }
}

impl Patchable for Article {
    type Patch = ArticlePatch;

    fn apply_patch(&mut self, patch: &Self::Patch, now: DateTime<Utc>) -> Result<bool, ModelError> {
        if let Some(title) = &patch.title {
            require("article", "title", title)?;
        }
        let mut changed = assign(&mut self.title, patch.title.as_ref());
        changed |= assign(&mut self.content, patch.content.as_ref());
        if changed {
            self.updated_at = timestamp(now);
        }
        Ok(changed)
    }
}
