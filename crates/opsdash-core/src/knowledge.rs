//! Knowledge base service: shelves, books and articles
//!
//! Wraps the three repositories and runs the counter cascade after every
//! article create and delete.

use crate::cascade::{CascadeSynchronizer, Cascaded, ReconcileReport};
use crate::config::DashConfig;
use crate::error::{DashError, DashResult};
use opsdash_model::{
    Article, ArticleDraft, ArticlePatch, Book, BookDraft, BookPatch, EntityKind, RecordId, Shelf,
};
use opsdash_repo::{Clock, Collections, IdGenerator, Repository, SystemClock};
use opsdash_store::KeyValueStore;
use std::sync::Arc;

/// Shelves, books and articles over one store
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    shelves: Repository<Shelf>,
    books: Repository<Book>,
    articles: Repository<Article>,
    cascade: CascadeSynchronizer,
    reconcile_on_read: bool,
    default_author: String,
}

impl KnowledgeBase {
    /// Create with the system clock
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: &DashConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create with an explicit clock
    #[must_use]
    pub fn with_clock(store: Arc<dyn KeyValueStore>, config: &DashConfig, clock: Arc<dyn Clock>) -> Self {
        let collections = Collections::new(store).with_max_retries(config.max_write_retries);
        let ids = Arc::new(IdGenerator::new(config.id_strategy));

        let shelves = Repository::with_parts(collections.clone(), Arc::clone(&ids), Arc::clone(&clock));
        let books = Repository::with_parts(collections.clone(), Arc::clone(&ids), Arc::clone(&clock));
        let articles = Repository::with_parts(collections, ids, clock);
        let cascade = CascadeSynchronizer::new(books.clone(), articles.clone());

        Self {
            shelves,
            books,
            articles,
            cascade,
            reconcile_on_read: config.reconcile_on_read,
            default_author: config.default_author.clone(),
        }
    }

    /// Counter synchronizer used by this service
    #[inline]
    #[must_use]
    pub fn cascade(&self) -> &CascadeSynchronizer {
        &self.cascade
    }

    /// All shelves in stored order
    ///
    /// # Errors
    /// Returns error if the store fails
    pub fn shelves(&self) -> DashResult<Vec<Shelf>> {
        Ok(self.shelves.list(None)?)
    }

    /// Shelf with `id`
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if no shelf has `id`
    pub fn shelf(&self, id: &RecordId) -> DashResult<Shelf> {
        self.shelves
            .get(None, id)?
            .ok_or_else(|| DashError::not_found(EntityKind::Shelf, id.clone()))
    }

    /// Replace the shelf collection
    ///
    /// Shelves are provisioned from outside; this is the hook for doing so.
    ///
    /// # Errors
    /// Returns error if the write fails
    pub fn seed_shelves(&self, shelves: &[Shelf]) -> DashResult<()> {
        self.shelves.replace_all(None, shelves)?;
        tracing::info!("Seeded {} shelves", shelves.len());
        Ok(())
    }

    /// Books of a shelf
    ///
    /// With `reconcile_on_read` enabled, drifted counters are repaired before
    /// the books are returned.
    ///
    /// # Errors
    /// Returns error if the store fails
    pub fn list_books(&self, shelf_id: &RecordId) -> DashResult<Vec<Book>> {
        if self.reconcile_on_read && !self.cascade.drift(shelf_id)?.is_empty() {
            self.cascade.reconcile_shelf(shelf_id)?;
        }
        Ok(self.books.list(Some(shelf_id))?)
    }

    /// Book of a shelf
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if the shelf has no such book
    pub fn book(&self, shelf_id: &RecordId, book_id: &RecordId) -> DashResult<Book> {
        self.books
            .get(Some(shelf_id), book_id)?
            .ok_or_else(|| DashError::not_found(EntityKind::Book, book_id.clone()))
    }

    /// Add a book to a shelf's namespace
    ///
    /// # Errors
    /// Returns error if the draft is invalid or the write fails
    pub fn seed_book(&self, shelf_id: &RecordId, draft: BookDraft) -> DashResult<Book> {
        Ok(self.books.create(Some(shelf_id), draft)?)
    }

    /// Edit title, details or cover of a book
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if the shelf has no such book
    pub fn update_book(&self, shelf_id: &RecordId, book_id: &RecordId, patch: &BookPatch) -> DashResult<Book> {
        Ok(self.books.update(Some(shelf_id), book_id, patch)?)
    }

    /// Articles of a book
    ///
    /// # Errors
    /// Returns error if the store fails
    pub fn list_articles(&self, book_id: &RecordId) -> DashResult<Vec<Article>> {
        Ok(self.articles.list(Some(book_id))?)
    }

    /// Article of a book
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if the book has no such article
    pub fn article(&self, book_id: &RecordId, article_id: &RecordId) -> DashResult<Article> {
        self.articles
            .get(Some(book_id), article_id)?
            .ok_or_else(|| DashError::not_found(EntityKind::Article, article_id.clone()))
    }

    /// Append an article to a book and count it on the book
    ///
    /// The book must exist in the shelf; otherwise nothing is written. An
    /// empty author is replaced by the configured default.
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] for an unknown book, a validation
    /// error for an invalid draft, or the article write's error. A failing
    /// counter update is not an error; see [`crate::cascade::CascadeOutcome`].
    pub fn create_article(
        &self,
        shelf_id: &RecordId,
        book_id: &RecordId,
        mut draft: ArticleDraft,
    ) -> DashResult<Cascaded<Article>> {
        self.book(shelf_id, book_id)?;
        if draft.author.is_empty() {
            draft.author.clone_from(&self.default_author);
        }

        let article = self.articles.create(Some(book_id), draft)?;
        let cascade = self.cascade.article_added(shelf_id, book_id);
        Ok(Cascaded {
            record: article,
            cascade,
        })
    }

    /// Rewrite title and content of an article
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if the book has no such article
    pub fn update_article(
        &self,
        book_id: &RecordId,
        article_id: &RecordId,
        patch: &ArticlePatch,
    ) -> DashResult<Article> {
        Ok(self.articles.update(Some(book_id), article_id, patch)?)
    }

    /// Count one view of an article
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if the book has no such article
    pub fn record_view(&self, book_id: &RecordId, article_id: &RecordId) -> DashResult<Article> {
        Ok(self.articles.modify_record(Some(book_id), article_id, |article| {
            article.views = article.views.saturating_add(1);
            Ok(true)
        })?)
    }

    /// Remove an article and uncount it on the book
    ///
    /// The book must exist in the shelf; otherwise nothing is removed.
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if the shelf has no such book or the
    /// book has no such article
    pub fn delete_article(
        &self,
        shelf_id: &RecordId,
        book_id: &RecordId,
        article_id: &RecordId,
    ) -> DashResult<Cascaded<Article>> {
        self.book(shelf_id, book_id)?;
        let article = self.articles.delete(Some(book_id), article_id)?;
        let cascade = self.cascade.article_removed(shelf_id, book_id);
        Ok(Cascaded {
            record: article,
            cascade,
        })
    }

    /// Recount every book of a shelf
    ///
    /// # Errors
    /// Returns error if a collection cannot be read or written
    pub fn reconcile_shelf(&self, shelf_id: &RecordId) -> DashResult<ReconcileReport> {
        self.cascade.reconcile_shelf(shelf_id)
    }
}
