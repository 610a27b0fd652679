//! Cascade synchronization of book article counters
//!
//! `Book::article_count` is a stored summary of a separate collection. The
//! synchronizer adjusts it after article writes through fenced
//! read-modify-write cycles and repairs drift with a reconciliation pass.
//!
//! A cascade that fails after the article write went through does not undo
//! that write. The counter is left stale and reported as
//! [`CascadeOutcome::Deferred`] until the next reconciliation.

use crate::error::DashResult;
use opsdash_model::{Article, Book, RecordId};
use opsdash_repo::{Mutation, RepoResult, Repository};
use serde::Serialize;

/// What happened to the parent counter after a child write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CascadeOutcome {
    /// Counter updated
    Applied { article_count: u32 },
    /// Counter left for reconciliation
    Deferred { reason: String },
}

impl CascadeOutcome {
    /// Whether the counter was updated
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// A child write together with the outcome of its cascade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cascaded<T> {
    pub record: T,
    pub cascade: CascadeOutcome,
}

/// One repaired counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterCorrection {
    pub book_id: RecordId,
    /// Counter as it was stored
    pub stored: u32,
    /// Live articles found
    pub actual: u32,
}

/// Result of reconciling one shelf
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub shelf_id: RecordId,
    pub books_checked: usize,
    pub corrections: Vec<CounterCorrection>,
}

impl ReconcileReport {
    /// Whether every counter was already correct
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty()
    }
}

/// Keeps book counters in step with article collections
#[derive(Debug, Clone)]
pub struct CascadeSynchronizer {
    books: Repository<Book>,
    articles: Repository<Article>,
}

impl CascadeSynchronizer {
    /// Create synchronizer over the given repositories
    #[inline]
    #[must_use]
    pub fn new(books: Repository<Book>, articles: Repository<Article>) -> Self {
        Self { books, articles }
    }

    /// Count one more article in `book_id`
    pub fn article_added(&self, shelf_id: &RecordId, book_id: &RecordId) -> CascadeOutcome {
        settle(shelf_id, book_id, self.adjust(shelf_id, book_id, 1))
    }

    /// Count one article fewer in `book_id`, never going below zero
    pub fn article_removed(&self, shelf_id: &RecordId, book_id: &RecordId) -> CascadeOutcome {
        settle(shelf_id, book_id, self.adjust(shelf_id, book_id, -1))
    }

    /// Apply `delta` to the stored counter of `book_id`
    ///
    /// The book collection is otherwise written back unmodified.
    ///
    /// # Errors
    /// Returns [`crate::DashError::NotFound`] if the shelf has no such book, or a
    /// conflict error once retries are exhausted
    pub fn adjust(&self, shelf_id: &RecordId, book_id: &RecordId, delta: i32) -> DashResult<u32> {
        let book = self.books.modify_record(Some(shelf_id), book_id, |book| {
            let before = book.article_count;
            book.article_count = before.saturating_add_signed(delta);
            Ok(book.article_count != before)
        })?;
        tracing::debug!("Book {} article count now {}", book_id, book.article_count);
        Ok(book.article_count)
    }

    /// Stored and live counts for every book of the shelf that disagree
    ///
    /// # Errors
    /// Returns error if a collection cannot be read
    pub fn drift(&self, shelf_id: &RecordId) -> DashResult<Vec<CounterCorrection>> {
        let books = self.books.list(Some(shelf_id))?;
        let mut drifted = Vec::new();
        for book in &books {
            let actual = self.live_count(&book.id)?;
            if book.article_count != actual {
                drifted.push(CounterCorrection {
                    book_id: book.id.clone(),
                    stored: book.article_count,
                    actual,
                });
            }
        }
        Ok(drifted)
    }

    /// Recount articles for every book of the shelf and rewrite drifted counters
    ///
    /// All corrections land in one fenced write of the book collection. The
    /// recount happens inside that write, so a retry after a concurrent
    /// article write counts again instead of reusing a stale total.
    ///
    /// # Errors
    /// Returns error if a collection cannot be read or the write keeps
    /// conflicting
    pub fn reconcile_shelf(&self, shelf_id: &RecordId) -> DashResult<ReconcileReport> {
        let key = self.books.key(Some(shelf_id))?;
        let (books_checked, corrections) = self.books.collections().modify(&key, |books: &mut Vec<Book>| {
            let mut corrections = Vec::new();
            for book in books.iter_mut() {
                let actual = self.live_count(&book.id)?;
                if book.article_count != actual {
                    corrections.push(CounterCorrection {
                        book_id: book.id.clone(),
                        stored: book.article_count,
                        actual,
                    });
                    book.article_count = actual;
                }
            }
            let checked = books.len();
            Ok(if corrections.is_empty() {
                Mutation::Skip((checked, corrections))
            } else {
                Mutation::Write((checked, corrections))
            })
        })?;

        for c in &corrections {
            tracing::info!(
                "Reconciled book {} in shelf {}: stored {} -> actual {}",
                c.book_id,
                shelf_id,
                c.stored,
                c.actual
            );
        }

        Ok(ReconcileReport {
            shelf_id: shelf_id.clone(),
            books_checked,
            corrections,
        })
    }

    fn live_count(&self, book_id: &RecordId) -> RepoResult<u32> {
        let count = self.articles.list(Some(book_id))?.len();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

fn settle(shelf_id: &RecordId, book_id: &RecordId, result: DashResult<u32>) -> CascadeOutcome {
    match result {
        Ok(article_count) => CascadeOutcome::Applied { article_count },
        Err(e) => {
            tracing::error!(
                "Article counter of book {} in shelf {} not updated, deferring to reconciliation: {}",
                book_id,
                shelf_id,
                e
            );
            CascadeOutcome::Deferred {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdash_model::{ArticleDraft, BookDraft};
    use opsdash_repo::Collections;
    use opsdash_store::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn setup() -> (Repository<Book>, Repository<Article>, CascadeSynchronizer) {
        let collections = Collections::new(Arc::new(MemoryStore::new()));
        let books = Repository::new(collections.clone());
        let articles = Repository::new(collections);
        let cascade = CascadeSynchronizer::new(books.clone(), articles.clone());
        (books, articles, cascade)
    }

    fn seed_book(books: &Repository<Book>, shelf: &RecordId) -> Book {
        books
            .create(
                Some(shelf),
                BookDraft {
                    title: "Billing".into(),
                    ..BookDraft::default()
                },
            )
            .unwrap()
    }

    #[test]
    fn added_then_removed() {
        let (books, _, cascade) = setup();
        let shelf = RecordId::new("s1");
        let book = seed_book(&books, &shelf);

        assert_eq!(
            cascade.article_added(&shelf, &book.id),
            CascadeOutcome::Applied { article_count: 1 }
        );
        assert_eq!(
            cascade.article_removed(&shelf, &book.id),
            CascadeOutcome::Applied { article_count: 0 }
        );
        assert_eq!(
            cascade.article_removed(&shelf, &book.id),
            CascadeOutcome::Applied { article_count: 0 }
        );
    }

    #[test]
    fn missing_book_defers() {
        let (_, _, cascade) = setup();
        let outcome = cascade.article_added(&RecordId::new("s1"), &RecordId::new("ghost"));
        assert!(!outcome.is_applied());
    }

    #[test]
    fn adjust_leaves_sibling_books_untouched() {
        let (books, _, cascade) = setup();
        let shelf = RecordId::new("s1");
        let a = seed_book(&books, &shelf);
        let b = seed_book(&books, &shelf);

        cascade.adjust(&shelf, &b.id, 3).unwrap();

        let listed = books.list(Some(&shelf)).unwrap();
        assert_eq!(listed[0], a);
        assert_eq!(listed[1].article_count, 3);
    }

    #[test]
    fn reconcile_repairs_only_drifted_books() {
        let (books, articles, cascade) = setup();
        let shelf = RecordId::new("s1");
        let a = seed_book(&books, &shelf);
        let b = seed_book(&books, &shelf);

        articles.create(Some(&a.id), ArticleDraft::new("One", "")).unwrap();
        articles.create(Some(&a.id), ArticleDraft::new("Two", "")).unwrap();
        cascade.adjust(&shelf, &b.id, 5).unwrap();

        assert_eq!(cascade.drift(&shelf).unwrap().len(), 2);

        let report = cascade.reconcile_shelf(&shelf).unwrap();
        assert_eq!(report.books_checked, 2);
        assert_eq!(
            report.corrections,
            vec![
                CounterCorrection {
                    book_id: a.id.clone(),
                    stored: 0,
                    actual: 2
                },
                CounterCorrection {
                    book_id: b.id.clone(),
                    stored: 5,
                    actual: 0
                },
            ]
        );

        assert!(cascade.drift(&shelf).unwrap().is_empty());
        assert!(cascade.reconcile_shelf(&shelf).unwrap().is_clean());
    }
}
