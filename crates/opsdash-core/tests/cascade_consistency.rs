use opsdash_core::{CascadeOutcome, DashConfig, KnowledgeBase};
use opsdash_model::{ArticleDraft, ArticlePatch, Book, RecordId};
use opsdash_repo::{CollectionKey, Collections, Mutation};
use opsdash_store::{FileStore, KeyValueStore, MemoryStore, StoreResult, VersionToken};
use opsdash_test_utils::Fixture;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::fmt;
use std::sync::{Arc, Mutex};

fn books_key(f: &Fixture) -> CollectionKey {
    CollectionKey::books(&f.shelf_id(), 2)
}

type Hook = Box<dyn FnOnce() + Send>;

/// Store that runs a one-shot hook just before the first fenced write to `key`
struct InterleavingStore {
    inner: Arc<MemoryStore>,
    key: String,
    hook: Mutex<Option<Hook>>,
}

impl InterleavingStore {
    fn new(inner: Arc<MemoryStore>, key: &CollectionKey, hook: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner,
            key: key.render(),
            hook: Mutex::new(Some(Box::new(hook))),
        }
    }
}

impl fmt::Debug for InterleavingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterleavingStore").field("key", &self.key).finish_non_exhaustive()
    }
}

impl KeyValueStore for InterleavingStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key)
    }

    fn compare_and_set(&self, key: &str, expected: &VersionToken, value: &str) -> StoreResult<()> {
        if key == self.key {
            let hook = self.hook.lock().unwrap().take();
            if let Some(hook) = hook {
                hook();
            }
        }
        self.inner.compare_and_set(key, expected, value)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_n_articles_raise_counter_by_n(n in 0u32..12) {
        let f = Fixture::default();
        let book = f.seed();

        for i in 0..n {
            let created = f
                .kb
                .create_article(&f.shelf_id(), &book.id, ArticleDraft::new(format!("Article {i}"), "<p>x</p>"))
                .unwrap();
            prop_assert!(created.cascade.is_applied());
        }

        let after = f.kb.book(&f.shelf_id(), &book.id).unwrap();
        prop_assert_eq!(after.article_count, book.article_count + n);
        prop_assert_eq!(f.kb.list_articles(&book.id).unwrap().len() as u32, n);
    }
}

#[test]
fn unfenced_writers_lose_an_update() {
    let f = Fixture::default();
    let book = f.seed();
    let collections = Collections::new(f.store.clone());
    let key = books_key(&f);

    // Both writers read before either writes
    let mut first = collections.read::<Book>(&key).unwrap().records;
    let mut second = collections.read::<Book>(&key).unwrap().records;
    first[0].article_count += 1;
    second[0].article_count += 1;
    collections.overwrite(&key, &first).unwrap();
    collections.overwrite(&key, &second).unwrap();

    let stored = f.kb.book(&f.shelf_id(), &book.id).unwrap();
    assert_eq!(stored.article_count, book.article_count + 1);
}

#[test]
fn fenced_writers_keep_both_updates() {
    let f = Fixture::default();
    let book = f.seed();
    let collections = Collections::new(f.store.clone());
    let key = books_key(&f);

    let mut interleaved = false;
    collections
        .modify::<Book, _, _>(&key, |books| {
            if !interleaved {
                interleaved = true;
                // Second writer completes between our read and our write
                collections
                    .modify::<Book, _, _>(&key, |books| {
                        books[0].article_count += 1;
                        Ok(Mutation::Write(()))
                    })
                    .unwrap();
            }
            books[0].article_count += 1;
            Ok(Mutation::Write(()))
        })
        .unwrap();

    let stored = f.kb.book(&f.shelf_id(), &book.id).unwrap();
    assert_eq!(stored.article_count, book.article_count + 2);
}

#[test]
fn stale_commit_is_rejected() {
    let f = Fixture::default();
    f.seed();
    let collections = Collections::new(f.store.clone());
    let key = books_key(&f);

    let snapshot = collections.read::<Book>(&key).unwrap();
    let mut newer = snapshot.records.clone();
    newer[0].article_count += 1;
    collections.overwrite(&key, &newer).unwrap();

    let err = collections
        .commit(&key, &snapshot.token, &snapshot.records)
        .unwrap_err();
    assert!(matches!(
        err,
        opsdash_repo::RepoError::Store(opsdash_store::StoreError::VersionConflict { .. })
    ));
}

#[test]
fn delete_decrements_and_reconcile_repairs_drift() {
    let f = Fixture::default();
    let book = f.seed();
    let shelf = f.shelf_id();

    let a = f.kb.create_article(&shelf, &book.id, ArticleDraft::new("A", "")).unwrap().record;
    f.kb.create_article(&shelf, &book.id, ArticleDraft::new("B", "")).unwrap();

    let deleted = f.kb.delete_article(&shelf, &book.id, &a.id).unwrap();
    assert_eq!(deleted.record.id, a.id);
    assert_eq!(deleted.cascade, CascadeOutcome::Applied { article_count: 1 });
    assert!(f.kb.article(&book.id, &a.id).unwrap_err().is_not_found());

    // Simulate a counter written by an older client
    f.kb.cascade().adjust(&shelf, &book.id, 6).unwrap();
    assert_eq!(f.kb.list_books(&shelf).unwrap()[0].article_count, 7);

    let report = f.kb.reconcile_shelf(&shelf).unwrap();
    assert_eq!(report.corrections.len(), 1);
    assert_eq!(report.corrections[0].stored, 7);
    assert_eq!(report.corrections[0].actual, 1);
    assert_eq!(f.kb.book(&shelf, &book.id).unwrap().article_count, 1);
}

#[test]
fn reconcile_recounts_after_concurrent_article_write() {
    let f = Fixture::default();
    let book = f.seed();
    let shelf = f.shelf_id();
    f.kb.cascade().adjust(&shelf, &book.id, 6).unwrap();

    // An article lands between the recount and the counter write
    let writer = f.clone();
    let (writer_shelf, writer_book) = (shelf.clone(), book.id.clone());
    let store = InterleavingStore::new(f.store.clone(), &books_key(&f), move || {
        let created = writer
            .kb
            .create_article(&writer_shelf, &writer_book, ArticleDraft::new("Late", ""))
            .unwrap();
        assert!(created.cascade.is_applied());
    });
    let reconciler = KnowledgeBase::new(Arc::new(store), &f.config);

    let report = reconciler.reconcile_shelf(&shelf).unwrap();
    assert_eq!(report.corrections.len(), 1);
    assert_eq!(report.corrections[0].stored, 7);
    assert_eq!(report.corrections[0].actual, 1);

    let stored = f.kb.book(&shelf, &book.id).unwrap().article_count;
    let live = f.kb.list_articles(&book.id).unwrap().len() as u32;
    assert_eq!((stored, live), (1, 1));
}

#[test]
fn null_fields_do_not_hide_siblings() {
    let f = Fixture::default();
    let shelf = f.shelf_id();
    f.store
        .set(
            &books_key(&f).render(),
            r#"[{"id":"b1","shelfId":"shelf-support","title":"Billing","articleCount":null}]"#,
        )
        .unwrap();
    f.store
        .set(
            "knowledge_articles_book_b1_v2",
            r#"[{"id":"a1","bookId":"b1","title":"Old","views":null},{"id":"a2","bookId":"b1","title":"Older","views":3}]"#,
        )
        .unwrap();

    let book = RecordId::new("b1");
    assert_eq!(f.kb.list_books(&shelf).unwrap()[0].article_count, 0);
    assert_eq!(f.kb.list_articles(&book).unwrap().len(), 2);

    let created = f.kb.create_article(&shelf, &book, ArticleDraft::new("New", "")).unwrap();
    assert_eq!(created.cascade, CascadeOutcome::Applied { article_count: 1 });

    let titles: Vec<_> = f
        .kb
        .list_articles(&book)
        .unwrap()
        .into_iter()
        .map(|a| a.title)
        .collect();
    assert_eq!(titles, vec!["Old", "Older", "New"]);
}

#[test]
fn undecodable_article_blocks_rewrite() {
    let f = Fixture::default();
    let book = f.seed();
    let shelf = f.shelf_id();
    let key = CollectionKey::articles(&book.id, 2).render();
    let raw = r#"[{"id":"a1","title":"Kept"},{"id":"a2","views":"many"}]"#;
    f.store.set(&key, raw).unwrap();

    assert_eq!(f.kb.list_articles(&book.id).unwrap().len(), 1);

    let err = f
        .kb
        .create_article(&shelf, &book.id, ArticleDraft::new("New", ""))
        .unwrap_err();
    assert!(err.is_unreadable());
    assert_eq!(f.store.get(&key).unwrap().as_deref(), Some(raw));
    assert_eq!(f.kb.book(&shelf, &book.id).unwrap().article_count, book.article_count);
}

#[test]
fn delete_through_wrong_shelf_is_not_found() {
    let f = Fixture::default();
    let book = f.seed();
    let shelf = f.shelf_id();
    let article = f
        .kb
        .create_article(&shelf, &book.id, ArticleDraft::new("T", ""))
        .unwrap()
        .record;

    let err = f
        .kb
        .delete_article(&RecordId::new("other-shelf"), &book.id, &article.id)
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(f.kb.list_articles(&book.id).unwrap().len(), 1);
    assert_eq!(f.kb.book(&shelf, &book.id).unwrap().article_count, 1);
}

#[test]
fn reconcile_on_read_repairs_before_listing() {
    let f = Fixture::with_config(DashConfig::default().with_reconcile_on_read(true));
    let book = f.seed();
    let shelf = f.shelf_id();

    f.kb.cascade().adjust(&shelf, &book.id, 4).unwrap();
    let listed = f.kb.list_books(&shelf).unwrap();
    assert_eq!(listed[0].article_count, 0);
}

#[test]
fn corrupt_book_collection_blocks_article_creation() {
    let f = Fixture::default();
    let book = f.seed();
    let shelf = f.shelf_id();

    f.store.set(&books_key(&f).render(), "not json at all").unwrap();
    assert!(f.kb.list_books(&shelf).unwrap().is_empty());

    // The book is gone from the readable collection, so creation is refused
    let err = f
        .kb
        .create_article(&shelf, &book.id, ArticleDraft::new("T", ""))
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(f.kb.list_articles(&book.id).unwrap().is_empty());
}

#[test]
fn deleting_from_unreadable_books_is_refused() {
    let f = Fixture::default();
    let book = f.seed();
    let shelf = f.shelf_id();
    let article = f
        .kb
        .create_article(&shelf, &book.id, ArticleDraft::new("T", ""))
        .unwrap()
        .record;

    f.store.set(&books_key(&f).render(), "{").unwrap();
    let err = f.kb.delete_article(&shelf, &book.id, &article.id).unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(f.kb.list_articles(&book.id).unwrap(), vec![article]);
}

#[test]
fn book_vanishing_after_delete_defers_counter() {
    let f = Fixture::default();
    let book = f.seed();
    let shelf = f.shelf_id();
    let article = f
        .kb
        .create_article(&shelf, &book.id, ArticleDraft::new("T", ""))
        .unwrap()
        .record;

    // Book collection is clobbered right before the counter write
    let key = books_key(&f);
    let clobber = f.store.clone();
    let rendered = key.render();
    let store = InterleavingStore::new(f.store.clone(), &CollectionKey::articles(&book.id, 2), move || {
        clobber.set(&rendered, "{").unwrap();
    });
    let kb = KnowledgeBase::new(Arc::new(store), &f.config);

    let deleted = kb.delete_article(&shelf, &book.id, &article.id).unwrap();
    assert!(matches!(deleted.cascade, CascadeOutcome::Deferred { .. }));
    assert!(f.kb.list_articles(&book.id).unwrap().is_empty());
}

#[test]
fn legacy_numeric_ids_resolve() {
    let f = Fixture::default();
    f.store
        .set(
            "knowledge_books_shelf_7_v2",
            r#"[{"id":1712000000000,"shelfId":7,"title":"Legacy","articleCount":0}]"#,
        )
        .unwrap();

    let shelf = RecordId::from(7u64);
    let book = RecordId::new("1712000000000");
    let created = f
        .kb
        .create_article(&shelf, &book, ArticleDraft::new("Imported", ""))
        .unwrap();
    assert!(created.cascade.is_applied());
    assert_eq!(f.kb.book(&shelf, &book).unwrap().article_count, 1);
}

#[test]
fn update_article_is_idempotent() {
    let f = Fixture::default();
    let book = f.seed();
    let shelf = f.shelf_id();
    let article = f
        .kb
        .create_article(&shelf, &book.id, ArticleDraft::new("T", "<p>a</p>"))
        .unwrap()
        .record;

    let patch = ArticlePatch::new("T2", "<p>b</p>");
    let once = f.kb.update_article(&book.id, &article.id, &patch).unwrap();
    f.clock.advance(chrono::Duration::minutes(5));
    let twice = f.kb.update_article(&book.id, &article.id, &patch).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("opsdash.json");
    let config = DashConfig::default().with_data_path(&path);

    let book_id = {
        let kb = KnowledgeBase::new(Arc::new(FileStore::open(&path).unwrap()), &config);
        let book = kb
            .seed_book(
                &RecordId::new("s1"),
                opsdash_model::BookDraft {
                    title: "Billing".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        kb.create_article(&RecordId::new("s1"), &book.id, ArticleDraft::new("T", "")).unwrap();
        book.id
    };

    let kb = KnowledgeBase::new(Arc::new(FileStore::open(&path).unwrap()), &config);
    assert_eq!(kb.book(&RecordId::new("s1"), &book_id).unwrap().article_count, 1);
    assert_eq!(kb.list_articles(&book_id).unwrap().len(), 1);
}
