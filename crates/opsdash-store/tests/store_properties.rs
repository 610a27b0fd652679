use opsdash_store::{FileStore, KeyValueStore, MemoryStore, VersionToken};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_set_then_get_returns_value(key in "[a-z_]{1,24}", value in ".{0,64}") {
        let store = MemoryStore::new();
        store.set(&key, &value).unwrap();
        prop_assert_eq!(store.get(&key).unwrap(), Some(value.clone()));

        let (_, token) = store.get_versioned(&key).unwrap();
        prop_assert_eq!(token, VersionToken::of(Some(value.as_str())));
    }

    #[test]
    fn prop_fresh_token_always_commits(initial in ".{0,32}", next in ".{0,32}") {
        let store = MemoryStore::new();
        store.set("k", &initial).unwrap();

        let (_, token) = store.get_versioned("k").unwrap();
        prop_assert!(store.compare_and_set("k", &token, &next).is_ok());
        prop_assert_eq!(store.get("k").unwrap(), Some(next));
    }
}

#[test]
fn file_store_round_trips_unicode_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = FileStore::open(&path).unwrap();
    store.set("knowledge_articles_book_1_v2", "[{\"title\":\"تقرير\"}]").unwrap();
    drop(store);

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(
        reopened.get("knowledge_articles_book_1_v2").unwrap().as_deref(),
        Some("[{\"title\":\"تقرير\"}]")
    );
}
