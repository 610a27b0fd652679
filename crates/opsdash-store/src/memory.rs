//! In-memory store backed by `DashMap`

use crate::error::{StoreError, StoreResult};
use crate::kv::KeyValueStore;
use crate::token::VersionToken;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Concurrent in-memory key-value store
///
/// `compare_and_set` holds the entry lock across the check, so it is atomic
/// per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store pre-seeded with entries
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        for (key, value) in entries {
            store.entries.insert(key.into(), value.into());
        }
        store
    }

    /// Number of stored keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted list of stored keys
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Remove every key
    #[inline]
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn compare_and_set(&self, key: &str, expected: &VersionToken, value: &str) -> StoreResult<()> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let actual = VersionToken::of(Some(occupied.get().as_str()));
                if actual != *expected {
                    return Err(StoreError::conflict(key, *expected, actual));
                }
                occupied.insert(value.to_string());
            }
            Entry::Vacant(vacant) => {
                let actual = VersionToken::absent();
                if actual != *expected {
                    return Err(StoreError::conflict(key, *expected, actual));
                }
                vacant.insert(value.to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn get_set_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn remove_missing_is_noop() {
        let store = MemoryStore::new();
        assert!(store.remove("missing").is_ok());
    }

    #[test]
    fn with_entries_seeds_keys() {
        let store = MemoryStore::with_entries([("b", "2"), ("a", "1")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn cas_rejects_vacant_with_non_absent_token() {
        let store = MemoryStore::new();
        let token = VersionToken::of(Some("[]"));
        let err = store.compare_and_set("k", &token, "[1]").unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn cas_is_atomic_under_contention() {
        let store = Arc::new(MemoryStore::new());
        store.set("counter", "0").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        loop {
                            let (value, token) = store.get_versioned("counter").unwrap();
                            let n: u64 = value.unwrap().parse().unwrap();
                            match store.compare_and_set("counter", &token, &(n + 1).to_string()) {
                                Ok(()) => break,
                                Err(e) => assert!(e.is_conflict()),
                            }
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get("counter").unwrap().as_deref(), Some("400"));
    }
}
