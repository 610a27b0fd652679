//! File-backed store
//!
//! Holds every key in one JSON object file, the way a browser profile keeps
//! its local storage. The whole file is rewritten on each mutation through a
//! temp file and rename.

use crate::error::{StoreError, StoreResult};
use crate::kv::KeyValueStore;
use crate::token::VersionToken;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Persistent key-value store in a single JSON file
///
/// Mutations are serialized by an in-process lock. Other processes writing
/// the same file are not coordinated.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`
    ///
    /// A missing file is an empty store; the file is created on first write.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a JSON object of
    /// strings
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| {
                StoreError::CorruptBackingFile {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::io_error(path, e)),
        };

        tracing::debug!("Opened file store {} with {} keys", path.display(), entries.len());

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sorted list of stored keys
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Write the whole map to disk
    fn persist(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io_error(parent, e))?;
            }
        }

        let encoded = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded).map_err(|e| StoreError::io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io_error(&self.path, e))?;
        Ok(())
    }

    /// Apply a mutation and persist it, rolling back the map on failure
    fn mutate<F>(&self, key: &str, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> StoreResult<()>,
    {
        let mut guard = self.entries.write();
        let previous = guard.get(key).cloned();
        f(&mut *guard)?;

        if let Err(e) = self.persist(&*guard) {
            match previous {
                Some(value) => guard.insert(key.to_string(), value),
                None => guard.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.mutate(key, |entries| {
            entries.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        if !self.entries.read().contains_key(key) {
            return Ok(());
        }
        self.mutate(key, |entries| {
            entries.remove(key);
            Ok(())
        })
    }

    fn compare_and_set(&self, key: &str, expected: &VersionToken, value: &str) -> StoreResult<()> {
        self.mutate(key, |entries| {
            let actual = VersionToken::of(entries.get(key).map(String::as_str));
            if actual != *expected {
                return Err(StoreError::conflict(key, *expected, actual));
            }
            entries.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }
}
