//! Schema registry for versioned collections
//!
//! Maps (entity kind, version) to the upgrade step that turns one stored
//! record of that version into the next version's shape.

use crate::error::{RepoError, RepoResult};
use opsdash_model::EntityKind;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};

/// Upgrade step for a single stored record (`v` → `v + 1`)
pub type UpgradeFn = Box<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Registry of current schema versions and upgrade steps
pub struct SchemaRegistry {
    current: HashMap<EntityKind, u32>,
    upgrades: HashMap<(EntityKind, u32), UpgradeFn>,
}

impl SchemaRegistry {
    /// Create registry where every kind is at version 1
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: HashMap::new(),
            upgrades: HashMap::new(),
        }
    }

    /// Create registry with the built-in knowledge base migrations
    ///
    /// # Versions
    /// - `book` v1 → v2: legacy `count` becomes `articleCount`
    /// - `article` v1 → v2: legacy `date` becomes `updatedAt`, `views` defaults to 0
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_upgrade(EntityKind::Book, 1, |record| {
            let mut obj = into_object(record)?;
            let count = obj.remove("count").unwrap_or(Value::from(0));
            obj.entry("articleCount").or_insert(count);
            Ok(Value::Object(obj))
        });
        registry.register_upgrade(EntityKind::Article, 1, |record| {
            let mut obj = into_object(record)?;
            if let Some(date) = obj.remove("date") {
                obj.entry("updatedAt").or_insert(date);
            }
            obj.entry("views").or_insert(Value::from(0));
            Ok(Value::Object(obj))
        });
        registry
    }

    /// Register the upgrade from `from` to `from + 1`
    ///
    /// The kind's current version becomes at least `from + 1`.
    pub fn register_upgrade<F>(&mut self, kind: EntityKind, from: u32, upgrade: F)
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.upgrades.insert((kind, from), Box::new(upgrade));
        let current = self.current.entry(kind).or_insert(1);
        *current = (*current).max(from + 1);
    }

    /// Current schema version of a kind
    #[inline]
    #[must_use]
    pub fn current_version(&self, kind: EntityKind) -> u32 {
        self.current.get(&kind).copied().unwrap_or(1)
    }

    /// Check if an upgrade step is registered
    #[inline]
    #[must_use]
    pub fn has_upgrade(&self, kind: EntityKind, from: u32) -> bool {
        self.upgrades.contains_key(&(kind, from))
    }

    /// Upgrade records stored at version `from` to the current version
    ///
    /// # Errors
    /// Returns error if a step is missing or a record cannot be upgraded
    pub fn upgrade(&self, kind: EntityKind, from: u32, records: Vec<Value>) -> RepoResult<Vec<Value>> {
        let target = self.current_version(kind);
        (from..target).try_fold(records, |records, version| {
            let step = self
                .upgrades
                .get(&(kind, version))
                .ok_or_else(|| RepoError::migration(kind, version, "no upgrade step registered"))?;
            records
                .into_iter()
                .map(|record| step(record).map_err(|reason| RepoError::migration(kind, version, reason)))
                .collect()
        })
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Debug for SchemaRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut steps: Vec<_> = self.upgrades.keys().collect();
        steps.sort();
        f.debug_struct("SchemaRegistry")
            .field("current", &self.current)
            .field("upgrades", &steps)
            .finish()
    }
}

fn into_object(record: Value) -> Result<Map<String, Value>, String> {
    match record {
        Value::Object(obj) => Ok(obj),
        other => Err(format!("expected object record, found {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_put_knowledge_kinds_at_v2() {
        let registry = SchemaRegistry::with_defaults();
        assert_eq!(registry.current_version(EntityKind::Book), 2);
        assert_eq!(registry.current_version(EntityKind::Article), 2);
        assert_eq!(registry.current_version(EntityKind::KpiReport), 1);
        assert!(registry.has_upgrade(EntityKind::Book, 1));
    }

    #[test]
    fn book_upgrade_moves_count() {
        let registry = SchemaRegistry::with_defaults();
        let upgraded = registry
            .upgrade(EntityKind::Book, 1, vec![json!({"id": "b", "title": "t", "count": 3})])
            .unwrap();
        assert_eq!(upgraded, vec![json!({"id": "b", "title": "t", "articleCount": 3})]);
    }

    #[test]
    fn article_upgrade_renames_date() {
        let registry = SchemaRegistry::with_defaults();
        let upgraded = registry
            .upgrade(EntityKind::Article, 1, vec![json!({"id": "a", "date": "2024-01-01"})])
            .unwrap();
        assert_eq!(upgraded[0]["updatedAt"], "2024-01-01");
        assert_eq!(upgraded[0]["views"], 0);
        assert!(upgraded[0].get("date").is_none());
    }

    #[test]
    fn upgrade_chains_steps() {
        let mut registry = SchemaRegistry::new();
        registry.register_upgrade(EntityKind::Book, 1, |mut v| {
            v["step1"] = json!(true);
            Ok(v)
        });
        registry.register_upgrade(EntityKind::Book, 2, |mut v| {
            v["step2"] = json!(true);
            Ok(v)
        });
        assert_eq!(registry.current_version(EntityKind::Book), 3);

        let out = registry.upgrade(EntityKind::Book, 1, vec![json!({})]).unwrap();
        assert_eq!(out, vec![json!({"step1": true, "step2": true})]);
    }

    #[test]
    fn upgrade_rejects_non_object() {
        let registry = SchemaRegistry::with_defaults();
        let err = registry.upgrade(EntityKind::Book, 1, vec![json!(42)]).unwrap_err();
        assert!(matches!(err, RepoError::Migration { from: 1, .. }));
    }

    #[test]
    fn missing_step_is_reported() {
        let mut registry = SchemaRegistry::new();
        registry.register_upgrade(EntityKind::Article, 2, Ok);
        let err = registry.upgrade(EntityKind::Article, 1, vec![json!({})]).unwrap_err();
        assert!(err.to_string().contains("no upgrade step registered"));
    }
}
