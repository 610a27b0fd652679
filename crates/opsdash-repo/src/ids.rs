//! Record id generation
//!
//! Replaces wall-clock ids (unique only for one writer creating one record
//! per millisecond) with collision-resistant identifiers.

use opsdash_model::RecordId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};
use ulid::{Generator, Ulid};
use uuid::Uuid;

/// Id generation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Monotonic ULIDs; sortable by creation within the process
    #[default]
    Ulid,
    /// Random v4 UUIDs
    Uuid,
}

/// Thread-safe id generator
pub struct IdGenerator {
    strategy: IdStrategy,
    monotonic: Mutex<Generator>,
}

impl Debug for IdGenerator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl IdGenerator {
    /// Create generator for a strategy
    #[inline]
    #[must_use]
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            monotonic: Mutex::new(Generator::new()),
        }
    }

    /// Strategy in use
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// Next id
    #[must_use]
    pub fn next_id(&self) -> RecordId {
        match self.strategy {
            IdStrategy::Ulid => {
                // Random part overflow within one millisecond; fall back to a fresh ULID
                let ulid = self.monotonic.lock().generate().unwrap_or_else(|_| Ulid::new());
                RecordId::new(ulid.to_string())
            }
            IdStrategy::Uuid => RecordId::new(Uuid::new_v4().to_string()),
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(IdStrategy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ulids_are_unique_and_ordered() {
        let ids = IdGenerator::new(IdStrategy::Ulid);
        let generated: Vec<_> = (0..1_000).map(|_| ids.next_id()).collect();

        let unique: HashSet<_> = generated.iter().collect();
        assert_eq!(unique.len(), generated.len());

        let mut sorted = generated.clone();
        sorted.sort();
        assert_eq!(sorted, generated);
    }

    #[test]
    fn uuid_strategy_produces_uuids() {
        let ids = IdGenerator::new(IdStrategy::Uuid);
        let id = ids.next_id();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn debug_shows_strategy() {
        let ids = IdGenerator::new(IdStrategy::Uuid);
        assert_eq!(format!("{ids:?}"), "IdGenerator { strategy: Uuid, .. }");
    }

    #[test]
    fn strategy_deserializes_lowercase() {
        let strategy: IdStrategy = serde_json::from_str("\"uuid\"").unwrap();
        assert_eq!(strategy, IdStrategy::Uuid);
    }
}
