//! Testing utilities for the opsdash workspace
//!
//! Shared fixtures: memory-backed services on a frozen clock, a seeded
//! shelf and book, and sample quality records.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use chrono::{TimeZone, Utc};
use opsdash_core::{DashConfig, KnowledgeBase, ReportDesk};
use opsdash_model::{Book, BookDraft, QualityDraft, RecordId, Shelf};
use opsdash_repo::FixedClock;
use opsdash_store::MemoryStore;
use std::sync::Arc;

/// Id of the seeded shelf
pub const SHELF_ID: &str = "shelf-support";

/// Services sharing one in-memory store and clock
#[derive(Debug, Clone)]
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub config: DashConfig,
    pub kb: KnowledgeBase,
    pub desk: ReportDesk,
}

impl Fixture {
    /// Fixture with the given configuration
    pub fn with_config(config: DashConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        ));
        let kb = KnowledgeBase::with_clock(store.clone(), &config, clock.clone());
        let desk = ReportDesk::with_clock(store.clone(), &config, clock.clone());
        Self {
            store,
            clock,
            config,
            kb,
            desk,
        }
    }

    /// Shelf id used by [`Fixture::seed`]
    pub fn shelf_id(&self) -> RecordId {
        RecordId::new(SHELF_ID)
    }

    /// Seed one shelf holding one book, returning the book
    pub fn seed(&self) -> Book {
        self.kb
            .seed_shelves(&[Shelf {
                id: self.shelf_id(),
                title: "Customer Support".into(),
            }])
            .unwrap();
        self.seed_book("Billing")
    }

    /// Add another book to the seeded shelf
    pub fn seed_book(&self, title: &str) -> Book {
        self.kb
            .seed_book(
                &self.shelf_id(),
                BookDraft {
                    title: title.into(),
                    details: format!("{title} procedures"),
                    cover: None,
                },
            )
            .unwrap()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::with_config(DashConfig::default())
    }
}

/// Four weekly evaluations of one employee: mean 85.75, mode "Diagnosis"
pub fn weekly_quality(employee: &str) -> Vec<QualityDraft> {
    [
        ("2024-05-01", 85.0, "Diagnosis"),
        ("2024-05-08", 92.0, "Answer & Ending"),
        ("2024-05-15", 78.0, "Diagnosis"),
        ("2024-05-22", 88.0, "Documentation"),
    ]
    .into_iter()
    .map(|(date, score, area)| QualityDraft::new(employee, date, score, area))
    .collect()
}
