//! Ops Dashboard Records
//!
//! Typed records stored in the dashboard's JSON collections.
//!
//! # Core Concepts
//!
//! - [`Record`]: element of an ordered JSON collection, built from a draft
//! - [`Patchable`]: record edited in place through a patch
//! - [`RecordId`]: identifier compared by string value
//! - Knowledge base: [`Shelf`] → [`Book`] → [`Article`]
//! - Reporting: [`KpiReport`] (with embedded [`KpiRow`]s), [`QualityRecord`]

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod id;
mod knowledge;
mod record;
mod report;

pub use error::ModelError;
pub use id::RecordId;
pub use knowledge::{Article, ArticleDraft, ArticlePatch, Book, BookDraft, BookPatch, Shelf, ShelfDraft};
pub use record::{timestamp, EntityKind, Patchable, Record};
pub use report::{month_label, KpiReport, KpiReportDraft, KpiRow, QualityDraft, QualityRecord};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
