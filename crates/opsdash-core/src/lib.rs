//! Ops Dashboard Core
//!
//! Services of the dashboard's local persistence layer.
//!
//! # Core Concepts
//!
//! - [`KnowledgeBase`]: shelves, books and articles, with article counters
//!   kept on books
//! - [`CascadeSynchronizer`]: fenced counter updates and reconciliation
//! - [`ReportDesk`]: KPI reports and quality records with their analytics
//! - [`DashConfig`]: file and environment configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use opsdash_core::{DashConfig, KnowledgeBase};
//! use opsdash_model::{ArticleDraft, RecordId};
//!
//! let kb = KnowledgeBase::new(store, &DashConfig::default());
//! let created = kb.create_article(&shelf_id, &book_id, ArticleDraft::new("Refunds", "<p>...</p>"))?;
//! assert!(created.cascade.is_applied());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cascade;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod reports;

pub use cascade::{CascadeOutcome, CascadeSynchronizer, Cascaded, CounterCorrection, ReconcileReport};
pub use config::{DashConfig, ENV_AUTHOR, ENV_DATA};
pub use error::{DashError, DashResult};
pub use knowledge::KnowledgeBase;
pub use reports::ReportDesk;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
