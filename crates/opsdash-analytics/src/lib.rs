//! Ops Dashboard Analytics
//!
//! Pure, read-only views computed from raw reporting records. Nothing here
//! writes to a store or caches results; callers recompute from a fresh read.
//!
//! - [`report`]: KPI report row filtering for display
//! - [`quality`]: per-employee score trend and weakest-area analysis

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod quality;
pub mod report;

pub use quality::{analyze, analyze_employee, mode, CallTypeScore, EmployeeQuality, QualityOverview, TrendPoint};
pub use report::{displayable_rows, is_displayable, ReportView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
