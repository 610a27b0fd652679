//! Ops Dashboard Store Adapters
//!
//! Thin synchronous key-value layer underneath the dashboard repositories.
//!
//! # Core Concepts
//!
//! - [`KeyValueStore`]: `get` / `set` / `remove` over string keys and values
//! - [`MemoryStore`]: concurrent in-memory backend
//! - [`FileStore`]: single JSON file backend
//! - [`VersionToken`]: Blake3 of a raw value, used for optimistic writes
//!
//! # Example
//!
//! ```rust,ignore
//! use opsdash_store::{KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set("kpi_reports", "[]")?;
//!
//! let (raw, token) = store.get_versioned("kpi_reports")?;
//! store.compare_and_set("kpi_reports", &token, "[{\"id\":\"1\"}]")?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod file;
mod kv;
mod memory;
mod token;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use kv::KeyValueStore;
pub use memory::MemoryStore;
pub use token::VersionToken;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
