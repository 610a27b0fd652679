//! Ops Dashboard Repositories
//!
//! Typed CRUD over JSON-encoded ordered collections stored in a flat
//! key-value store.
//!
//! # Core Concepts
//!
//! - [`CollectionKey`]: one collection per (entity kind, parent id, version)
//! - [`SchemaRegistry`]: upgrade steps between stored schema versions
//! - [`Collections`]: whole-collection reads, fenced rewrites, retry-with-merge
//! - [`Repository<R>`]: `list` / `get` / `create` / `update` / `delete`
//! - [`IdGenerator`]: collision-resistant record ids
//! - [`Clock`]: timestamp source
//!
//! # Example
//!
//! ```rust,ignore
//! use opsdash_repo::{Collections, Repository};
//! use opsdash_model::{Article, ArticleDraft, RecordId};
//!
//! let articles: Repository<Article> = Repository::new(Collections::new(store));
//! let book = RecordId::new("b1");
//!
//! let created = articles.create(Some(&book), ArticleDraft::new("Refunds", "<p>...</p>"))?;
//! assert_eq!(articles.list(Some(&book))?.last(), Some(&created));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod clock;
mod collection;
mod error;
mod ids;
mod key;
mod repository;
mod schema;

pub use clock::{Clock, FixedClock, SystemClock};
pub use collection::{Collections, Mutation, Snapshot, DEFAULT_MAX_WRITE_RETRIES};
pub use error::{RepoError, RepoResult};
pub use ids::{IdGenerator, IdStrategy};
pub use key::CollectionKey;
pub use repository::Repository;
pub use schema::{SchemaRegistry, UpgradeFn};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
