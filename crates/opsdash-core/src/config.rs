//! Dashboard configuration
//!
//! Loaded from a TOML or YAML file chosen by extension, then overridden by
//! `OPSDASH_DATA` and `OPSDASH_AUTHOR` from the environment.

use crate::error::{DashError, DashResult};
use opsdash_repo::{IdStrategy, DEFAULT_MAX_WRITE_RETRIES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`DashConfig::data_path`]
pub const ENV_DATA: &str = "OPSDASH_DATA";
/// Environment variable overriding [`DashConfig::default_author`]
pub const ENV_AUTHOR: &str = "OPSDASH_AUTHOR";

/// Configuration for the dashboard services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// Backing file of the file store
    pub data_path: PathBuf,
    /// How new record ids are generated
    pub id_strategy: IdStrategy,
    /// Re-applications of a write after losing a race
    pub max_write_retries: u32,
    /// Repair drifted article counters whenever books are listed
    pub reconcile_on_read: bool,
    /// Author stamped on articles created without one
    pub default_author: String,
}

impl DashConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With data path
    #[inline]
    #[must_use]
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// With id strategy
    #[inline]
    #[must_use]
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    /// With max write retries
    #[inline]
    #[must_use]
    pub fn with_max_write_retries(mut self, retries: u32) -> Self {
        self.max_write_retries = retries;
        self
    }

    /// With reconcile on read
    #[inline]
    #[must_use]
    pub fn with_reconcile_on_read(mut self, enabled: bool) -> Self {
        self.reconcile_on_read = enabled;
        self
    }

    /// With default author
    #[inline]
    #[must_use]
    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = author.into();
        self
    }

    /// Parse configuration text in the format named by `extension`
    ///
    /// # Errors
    /// Returns [`DashError::Config`] for an unknown extension or invalid text
    pub fn parse(text: &str, extension: &str) -> DashResult<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(text).map_err(|e| DashError::config(e.to_string())),
            "yaml" | "yml" => serde_yaml::from_str(text).map_err(|e| DashError::config(e.to_string())),
            other => Err(DashError::config(format!(
                "unsupported config format '{other}' (expected toml, yaml or yml)"
            ))),
        }
    }

    /// Load from `path`, then apply environment overrides
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> DashResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DashError::config(format!("cannot read {}: {e}", path.display())))?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

        let config = Self::parse(&text, extension)?.with_env_overrides();
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `OPSDASH_DATA` / `OPSDASH_AUTHOR` when set and non-empty
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides looked up through `var`
    #[must_use]
    pub fn with_overrides<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(data) = var(ENV_DATA).filter(|v| !v.is_empty()) {
            self.data_path = PathBuf::from(data);
        }
        if let Some(author) = var(ENV_AUTHOR).filter(|v| !v.is_empty()) {
            self.default_author = author;
        }
        self
    }
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("opsdash.json"),
            id_strategy: IdStrategy::default(),
            max_write_retries: DEFAULT_MAX_WRITE_RETRIES,
            reconcile_on_read: false,
            default_author: "Admin".to_string(),
        }
    }
}
