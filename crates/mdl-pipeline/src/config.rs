//! Indexer configuration, read from TOML.
//!
//! ```toml
//! [store]
//! path = ".mdl/index.db"
//! ddl_collection = "Document"
//! view_collection = "view_questions"
//!
//! [embedding]
//! dimensions = 64
//!
//! [sync]
//! mode = "clear_then_write"   # or "staged"
//! ```
//!
//! Every key is optional. `MDL_INDEX_DATASET` overrides `store.ddl_collection`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use mdl_core::{MdlError, Result};
use mdl_store::embed::DEFAULT_DIMENSIONS;
use mdl_store::SyncMode;

/// Environment variable naming the DDL collection.
pub const DATASET_ENV: &str = "MDL_INDEX_DATASET";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub ddl_collection: String,
    pub view_collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".mdl").join("index.db"),
            ddl_collection: "Document".to_string(),
            view_collection: "view_questions".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub mode: SyncMode,
}

impl IndexConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Config`] if the text is not valid configuration.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| MdlError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Load configuration from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Io`] if the file exists but cannot be read, or
    /// [`MdlError::Config`] if it is not valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Apply the `MDL_INDEX_DATASET` override from the process environment.
    ///
    /// # Errors
    ///
    /// See [`IndexConfig::with_dataset`].
    pub fn with_env(self) -> Result<Self> {
        self.with_dataset(std::env::var(DATASET_ENV).ok())
    }

    /// Override the DDL collection name when `dataset` is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Config`] if the override names the view collection.
    pub fn with_dataset(mut self, dataset: Option<String>) -> Result<Self> {
        if let Some(dataset) = dataset.filter(|d| !d.trim().is_empty()) {
            self.store.ddl_collection = dataset;
            self.check()?;
        }
        Ok(self)
    }

    /// Resolve a relative store path against `base`.
    #[must_use]
    pub fn store_path(&self, base: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            base.join(&self.store.path)
        }
    }

    fn check(&self) -> Result<()> {
        if self.embedding.dimensions == 0 {
            return Err(MdlError::Config(
                "embedding.dimensions must be at least 1".to_string(),
            ));
        }
        if self.store.ddl_collection == self.store.view_collection {
            return Err(MdlError::Config(format!(
                "ddl and view collections must differ (both are '{}')",
                self.store.ddl_collection
            )));
        }
        Ok(())
    }
}
