//! Configuration for nodestore
//!
//! Centralized configuration with sensible defaults.

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, StoreError};

/// Configuration for a single [`FileStore`](crate::store::FileStore) instance
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Node data directory. Internal structure:
    ///   {base_dir}/
    ///     └── datastore-files/
    ///           └── {name}/
    ///                 └── {HH}/{HH}/{REST}.dat
    pub base_dir: PathBuf,

    /// Store name, one per block type (e.g. "chk", "ssk")
    pub name: String,

    /// fsync every record before it is renamed into place
    pub sync_writes: bool,

    // -------------------------------------------------------------------------
    // Capacity Configuration
    // -------------------------------------------------------------------------
    /// Advisory capacity. Stored and reported, not enforced.
    pub max_keys: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./nodestore_data"),
            name: "store".to_string(),
            sync_writes: false,
            max_keys: 1_000_000,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Check that the store name is a single plain path component
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(StoreError::Config("store name must not be empty".to_string()));
        }

        let mut components = Path::new(&self.name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(StoreError::Config(format!(
                "store name must be a single directory name, got {:?}",
                self.name
            ))),
        }
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the node data directory
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_dir = path.into();
        self
    }

    /// Set the store name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set whether each record is fsynced before being renamed into place
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    /// Set the advisory capacity
    pub fn max_keys(mut self, max_keys: u64) -> Self {
        self.config.max_keys = max_keys;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
