//! Persistence adapter configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the SQLite persistence adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path. `None` selects an in-memory store (tests, tooling).
    pub db_path: Option<PathBuf>,
    /// Number of read-only reader connections in the pool.
    pub read_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            read_pool_size: 2,
        }
    }
}
