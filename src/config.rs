use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::file::{BufferManager, DEFAULT_POOL_CAPACITY, PagedFileManager};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Frame replacement policy for table buffer pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    #[default]
    Lru,
}

/// Engine knobs, shared by every table handle the engine opens.
///
/// Persisted as JSON so an installation can pin its settings next to its
/// table files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Buffer pool frames per open table
    pub pool_capacity: usize,
    /// Replacement policy for those frames
    pub eviction_policy: EvictionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            eviction_policy: EvictionPolicy::Lru,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(&self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Build a buffer pool over a file manager per this configuration
    pub fn build_pool(&self, file_manager: PagedFileManager) -> BufferManager {
        match self.eviction_policy {
            EvictionPolicy::Lru => BufferManager::with_capacity(file_manager, self.pool_capacity),
        }
    }
}
