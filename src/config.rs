use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::file::ReplacementStrategy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::IoError(_) => ErrorKind::Io,
            ConfigError::JsonError(_) | ConfigError::Invalid(_) => ErrorKind::InvalidArgument,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Engine-wide settings. Every field has a default, so a partial JSON
/// document (or `{}`) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding table and index files
    pub data_dir: PathBuf,
    /// Frames in the buffer pool attached to each open table
    pub table_pool_capacity: usize,
    pub table_replacement: ReplacementStrategy,
    /// Frames in the buffer pool used to read and write index files
    pub index_pool_capacity: usize,
    pub index_replacement: ReplacementStrategy,
    /// Treat key 0 and page 0 as empty-slot markers in the index
    pub reserve_zero_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            table_pool_capacity: 3,
            table_replacement: ReplacementStrategy::Fifo,
            index_pool_capacity: 8,
            index_replacement: ReplacementStrategy::Lru,
            reserve_zero_keys: true,
        }
    }
}

impl EngineConfig {
    /// Default settings rooted at `data_dir`
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(&self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.table_pool_capacity == 0 {
            return Err(ConfigError::Invalid(
                "table_pool_capacity must be at least 1".to_string(),
            ));
        }
        if self.index_pool_capacity == 0 {
            return Err(ConfigError::Invalid(
                "index_pool_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of a table or index file named `name`
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}
