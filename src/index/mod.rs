//! Index management module

mod error;
mod index_file;
mod serialization;
mod tree_scan;

pub use error::{IndexError, IndexResult};
pub use index_file::BTreeIndex;
pub use serialization::MAX_ORDER;
pub use tree_scan::TreeScan;

use crate::config::EngineConfig;
use crate::file::ReplacementStrategy;
use crate::record::DataType;

/// Settings applied to an index when it is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Frames in the buffer pool over the index file
    pub pool_capacity: usize,
    pub replacement: ReplacementStrategy,
    /// Treat key 0 and page 0 as empty-slot markers
    pub reserve_zero_keys: bool,
}

impl From<&EngineConfig> for IndexOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            pool_capacity: config.index_pool_capacity,
            replacement: config.index_replacement,
            reserve_zero_keys: config.reserve_zero_keys,
        }
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

/// Creates, opens and deletes index files under the configured data directory
pub struct IndexManager {
    config: EngineConfig,
}

impl IndexManager {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create an empty index of the given order
    pub fn create_btree(&self, name: &str, key_type: DataType, order: usize) -> IndexResult<()> {
        Self::check_name(name)?;
        BTreeIndex::create(self.config.file_path(name), key_type, order)
    }

    pub fn open_btree(&self, name: &str) -> IndexResult<BTreeIndex> {
        Self::check_name(name)?;
        BTreeIndex::open(
            self.config.file_path(name),
            &IndexOptions::from(&self.config),
        )
    }

    pub fn delete_btree(&self, name: &str) -> IndexResult<()> {
        Self::check_name(name)?;
        BTreeIndex::destroy(self.config.file_path(name))
    }

    fn check_name(name: &str) -> IndexResult<()> {
        if name.is_empty() || name.contains(['/', '\\', '\0']) || name == "." || name == ".." {
            return Err(IndexError::InvalidIndexName(name.to_string()));
        }
        Ok(())
    }
}
