pub mod btree;
pub mod catalog;
pub mod config;
pub mod error;
pub mod file;
pub mod index;
pub mod record;

pub use btree::{BPlusKey, BPlusNode, BPlusTree, BPlusTreeError, BPlusTreeResult};
pub use config::{ConfigError, EngineConfig};
pub use error::ErrorKind;
pub use file::{BufferPool, FileError, PAGE_SIZE, PageFile, PageId, ReplacementStrategy};
pub use index::{BTreeIndex, IndexError, IndexManager, IndexOptions, TreeScan};
pub use record::{
    Attribute, DataType, Expr, Record, RecordError, RecordId, RecordManager, RecordResult, Schema,
    Table, TableScan, Value,
};
