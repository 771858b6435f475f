use thiserror::Error;

use crate::btree::{BPlusKey, BPlusTreeError};
use crate::error::{ErrorKind, codes};
use crate::file::{FileError, PageId};
use crate::record::DataType;

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur during index operations
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("B+ tree error: {0}")]
    BPlusTree(#[from] BPlusTreeError),

    #[error("Key not found: {0}")]
    KeyNotFound(BPlusKey),

    #[error("No more entries in tree scan")]
    NoMoreEntries,

    #[error("Order {order} too large: a node must fit in one page (max {max})")]
    OrderTooLarge { order: usize, max: usize },

    #[error("Unsupported key type: {0} (only INT keys can be indexed)")]
    UnsupportedKeyType(DataType),

    #[error("Invalid index name: {0:?}")]
    InvalidIndexName(String),

    #[error("Invalid magic number in index file header")]
    InvalidMagic,

    #[error("Unsupported index file version: {0}")]
    UnsupportedVersion(u32),

    #[error("Corrupted node data at page {0}")]
    CorruptedNode(PageId),

    #[error("Invalid node type: {0}")]
    InvalidNodeType(u8),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl IndexError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IndexError::File(e) => e.kind(),
            IndexError::BPlusTree(e) => e.kind(),
            IndexError::KeyNotFound(_) | IndexError::NoMoreEntries => ErrorKind::NotFound,
            IndexError::OrderTooLarge { .. }
            | IndexError::UnsupportedKeyType(_)
            | IndexError::InvalidIndexName(_) => ErrorKind::InvalidArgument,
            IndexError::InvalidMagic
            | IndexError::UnsupportedVersion(_)
            | IndexError::CorruptedNode(_)
            | IndexError::InvalidNodeType(_)
            | IndexError::Serialization(_)
            | IndexError::Deserialization(_) => ErrorKind::InvalidState,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            IndexError::File(e) => e.code(),
            IndexError::KeyNotFound(_) => codes::KEY_NOT_FOUND,
            IndexError::NoMoreEntries => codes::NO_MORE_ENTRIES,
            IndexError::OrderTooLarge { .. } => codes::ORDER_TOO_LARGE,
            IndexError::UnsupportedKeyType(_) => codes::UNKNOWN_DATATYPE,
            other => other.kind().code(),
        }
    }
}
