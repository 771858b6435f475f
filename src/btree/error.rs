use thiserror::Error;

use crate::error::ErrorKind;

use super::node::NodeId;

/// Errors that can occur during B+ tree operations
#[derive(Debug, Clone, Error)]
pub enum BPlusTreeError {
    #[error("Invalid tree state: {0}")]
    InvalidState(String),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid order: {0} (must be >= 3)")]
    InvalidOrder(usize),
}

impl BPlusTreeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BPlusTreeError::InvalidOrder(_) => ErrorKind::InvalidArgument,
            BPlusTreeError::InvalidState(_) | BPlusTreeError::NodeNotFound(_) => {
                ErrorKind::InvalidState
            }
        }
    }
}

pub type BPlusTreeResult<T> = Result<T, BPlusTreeError>;
