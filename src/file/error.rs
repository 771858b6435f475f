use std::io;
use thiserror::Error;

use crate::error::{ErrorKind, codes};

use super::PageId;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File already exists: {0}")]
    FileAlreadyExists(String),

    #[error("Read of non-existing page: page_id={page_id}, page_count={page_count}")]
    ReadNonExistingPage { page_id: PageId, page_count: usize },

    #[error("Invalid page size: expected {expected}, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("Invalid buffer pool capacity: {0}")]
    InvalidCapacity(usize),

    #[error("No evictable page: all {0} frames are pinned")]
    NoEvictablePage(usize),

    #[error("Page is not pinned: page_id={0}")]
    PageNotPinned(PageId),

    #[error("Page is not resident in the buffer pool: page_id={0}")]
    PageNotResident(PageId),

    #[error("Cannot shut down buffer pool: {0} pages still pinned")]
    PagesStillPinned(usize),

    #[error("Buffer pool is closed")]
    PoolClosed,
}

impl FileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FileError::Io(_) => ErrorKind::Io,
            FileError::FileNotFound(_) | FileError::ReadNonExistingPage { .. } => {
                ErrorKind::NotFound
            }
            FileError::FileAlreadyExists(_)
            | FileError::InvalidPageSize { .. }
            | FileError::InvalidCapacity(_) => ErrorKind::InvalidArgument,
            FileError::NoEvictablePage(_) => ErrorKind::ResourceExhausted,
            FileError::PageNotPinned(_)
            | FileError::PageNotResident(_)
            | FileError::PagesStillPinned(_)
            | FileError::PoolClosed => ErrorKind::InvalidState,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            FileError::FileNotFound(_) => codes::FILE_NOT_FOUND,
            FileError::ReadNonExistingPage { .. } => codes::READ_NON_EXISTING_PAGE,
            FileError::InvalidCapacity(_) => codes::POOL_INIT_FAILED,
            FileError::PageNotPinned(_) => codes::UNPIN_FAILED,
            FileError::PageNotResident(_) => codes::MARK_DIRTY_FAILED,
            FileError::PagesStillPinned(_) | FileError::PoolClosed => codes::SHUTDOWN_FAILED,
            other => other.kind().code(),
        }
    }
}

pub type FileResult<T> = Result<T, FileError>;
