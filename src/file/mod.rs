mod buffer_manager;
mod error;
mod file_manager;
mod frame;
mod page_store;
mod replacer;

pub use buffer_manager::{BufferPool, PageHandle, SharedBufferPool};
pub use error::{FileError, FileResult};
pub use file_manager::PageFile;
pub use frame::{Frame, FrameId};
pub use page_store::{MemoryPageStore, PageStore};
pub use replacer::{ClockReplacer, FifoReplacer, LruReplacer, ReplacementStrategy, Replacer};

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Page ID type
pub type PageId = usize;
