use super::error::{FileError, FileResult};
use super::{PAGE_SIZE, PageId};

/// A file of fixed-size blocks addressed by zero-based page number.
///
/// The buffer pool only talks to the backing file through this trait, so the
/// disk-backed [`PageFile`](super::PageFile) and the in-memory
/// [`MemoryPageStore`] are interchangeable.
pub trait PageStore: Send {
    /// Read block `page_id` into `buffer`. Fails if the block does not exist.
    fn read_block(&mut self, page_id: PageId, buffer: &mut [u8]) -> FileResult<()>;

    /// Write `buffer` to block `page_id`, growing the store if needed
    fn write_block(&mut self, page_id: PageId, buffer: &[u8]) -> FileResult<()>;

    /// Number of blocks currently in the store
    fn page_count(&mut self) -> FileResult<usize>;

    /// Append one zero-filled block
    fn append_empty_block(&mut self) -> FileResult<()> {
        let next = self.page_count()?;
        self.write_block(next, &[0u8; PAGE_SIZE])
    }

    /// Grow the store with zero-filled blocks until it holds `num_pages`
    fn ensure_capacity(&mut self, num_pages: usize) -> FileResult<()> {
        while self.page_count()? < num_pages {
            self.append_empty_block()?;
        }
        Ok(())
    }

    /// Push buffered writes down to durable storage
    fn sync(&mut self) -> FileResult<()>;
}

pub(super) fn check_buffer_len(len: usize) -> FileResult<()> {
    if len != PAGE_SIZE {
        return Err(FileError::InvalidPageSize {
            expected: PAGE_SIZE,
            actual: len,
        });
    }
    Ok(())
}

/// In-memory page store. Not persistent; used for tests and scratch pools.
#[derive(Default)]
pub struct MemoryPageStore {
    pages: Vec<Box<[u8; PAGE_SIZE]>>,
    /// Number of block writes performed, for assertions in tests
    writes: usize,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `num_pages` zeroed blocks
    pub fn with_pages(num_pages: usize) -> Self {
        Self {
            pages: (0..num_pages).map(|_| Box::new([0u8; PAGE_SIZE])).collect(),
            writes: 0,
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl PageStore for MemoryPageStore {
    fn read_block(&mut self, page_id: PageId, buffer: &mut [u8]) -> FileResult<()> {
        check_buffer_len(buffer.len())?;
        let page = self
            .pages
            .get(page_id)
            .ok_or(FileError::ReadNonExistingPage {
                page_id,
                page_count: self.pages.len(),
            })?;
        buffer.copy_from_slice(&page[..]);
        Ok(())
    }

    fn write_block(&mut self, page_id: PageId, buffer: &[u8]) -> FileResult<()> {
        check_buffer_len(buffer.len())?;
        while self.pages.len() <= page_id {
            self.pages.push(Box::new([0u8; PAGE_SIZE]));
        }
        self.pages[page_id].copy_from_slice(buffer);
        self.writes += 1;
        Ok(())
    }

    fn page_count(&mut self) -> FileResult<usize> {
        Ok(self.pages.len())
    }

    fn sync(&mut self) -> FileResult<()> {
        Ok(())
    }
}
