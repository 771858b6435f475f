use std::path::Path;
use std::sync::{Arc, Mutex};

use ahash::AHashMap;

use super::error::{FileError, FileResult};
use super::file_manager::PageFile;
use super::frame::{Frame, FrameId};
use super::page_store::PageStore;
use super::replacer::{ReplacementStrategy, Replacer};
use super::PageId;

/// A buffer pool shared between threads. Holding the lock makes
/// "check pin count, evict, load" a single critical section.
pub type SharedBufferPool = Arc<Mutex<BufferPool>>;

/// Proof that a page was pinned; pass its page id back to `unpin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    page_id: PageId,
    frame: FrameId,
}

impl PageHandle {
    pub fn page_id(&self) -> PageId {
        self.page_id
    }
}

/// Caches a bounded number of pages of one page store in memory frames
pub struct BufferPool {
    /// Backing store; `None` once the pool has been shut down
    store: Option<Box<dyn PageStore>>,
    frames: Vec<Frame>,
    /// Map from resident page to the frame holding it
    page_table: AHashMap<PageId, FrameId>,
    /// Frames that have never held a page or were emptied
    free_frames: Vec<FrameId>,
    replacer: Box<dyn Replacer>,
    strategy: ReplacementStrategy,
    num_read_io: usize,
    num_write_io: usize,
}

impl BufferPool {
    /// Open the page file at `path` and attach a pool of `capacity` frames
    pub fn open<P: AsRef<Path>>(
        path: P,
        capacity: usize,
        strategy: ReplacementStrategy,
    ) -> FileResult<Self> {
        if capacity == 0 {
            return Err(FileError::InvalidCapacity(capacity));
        }
        let file = PageFile::open(path)?;
        Self::with_store(Box::new(file), capacity, strategy)
    }

    /// Attach a pool of `capacity` frames to any page store
    pub fn with_store(
        store: Box<dyn PageStore>,
        capacity: usize,
        strategy: ReplacementStrategy,
    ) -> FileResult<Self> {
        if capacity == 0 {
            return Err(FileError::InvalidCapacity(capacity));
        }
        Ok(Self {
            store: Some(store),
            frames: (0..capacity).map(|_| Frame::new()).collect(),
            page_table: AHashMap::with_capacity(capacity),
            // Reversed so that frame 0 is handed out first
            free_frames: (0..capacity).rev().collect(),
            replacer: strategy.build(capacity),
            strategy,
            num_read_io: 0,
            num_write_io: 0,
        })
    }

    /// Pin a page, loading it from the store if it is not resident
    pub fn pin(&mut self, page_id: PageId) -> FileResult<PageHandle> {
        self.check_open()?;

        if let Some(&frame) = self.page_table.get(&page_id) {
            self.frames[frame].pin();
            self.replacer.record_access(frame);
            return Ok(PageHandle { page_id, frame });
        }

        let frame = self.claim_frame()?;
        if let Err(e) = self.load_into(frame, page_id) {
            self.free_frames.push(frame);
            return Err(e);
        }

        let slot = &mut self.frames[frame];
        slot.page_id = Some(page_id);
        slot.dirty = false;
        slot.pin_count = 1;
        self.page_table.insert(page_id, frame);
        self.replacer.record_load(frame);
        log::debug!("loaded page {} into frame {}", page_id, frame);

        Ok(PageHandle { page_id, frame })
    }

    /// Release one pin on a page
    pub fn unpin(&mut self, page_id: PageId) -> FileResult<()> {
        self.check_open()?;
        let frame = self.pinned_frame(page_id)?;
        self.frames[frame].unpin();
        self.replacer.record_access(frame);
        Ok(())
    }

    /// Mark a resident page as modified
    pub fn mark_dirty(&mut self, page_id: PageId) -> FileResult<()> {
        self.check_open()?;
        let frame = *self
            .page_table
            .get(&page_id)
            .ok_or(FileError::PageNotResident(page_id))?;
        self.frames[frame].dirty = true;
        Ok(())
    }

    /// Bytes of a pinned page
    pub fn page_data(&self, page_id: PageId) -> FileResult<&[u8]> {
        self.check_open()?;
        let frame = self.pinned_frame(page_id)?;
        Ok(&self.frames[frame].data[..])
    }

    /// Mutable bytes of a pinned page. This marks the page dirty.
    pub fn page_data_mut(&mut self, page_id: PageId) -> FileResult<&mut [u8]> {
        self.check_open()?;
        let frame = self.pinned_frame(page_id)?;
        let slot = &mut self.frames[frame];
        slot.dirty = true;
        Ok(&mut slot.data[..])
    }

    /// Write one page back if it is dirty, whether or not it is pinned
    pub fn force_page(&mut self, page_id: PageId) -> FileResult<()> {
        self.check_open()?;
        if let Some(&frame) = self.page_table.get(&page_id) {
            self.write_back(frame)?;
        }
        Ok(())
    }

    /// Write back every dirty page that nobody has pinned
    pub fn force_flush(&mut self) -> FileResult<()> {
        self.check_open()?;
        for frame in 0..self.frames.len() {
            if self.frames[frame].pin_count == 0 {
                self.write_back(frame)?;
            }
        }
        Ok(())
    }

    /// Flush all dirty pages and close the backing store
    pub fn shutdown(&mut self) -> FileResult<()> {
        self.check_open()?;

        let pinned = self.frames.iter().filter(|f| f.pin_count > 0).count();
        if pinned > 0 {
            return Err(FileError::PagesStillPinned(pinned));
        }

        self.force_flush()?;
        if let Some(mut store) = self.store.take() {
            store.sync()?;
        }
        for frame in &mut self.frames {
            frame.reset();
        }
        self.page_table.clear();
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    pub fn strategy(&self) -> ReplacementStrategy {
        self.strategy
    }

    /// Number of pages currently held in frames
    pub fn resident_pages(&self) -> usize {
        self.page_table.len()
    }

    pub fn is_page_cached(&self, page_id: PageId) -> bool {
        self.page_table.contains_key(&page_id)
    }

    /// Page held by each frame, in frame order
    pub fn frame_contents(&self) -> Vec<Option<PageId>> {
        self.frames.iter().map(|f| f.page_id).collect()
    }

    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.dirty).collect()
    }

    pub fn fix_counts(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.pin_count).collect()
    }

    /// Pages read from the store since the pool was opened
    pub fn num_read_io(&self) -> usize {
        self.num_read_io
    }

    /// Pages written to the store since the pool was opened
    pub fn num_write_io(&self) -> usize {
        self.num_write_io
    }

    /// Number of blocks in the backing store
    pub fn page_count(&mut self) -> FileResult<usize> {
        self.check_open()?;
        match self.store.as_deref_mut() {
            Some(store) => store.page_count(),
            None => Err(FileError::PoolClosed),
        }
    }

    fn check_open(&self) -> FileResult<()> {
        if self.store.is_none() {
            return Err(FileError::PoolClosed);
        }
        Ok(())
    }

    fn pinned_frame(&self, page_id: PageId) -> FileResult<FrameId> {
        match self.page_table.get(&page_id) {
            Some(&frame) if self.frames[frame].pin_count > 0 => Ok(frame),
            _ => Err(FileError::PageNotPinned(page_id)),
        }
    }

    /// Find an empty frame, evicting the policy's victim if none is free
    fn claim_frame(&mut self) -> FileResult<FrameId> {
        if let Some(frame) = self.free_frames.pop() {
            return Ok(frame);
        }

        let victim = self
            .replacer
            .victim(&self.frames)
            .ok_or(FileError::NoEvictablePage(self.frames.len()))?;

        self.write_back(victim)?;
        if let Some(old) = self.frames[victim].page_id {
            self.page_table.remove(&old);
            log::debug!("evicted page {} from frame {}", old, victim);
        }
        self.replacer.remove(victim);
        self.frames[victim].reset();
        Ok(victim)
    }

    fn load_into(&mut self, frame: FrameId, page_id: PageId) -> FileResult<()> {
        let store = self.store.as_deref_mut().ok_or(FileError::PoolClosed)?;
        store.ensure_capacity(page_id + 1)?;
        store.read_block(page_id, &mut self.frames[frame].data[..])?;
        self.num_read_io += 1;
        Ok(())
    }

    fn write_back(&mut self, frame: FrameId) -> FileResult<()> {
        let slot = &mut self.frames[frame];
        let Some(page_id) = slot.page_id else {
            return Ok(());
        };
        if !slot.dirty {
            return Ok(());
        }
        let store = self.store.as_deref_mut().ok_or(FileError::PoolClosed)?;
        store.write_block(page_id, &slot.data[..])?;
        slot.dirty = false;
        self.num_write_io += 1;
        log::debug!("wrote back page {} from frame {}", page_id, frame);
        Ok(())
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        if self.store.is_some() {
            log::warn!("buffer pool dropped without shutdown; flushing unpinned pages");
            let _ = self.force_flush();
            if let Some(store) = self.store.as_deref_mut() {
                let _ = store.sync();
            }
        }
    }
}
