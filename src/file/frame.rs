use super::{PAGE_SIZE, PageId};

/// Index of a frame within the buffer pool
pub type FrameId = usize;

/// An in-memory slot holding at most one cached page
pub struct Frame {
    /// Page currently held, if any
    pub page_id: Option<PageId>,
    pub data: Box<[u8; PAGE_SIZE]>,
    /// Number of callers currently holding the page
    pub pin_count: u32,
    /// Modified since it was loaded or last written back
    pub dirty: bool,
}

impl Frame {
    pub fn new() -> Self {
        Self {
            page_id: None,
            data: Box::new([0u8; PAGE_SIZE]),
            pin_count: 0,
            dirty: false,
        }
    }

    pub fn pin(&mut self) {
        self.pin_count = self.pin_count.saturating_add(1);
    }

    pub fn unpin(&mut self) {
        self.pin_count = self.pin_count.saturating_sub(1);
    }

    /// A frame can be evicted only when it holds a page nobody has pinned
    pub fn is_evictable(&self) -> bool {
        self.page_id.is_some() && self.pin_count == 0
    }

    pub fn is_empty(&self) -> bool {
        self.page_id.is_none()
    }

    /// Detach the frame from its page. The data buffer is kept for reuse.
    pub fn reset(&mut self) {
        self.page_id = None;
        self.pin_count = 0;
        self.dirty = false;
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
