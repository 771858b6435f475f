use std::collections::VecDeque;

use lru::LruCache;
use serde::{Deserialize, Serialize};

use super::frame::{Frame, FrameId};

/// Page replacement policy used when the buffer pool is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementStrategy {
    /// Evict the page that has been resident longest
    Fifo,
    /// Evict the page whose last pin or unpin is oldest
    Lru,
    /// Second-chance sweep over the frames
    Clock,
}

impl ReplacementStrategy {
    pub(super) fn build(self, capacity: usize) -> Box<dyn Replacer> {
        match self {
            ReplacementStrategy::Fifo => Box::new(FifoReplacer::new(capacity)),
            ReplacementStrategy::Lru => Box::new(LruReplacer::new()),
            ReplacementStrategy::Clock => Box::new(ClockReplacer::new(capacity)),
        }
    }
}

/// Bookkeeping for a replacement policy.
///
/// The pool reports every load, hit and release; `victim` picks a frame among
/// the evictable ones or returns `None` when every frame is pinned.
pub trait Replacer: Send {
    /// A page was just loaded into `frame`
    fn record_load(&mut self, frame: FrameId);

    /// A resident page was pinned or unpinned
    fn record_access(&mut self, frame: FrameId);

    /// `frame` no longer holds a page
    fn remove(&mut self, frame: FrameId);

    fn victim(&mut self, frames: &[Frame]) -> Option<FrameId>;
}

/// First in, first out: hits never reorder the queue
pub struct FifoReplacer {
    arrivals: VecDeque<FrameId>,
}

impl FifoReplacer {
    pub fn new(capacity: usize) -> Self {
        Self {
            arrivals: VecDeque::with_capacity(capacity),
        }
    }
}

impl Replacer for FifoReplacer {
    fn record_load(&mut self, frame: FrameId) {
        self.arrivals.push_back(frame);
    }

    fn record_access(&mut self, _frame: FrameId) {}

    fn remove(&mut self, frame: FrameId) {
        self.arrivals.retain(|&f| f != frame);
    }

    fn victim(&mut self, frames: &[Frame]) -> Option<FrameId> {
        self.arrivals
            .iter()
            .copied()
            .find(|&f| frames[f].is_evictable())
    }
}

/// Least recently used, ordered by an `LruCache` of frame ids
pub struct LruReplacer {
    recency: LruCache<FrameId, ()>,
}

impl LruReplacer {
    pub fn new() -> Self {
        Self {
            recency: LruCache::unbounded(),
        }
    }
}

impl Default for LruReplacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Replacer for LruReplacer {
    fn record_load(&mut self, frame: FrameId) {
        self.recency.put(frame, ());
    }

    fn record_access(&mut self, frame: FrameId) {
        self.recency.put(frame, ());
    }

    fn remove(&mut self, frame: FrameId) {
        self.recency.pop(&frame);
    }

    fn victim(&mut self, frames: &[Frame]) -> Option<FrameId> {
        // iter() runs most recent first
        self.recency
            .iter()
            .rev()
            .map(|(&f, _)| f)
            .find(|&f| frames[f].is_evictable())
    }
}

/// Clock (second chance): a touched frame survives one sweep of the hand
pub struct ClockReplacer {
    referenced: Vec<bool>,
    hand: usize,
}

impl ClockReplacer {
    pub fn new(capacity: usize) -> Self {
        Self {
            referenced: vec![false; capacity],
            hand: 0,
        }
    }
}

impl Replacer for ClockReplacer {
    fn record_load(&mut self, frame: FrameId) {
        self.referenced[frame] = true;
    }

    fn record_access(&mut self, frame: FrameId) {
        self.referenced[frame] = true;
    }

    fn remove(&mut self, frame: FrameId) {
        self.referenced[frame] = false;
    }

    fn victim(&mut self, frames: &[Frame]) -> Option<FrameId> {
        let n = frames.len();
        if n == 0 {
            return None;
        }
        // Two full sweeps clear every reference bit at least once
        for _ in 0..2 * n {
            let current = self.hand;
            self.hand = (self.hand + 1) % n;
            if !frames[current].is_evictable() {
                continue;
            }
            if self.referenced[current] {
                self.referenced[current] = false;
            } else {
                return Some(current);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| {
                let mut f = Frame::new();
                f.page_id = Some(i);
                f
            })
            .collect()
    }

    #[test]
    fn test_fifo_ignores_hits() {
        let frames = loaded_frames(3);
        let mut r = FifoReplacer::new(3);
        for f in 0..3 {
            r.record_load(f);
        }
        r.record_access(0);
        assert_eq!(r.victim(&frames), Some(0));
    }

    #[test]
    fn test_fifo_skips_pinned() {
        let mut frames = loaded_frames(3);
        let mut r = FifoReplacer::new(3);
        for f in 0..3 {
            r.record_load(f);
        }
        frames[0].pin();
        assert_eq!(r.victim(&frames), Some(1));
        frames[1].pin();
        frames[2].pin();
        assert_eq!(r.victim(&frames), None);
    }

    #[test]
    fn test_lru_uses_recency() {
        let frames = loaded_frames(3);
        let mut r = LruReplacer::new();
        for f in 0..3 {
            r.record_load(f);
        }
        r.record_access(0);
        assert_eq!(r.victim(&frames), Some(1));
        r.remove(1);
        assert_eq!(r.victim(&frames), Some(2));
    }

    #[test]
    fn test_clock_second_chance() {
        let frames = loaded_frames(3);
        let mut r = ClockReplacer::new(3);
        for f in 0..3 {
            r.record_load(f);
        }
        // All referenced: first sweep clears bits, then frame 0 goes
        assert_eq!(r.victim(&frames), Some(0));
        r.remove(0);
        r.record_load(0);
        // Hand is at 1 and its bit was cleared by the previous sweep
        assert_eq!(r.victim(&frames), Some(1));
    }

    #[test]
    fn test_clock_all_pinned() {
        let mut frames = loaded_frames(2);
        frames[0].pin();
        frames[1].pin();
        let mut r = ClockReplacer::new(2);
        r.record_load(0);
        r.record_load(1);
        assert_eq!(r.victim(&frames), None);
    }

    #[test]
    fn test_strategy_from_json() {
        let s: ReplacementStrategy = serde_json::from_str("\"lru\"").unwrap();
        assert_eq!(s, ReplacementStrategy::Lru);
        let s: ReplacementStrategy = serde_json::from_str("\"clock\"").unwrap();
        assert_eq!(s, ReplacementStrategy::Clock);
    }
}
