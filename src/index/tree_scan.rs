use crate::btree::BPlusKey;
use crate::record::RecordId;

use super::error::{IndexError, IndexResult};

/// Ordered scan over a snapshot of an index.
///
/// Entries are captured in ascending key order when the scan is opened, so
/// later changes to the index do not affect it. Equal keys come out in
/// insertion order.
#[derive(Debug, Clone)]
pub struct TreeScan {
    entries: Vec<(BPlusKey, RecordId)>,
    position: usize,
    reserve_zero_keys: bool,
}

impl TreeScan {
    pub(super) fn new(entries: Vec<(BPlusKey, RecordId)>, reserve_zero_keys: bool) -> Self {
        Self {
            entries,
            position: 0,
            reserve_zero_keys,
        }
    }

    /// Locator of the next entry, or `NoMoreEntries` once the scan is exhausted.
    ///
    /// With zero keys reserved, an entry pointing at page 0 is reported as
    /// `KeyNotFound` and skipped.
    pub fn next_entry(&mut self) -> IndexResult<RecordId> {
        let (key, rid) = *self
            .entries
            .get(self.position)
            .ok_or(IndexError::NoMoreEntries)?;
        self.position += 1;

        if self.reserve_zero_keys && rid.page_id == 0 {
            return Err(IndexError::KeyNotFound(key));
        }
        Ok(rid)
    }

    /// Restart from the smallest key
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Entries not yet returned
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.position
    }

    pub fn close(self) {}
}

impl Iterator for TreeScan {
    type Item = RecordId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_entry() {
                Ok(rid) => return Some(rid),
                Err(IndexError::KeyNotFound(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(page: usize, slot: usize) -> RecordId {
        RecordId::new(page, slot)
    }

    #[test]
    fn test_exhaust_and_reset() {
        let mut scan = TreeScan::new(vec![(1, rid(1, 0)), (3, rid(1, 1))], true);

        assert_eq!(scan.next_entry().unwrap(), rid(1, 0));
        assert_eq!(scan.remaining(), 1);
        assert_eq!(scan.next_entry().unwrap(), rid(1, 1));
        assert!(matches!(scan.next_entry(), Err(IndexError::NoMoreEntries)));
        assert!(matches!(scan.next_entry(), Err(IndexError::NoMoreEntries)));

        scan.reset();
        assert_eq!(scan.collect::<Vec<_>>(), vec![rid(1, 0), rid(1, 1)]);
    }

    #[test]
    fn test_zero_page_entry() {
        let entries = vec![(1, rid(0, 4)), (2, rid(2, 0))];

        let mut reserved = TreeScan::new(entries.clone(), true);
        assert!(matches!(
            reserved.next_entry(),
            Err(IndexError::KeyNotFound(1))
        ));
        assert_eq!(reserved.next_entry().unwrap(), rid(2, 0));

        let plain = TreeScan::new(entries, false);
        assert_eq!(plain.collect::<Vec<_>>(), vec![rid(0, 4), rid(2, 0)]);

        let skipping = TreeScan::new(vec![(1, rid(0, 4)), (2, rid(2, 0))], true);
        assert_eq!(skipping.collect::<Vec<_>>(), vec![rid(2, 0)]);
    }

    #[test]
    fn test_empty_scan() {
        let mut scan = TreeScan::new(Vec::new(), true);
        assert!(matches!(scan.next_entry(), Err(IndexError::NoMoreEntries)));
        assert_eq!(scan.next(), None);
        scan.close();
    }
}
