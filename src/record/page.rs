use super::error::{RecordError, RecordResult};
use super::record::{RECORD_SENTINEL, SlotId};
use crate::file::PAGE_SIZE;

/// Zero-copy view of a data page holding fixed-size record slots.
///
/// Slot `i` occupies bytes `[i * record_size, (i + 1) * record_size)`; the
/// last byte of an occupied slot is the sentinel, a free slot is all zeros.
/// Works over `&[u8]` for reads and `&mut [u8]` for writes.
pub struct SlotPage<B> {
    buffer: B,
    record_size: usize,
}

impl<B: AsRef<[u8]>> SlotPage<B> {
    /// Records that fit in one page
    pub fn block_factor(record_size: usize) -> usize {
        if record_size == 0 {
            return 0;
        }
        PAGE_SIZE / record_size
    }

    /// Wrap a page buffer (zero-copy)
    pub fn from_buffer(buffer: B, record_size: usize) -> RecordResult<Self> {
        let len = buffer.as_ref().len();
        if len != PAGE_SIZE {
            return Err(RecordError::Deserialization(format!(
                "Invalid page size: {} bytes",
                len
            )));
        }
        if Self::block_factor(record_size) == 0 {
            return Err(RecordError::RecordTooLarge(record_size));
        }
        Ok(Self {
            buffer,
            record_size,
        })
    }

    pub fn slot_count(&self) -> usize {
        Self::block_factor(self.record_size)
    }

    fn range(&self, slot: SlotId) -> RecordResult<std::ops::Range<usize>> {
        if slot >= self.slot_count() {
            return Err(RecordError::InvalidSlotNumber(slot));
        }
        let start = slot * self.record_size;
        Ok(start..start + self.record_size)
    }

    /// A slot is occupied when its sentinel byte is set
    pub fn is_occupied(&self, slot: SlotId) -> RecordResult<bool> {
        let range = self.range(slot)?;
        Ok(self.buffer.as_ref()[range.end - 1] == RECORD_SENTINEL)
    }

    /// Raw bytes of a slot, sentinel included
    pub fn record_bytes(&self, slot: SlotId) -> RecordResult<&[u8]> {
        let range = self.range(slot)?;
        Ok(&self.buffer.as_ref()[range])
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SlotPage<B> {
    /// Write a full serialized record, sentinel included
    pub fn write_record(&mut self, slot: SlotId, bytes: &[u8]) -> RecordResult<()> {
        let range = self.range(slot)?;
        if bytes.len() != self.record_size {
            return Err(RecordError::Serialization(format!(
                "Expected {} bytes, got {}",
                self.record_size,
                bytes.len()
            )));
        }
        self.buffer.as_mut()[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Overwrite the attribute bytes of a slot, leaving its sentinel untouched
    pub fn overwrite_payload(&mut self, slot: SlotId, bytes: &[u8]) -> RecordResult<()> {
        let range = self.range(slot)?;
        let payload = self.record_size - 1;
        if bytes.len() < payload {
            return Err(RecordError::Serialization(format!(
                "Expected at least {} bytes, got {}",
                payload,
                bytes.len()
            )));
        }
        self.buffer.as_mut()[range.start..range.start + payload].copy_from_slice(&bytes[..payload]);
        Ok(())
    }

    /// Zero-fill a slot
    pub fn clear_slot(&mut self, slot: SlotId) -> RecordResult<()> {
        let range = self.range(slot)?;
        self.buffer.as_mut()[range].fill(0);
        Ok(())
    }
}
