//! Lazily built record index
//!
//! Records are framed as `type: u8 | length: u32 | payload[length]` and laid
//! out back to back after the header, so the offset of record `n` is only
//! known once records `0..n` have been walked. [`LazyIndex`] walks the
//! stream on demand and keeps every entry it discovers. Entries form a
//! contiguous prefix; the last one is the watermark and scanning always
//! resumes right after its payload.

use tracing::{debug, warn};

use super::format::{HEADER_SIZE, RECORD_FRAME_SIZE};
use super::primitives::{read_slice, read_u32_le, read_u8};
use crate::config::ReadAheadConfig;
use crate::{GcapError, Result};

/// Location of one record's payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Top-level record type byte
    pub record_type: u8,
    /// Absolute file offset of the payload
    pub payload_offset: u64,
    /// Payload length in bytes
    pub payload_length: u32,
}

impl IndexEntry {
    /// Absolute file offset one past the payload
    pub fn payload_end(&self) -> u64 {
        self.payload_offset + u64::from(self.payload_length)
    }
}

/// Incrementally discovered index over the record stream
#[derive(Debug, Clone)]
pub struct LazyIndex {
    entries: Vec<IndexEntry>,
    record_count: u64,
    read_ahead: ReadAheadConfig,
}

impl LazyIndex {
    /// Create an empty index for a stream of `record_count` records
    pub fn new(record_count: u64, read_ahead: ReadAheadConfig) -> Self {
        Self {
            entries: Vec::new(),
            record_count,
            read_ahead,
        }
    }

    /// Number of records in the stream
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Highest position indexed so far, `None` while empty
    pub fn watermark(&self) -> Option<u64> {
        (self.entries.len() as u64).checked_sub(1)
    }

    /// Entry for `position` if it has already been discovered
    pub fn cached(&self, position: u64) -> Option<IndexEntry> {
        usize::try_from(position)
            .ok()
            .and_then(|i| self.entries.get(i))
            .copied()
    }

    /// Resolve the entry for `position`, scanning `data` as needed
    ///
    /// `data` is the whole capture file. A request just behind the
    /// watermark first extends the index by the read-ahead span; that
    /// extension never affects the answer.
    ///
    /// # Errors
    ///
    /// Returns error if `position` is outside `0..record_count` or the
    /// stream is truncated before `position`
    pub fn entry_at(&mut self, data: &[u8], position: u64) -> Result<IndexEntry> {
        if position >= self.record_count {
            return Err(GcapError::IndexOutOfRange {
                index: position,
                count: self.record_count,
            });
        }

        self.maybe_read_ahead(data, position);

        if let Some(entry) = self.cached(position) {
            return Ok(entry);
        }

        self.extend_to(data, position)?;
        self.cached(position).ok_or(GcapError::IndexOutOfRange {
            index: position,
            count: self.record_count,
        })
    }

    /// Index every record in the stream
    ///
    /// # Errors
    ///
    /// Returns error if the stream is truncated
    pub fn build_all(&mut self, data: &[u8]) -> Result<()> {
        match self.record_count.checked_sub(1) {
            Some(last) => self.extend_to(data, last),
            None => Ok(()),
        }
    }

    fn maybe_read_ahead(&mut self, data: &[u8], position: u64) {
        let Some(watermark) = self.watermark() else {
            return;
        };

        if !self.read_ahead.enabled
            || position >= watermark
            || watermark - position >= self.read_ahead.trigger_distance
        {
            return;
        }

        let target = position
            .saturating_add(self.read_ahead.span)
            .min(self.record_count - 1);
        if target <= watermark {
            return;
        }

        debug!(position, watermark, target, "Index read-ahead");
        if let Err(e) = self.extend_to(data, target) {
            warn!("Index read-ahead stopped at {:?}: {e}", self.watermark());
        }
    }

    /// Offset of the framing of the first unindexed record
    fn next_offset(&self) -> usize {
        self.entries
            .last()
            .map_or(HEADER_SIZE, |entry| entry.payload_end() as usize)
    }

    /// Scan forward until `target` is indexed
    ///
    /// Each entry is committed only after its whole payload is known to be
    /// in bounds, so a failure leaves a valid prefix behind.
    fn extend_to(&mut self, data: &[u8], target: u64) -> Result<()> {
        let from = self.entries.len();
        let mut offset = self.next_offset();

        while (self.entries.len() as u64) <= target {
            let record_type = read_u8(data, offset)?;
            let payload_length = read_u32_le(data, offset + 1)?;
            let payload_offset = offset + RECORD_FRAME_SIZE;
            read_slice(data, payload_offset, payload_length as usize)?;

            self.entries.push(IndexEntry {
                record_type,
                payload_offset: payload_offset as u64,
                payload_length,
            });
            offset = payload_offset + payload_length as usize;
        }

        debug!(from, to = target, offset, "Extended record index");
        Ok(())
    }
}
