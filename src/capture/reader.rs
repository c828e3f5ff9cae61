//! Capture file reader

use std::cell::RefCell;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::{debug, info};

use super::format::Header;
use super::index::{IndexEntry, LazyIndex};
use super::primitives::read_slice;
use super::record::{CaptureMetadata, Record, RecordType};
use crate::config::ReaderConfig;
use crate::{GcapError, Result};

/// Reader for capture files
///
/// Owns the read-only mapping and the lazily built record index. Decoded
/// records borrow from the mapping, so they cannot outlive the reader or
/// survive [`close`](Self::close).
///
/// The index sits behind a `RefCell`: the reader is `Send` but not `Sync`,
/// and callers sharing it across threads must serialize access.
pub struct CaptureReader {
    path: PathBuf,
    mmap: Option<Mmap>,
    header: Header,
    index: RefCell<LazyIndex>,
}

impl CaptureReader {
    /// Open a capture file with the default configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened or mapped, or its header is
    /// invalid
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_config(path, &ReaderConfig::default())
    }

    /// Open a capture file
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid, the file cannot be
    /// opened or mapped, or its header is invalid
    pub fn open_with_config(path: &Path, config: &ReaderConfig) -> Result<Self> {
        config.validate()?;

        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and captures are not modified
        // while open.
        let mmap = unsafe { Mmap::map(&file)? };

        let header = Header::parse(&mmap)?;

        info!(
            path = %path.display(),
            version = %header.version(),
            records = header.record_count,
            "Opened capture"
        );

        Ok(Self {
            path: path.to_path_buf(),
            mmap: Some(mmap),
            index: RefCell::new(LazyIndex::new(header.record_count, config.read_ahead)),
            header,
        })
    }

    /// Path the capture was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validated header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of records declared by the header
    pub fn record_count(&self) -> u64 {
        self.header.record_count
    }

    /// Highest record position indexed so far
    pub fn watermark(&self) -> Option<u64> {
        self.index.borrow().watermark()
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.mmap.is_none()
    }

    fn data(&self) -> Result<&[u8]> {
        self.mmap.as_deref().ok_or(GcapError::Closed)
    }

    /// Index entry of the record at `position`
    ///
    /// # Errors
    ///
    /// Returns error if the reader is closed, `position` is out of range or
    /// the record stream is truncated
    pub fn index_entry(&self, position: u64) -> Result<IndexEntry> {
        let data = self.data()?;
        self.index.borrow_mut().entry_at(data, position)
    }

    /// Decode the record at `position`
    ///
    /// # Errors
    ///
    /// Returns error if the entry cannot be resolved or the payload does
    /// not decode
    pub fn record_at(&self, position: u64) -> Result<Record<'_>> {
        let entry = self.index_entry(position)?;
        self.decode_entry(&entry)
    }

    fn decode_entry(&self, entry: &IndexEntry) -> Result<Record<'_>> {
        let payload = read_slice(
            self.data()?,
            entry.payload_offset as usize,
            entry.payload_length as usize,
        )?;
        Record::decode(entry, payload)
    }

    /// Header fields merged with the metadata record at position 0
    ///
    /// # Errors
    ///
    /// Returns [`GcapError::MissingMetadataRecord`] if record 0 is absent
    /// or of another type, or the decode error of record 0
    pub fn metadata(&self) -> Result<CaptureMetadata> {
        if self.record_count() == 0 {
            return Err(GcapError::MissingMetadataRecord);
        }

        if self.index_entry(0)?.record_type != RecordType::Metadata as u8 {
            return Err(GcapError::MissingMetadataRecord);
        }

        match self.record_at(0)? {
            Record::Metadata(meta) => Ok(CaptureMetadata::new(&self.header, &meta)),
            Record::Game(_) => Err(GcapError::MissingMetadataRecord),
        }
    }

    /// Iterate over every record in order
    ///
    /// Each call starts again from position 0, reusing the index built so
    /// far.
    pub fn iter(&self) -> Records<'_> {
        self.records_in(0..self.record_count())
    }

    /// Iterate over the records in `range`, clamped to the record count
    pub fn records_in(&self, range: Range<u64>) -> Records<'_> {
        let end = range.end.min(self.record_count());
        Records {
            reader: self,
            positions: range.start.min(end)..end,
        }
    }

    /// Release the mapping
    ///
    /// Any later access fails with [`GcapError::Closed`]. Closing twice is
    /// a no-op.
    pub fn close(&mut self) {
        if self.mmap.take().is_some() {
            debug!(path = %self.path.display(), "Closed capture");
        }
    }
}

impl<'a> IntoIterator for &'a CaptureReader {
    type Item = Result<Record<'a>>;
    type IntoIter = Records<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over decoded records
///
/// A record that fails to decode is yielded as an error and iteration
/// continues. A failure to locate a record (truncated stream, closed
/// reader) is yielded once and ends the iteration.
pub struct Records<'a> {
    reader: &'a CaptureReader,
    positions: Range<u64>,
}

impl Records<'_> {
    /// Position of the next record to be yielded
    pub fn next_position(&self) -> Option<u64> {
        (!self.positions.is_empty()).then_some(self.positions.start)
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.positions.next()?;
        match self.reader.index_entry(position) {
            Ok(entry) => Some(self.reader.decode_entry(&entry)),
            Err(e) => {
                self.positions.start = self.positions.end;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.positions.size_hint()
    }
}
