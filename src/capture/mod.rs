//! GCAP container format
//!
//! ```text
//! offset 0   magic "GCAP"
//! offset 4   version_major u8, version_minor u8
//! offset 6   capture_revision u64
//! offset 14  guid [16]
//! offset 30  start u64, end u64, record_count u64
//! offset 54  sha256 of bytes 0..54
//! offset 86  records: type u8 | length u32 | payload[length]
//! ```
//!
//! All integers are little-endian.

mod format;
mod index;
mod primitives;
mod reader;
mod record;
mod varstring;

pub use format::{
    header_digest, Header, RawHeader, DIGEST_COVERAGE, DIGEST_SIZE, FILE_MAGIC, FILE_VERSION,
    HEADER_SIZE, RECORD_FRAME_SIZE,
};
pub use index::{IndexEntry, LazyIndex};
pub use reader::{CaptureReader, Records};
pub use record::{
    CaptureMetadata, Destination, GameBody, GameRecord, GameRecordKind, MetadataRecord,
    PacketKind, PacketRecord, Record, RecordType,
};
pub use varstring::{VarString, RAW_KIND};
