//! Error types for gcap

use std::io;
use thiserror::Error;

/// Result type for gcap operations
pub type Result<T> = std::result::Result<T, GcapError>;

/// Broad failure category of a [`GcapError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File could not be opened, mapped or read
    Io,
    /// Capture bytes violate the container format
    Format,
    /// Capture version is not supported
    Version,
    /// Packet could not be unrolled
    Decode,
    /// Reader configuration is invalid
    Config,
}

/// Errors that can occur while reading captures or unrolling packets
#[derive(Debug, Error)]
pub enum GcapError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File is shorter than the fixed header
    #[error("Invalid header size: got {len} bytes, expected {}", crate::capture::HEADER_SIZE)]
    TruncatedHeader {
        /// Bytes available
        len: usize,
    },

    /// Magic bytes are not "GCAP"
    #[error("Invalid magic bytes: {0:?}")]
    BadMagic([u8; 4]),

    /// Header digest mismatch
    #[error("Header corrupted: expected hash {}, got {}", hex::encode(expected), hex::encode(actual))]
    CorruptHeader {
        /// Digest stored in the header
        expected: [u8; 32],
        /// Digest computed over the header bytes
        actual: [u8; 32],
    },

    /// Capture version other than 1.0
    #[error("Unsupported version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version
        major: u8,
        /// Minor version
        minor: u8,
    },

    /// Unknown top-level record type
    #[error("Unsupported record type {0}")]
    UnsupportedRecordType(u8),

    /// Game record subtype that cannot be decoded (crypto or unknown)
    #[error("Unsupported game record type {0}")]
    UnsupportedGameRecord(u8),

    /// Unknown login/game packet kind
    #[error("Unsupported game packet type {0}")]
    UnsupportedPacketKind(u8),

    /// Unknown packet destination
    #[error("Unsupported packet destination {0}")]
    UnsupportedDestination(u8),

    /// Variable string tag with size class 3
    #[error("Unsupported variable string encoding (tag {0:#04x})")]
    UnsupportedStringEncoding(u8),

    /// Text string that is not valid UTF-8
    #[error("Variable string at offset {offset} is not valid UTF-8")]
    InvalidString {
        /// Offset of the string body within the decoded buffer
        offset: usize,
    },

    /// Read past the end of the available bytes
    #[error("Truncated data at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        /// Offset where the read started
        offset: u64,
        /// Bytes required
        needed: u64,
        /// Bytes available from offset
        available: u64,
    },

    /// Record 0 is absent or not a metadata record
    #[error("All GCAP files must have a metadata record as the first record")]
    MissingMetadataRecord,

    /// Record position outside `0..record_count`
    #[error("Invalid record index {index} (capture has {count} records)")]
    IndexOutOfRange {
        /// Requested position
        index: u64,
        /// Number of records
        count: u64,
    },

    /// Reader used after close
    #[error("Capture is closed")]
    Closed,

    /// MultiPacketEx length field could not be resolved
    #[error("Invalid MultiPacketEx encoding at offset {offset}")]
    InvalidMultiPacketEx {
        /// Offset of the length field within the packet
        offset: usize,
    },

    /// Composite packets nested beyond the configured limit
    #[error("Packet nesting exceeds depth limit of {limit}")]
    NestingTooDeep {
        /// Configured limit
        limit: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GcapError {
    /// Failure category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::UnsupportedVersion { .. } => ErrorKind::Version,
            Self::InvalidMultiPacketEx { .. }
            | Self::NestingTooDeep { .. } => ErrorKind::Decode,
            Self::Config(_) => ErrorKind::Config,
            Self::TruncatedHeader { .. }
            | Self::BadMagic(_)
            | Self::CorruptHeader { .. }
            | Self::UnsupportedRecordType(_)
            | Self::UnsupportedGameRecord(_)
            | Self::UnsupportedPacketKind(_)
            | Self::UnsupportedDestination(_)
            | Self::UnsupportedStringEncoding(_)
            | Self::InvalidString { .. }
            | Self::Truncated { .. }
            | Self::MissingMetadataRecord
            | Self::IndexOutOfRange { .. }
            | Self::Closed => ErrorKind::Format,
        }
    }
}
