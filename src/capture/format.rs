//! Fixed header layout

use bytemuck::{bytes_of, from_bytes, Pod, Zeroable};
use sha2::{Digest, Sha256};

use crate::{GcapError, Result};

/// File magic bytes: "GCAP"
pub const FILE_MAGIC: [u8; 4] = *b"GCAP";

/// Supported format version (major, minor)
pub const FILE_VERSION: (u8, u8) = (1, 0);

/// Header size in bytes
pub const HEADER_SIZE: usize = 86;

/// Trailing digest size
pub const DIGEST_SIZE: usize = 32;

/// Number of header bytes covered by the digest
pub const DIGEST_COVERAGE: usize = HEADER_SIZE - DIGEST_SIZE;

/// Record framing size: type byte + u32 payload length
pub const RECORD_FRAME_SIZE: usize = 5;

/// On-disk header, byte for byte
///
/// Integers are stored as little-endian byte arrays so the struct has no
/// alignment requirement and can be viewed directly over the mapping.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct RawHeader {
    /// Magic bytes for file format identification
    pub magic: [u8; 4],
    /// Major version
    pub version_major: u8,
    /// Minor version
    pub version_minor: u8,
    /// Capture revision
    pub capture_revision: [u8; 8],
    /// Capture GUID
    pub guid: [u8; 16],
    /// Capture start timestamp
    pub start: [u8; 8],
    /// Capture end timestamp
    pub end: [u8; 8],
    /// Number of records
    pub record_count: [u8; 8],
    /// SHA-256 of the preceding header bytes
    pub sha256_hash: [u8; 32],
}

static_assertions::const_assert_eq!(std::mem::size_of::<RawHeader>(), HEADER_SIZE);
static_assertions::const_assert_eq!(std::mem::align_of::<RawHeader>(), 1);

/// Validated capture header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Major version
    pub version_major: u8,
    /// Minor version
    pub version_minor: u8,
    /// Capture revision
    pub capture_revision: u64,
    /// Capture GUID
    pub guid: [u8; 16],
    /// Capture start timestamp
    pub start: u64,
    /// Capture end timestamp
    pub end: u64,
    /// Number of records
    pub record_count: u64,
    /// SHA-256 of the preceding header bytes
    pub sha256_hash: [u8; 32],
}

/// SHA-256 over the digest-covered prefix of a header
pub fn header_digest(bytes: &[u8; HEADER_SIZE]) -> [u8; 32] {
    Sha256::digest(&bytes[..DIGEST_COVERAGE]).into()
}

impl Header {
    /// Parse and validate the fixed header at the start of `bytes`
    ///
    /// Checks run in order: size, magic, digest, version.
    ///
    /// # Errors
    ///
    /// Returns error if the header is short, has the wrong magic, fails its
    /// digest check or carries an unsupported version
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let Some(bytes) = bytes.get(..HEADER_SIZE) else {
            return Err(GcapError::TruncatedHeader { len: bytes.len() });
        };
        let raw: &RawHeader = from_bytes(bytes);

        if raw.magic != FILE_MAGIC {
            return Err(GcapError::BadMagic(raw.magic));
        }

        let actual: [u8; 32] = Sha256::digest(&bytes[..DIGEST_COVERAGE]).into();
        if raw.sha256_hash != actual {
            return Err(GcapError::CorruptHeader {
                expected: raw.sha256_hash,
                actual,
            });
        }

        if (raw.version_major, raw.version_minor) != FILE_VERSION {
            return Err(GcapError::UnsupportedVersion {
                major: raw.version_major,
                minor: raw.version_minor,
            });
        }

        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: &RawHeader) -> Self {
        Self {
            version_major: raw.version_major,
            version_minor: raw.version_minor,
            capture_revision: u64::from_le_bytes(raw.capture_revision),
            guid: raw.guid,
            start: u64::from_le_bytes(raw.start),
            end: u64::from_le_bytes(raw.end),
            record_count: u64::from_le_bytes(raw.record_count),
            sha256_hash: raw.sha256_hash,
        }
    }

    /// On-disk representation of these fields
    pub fn to_raw(&self) -> RawHeader {
        RawHeader {
            magic: FILE_MAGIC,
            version_major: self.version_major,
            version_minor: self.version_minor,
            capture_revision: self.capture_revision.to_le_bytes(),
            guid: self.guid,
            start: self.start.to_le_bytes(),
            end: self.end.to_le_bytes(),
            record_count: self.record_count.to_le_bytes(),
            sha256_hash: self.sha256_hash,
        }
    }

    /// Recompute the digest from the parsed fields
    pub fn compute_digest(&self) -> [u8; 32] {
        let raw = self.to_raw();
        let mut bytes = [0u8; HEADER_SIZE];
        bytes.copy_from_slice(bytes_of(&raw));
        header_digest(&bytes)
    }

    /// Version as "major.minor"
    pub fn version(&self) -> String {
        format!("{}.{}", self.version_major, self.version_minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header_bytes() -> [u8; HEADER_SIZE] {
        let raw = RawHeader {
            magic: FILE_MAGIC,
            version_major: 1,
            version_minor: 0,
            capture_revision: 7u64.to_le_bytes(),
            guid: [0xAB; 16],
            start: 1_000u64.to_le_bytes(),
            end: 5_000u64.to_le_bytes(),
            record_count: 3u64.to_le_bytes(),
            sha256_hash: [0; 32],
        };
        let mut bytes = [0u8; HEADER_SIZE];
        bytes.copy_from_slice(bytes_of(&raw));
        let digest = header_digest(&bytes);
        bytes[DIGEST_COVERAGE..].copy_from_slice(&digest);
        bytes
    }

    #[test]
    fn test_header_layout() {
        assert_eq!(std::mem::size_of::<RawHeader>(), 86);
        assert_eq!(DIGEST_COVERAGE, 54);
    }

    #[test]
    fn test_parse_valid_header() {
        let bytes = sample_header_bytes();
        let header = Header::parse(&bytes).unwrap();

        assert_eq!(header.version(), "1.0");
        assert_eq!(header.capture_revision, 7);
        assert_eq!(header.guid, [0xAB; 16]);
        assert_eq!(header.start, 1_000);
        assert_eq!(header.end, 5_000);
        assert_eq!(header.record_count, 3);
        assert_eq!(&header.sha256_hash[..], &bytes[DIGEST_COVERAGE..]);
    }

    #[test]
    fn test_reserialized_digest_matches() {
        let bytes = sample_header_bytes();
        let header = Header::parse(&bytes).unwrap();

        assert_eq!(header.compute_digest(), header.sha256_hash);
        assert_eq!(bytes_of(&header.to_raw()), &bytes[..]);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample_header_bytes();
        bytes[..4].copy_from_slice(b"PCAP");

        assert!(matches!(
            Header::parse(&bytes),
            Err(GcapError::BadMagic(magic)) if &magic == b"PCAP"
        ));
    }

    #[test]
    fn test_tampered_hash() {
        let mut bytes = sample_header_bytes();
        bytes[20] ^= 0xFF;

        assert!(matches!(
            Header::parse(&bytes),
            Err(GcapError::CorruptHeader { .. })
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = sample_header_bytes();
        bytes[4] = 2;
        let digest = header_digest(&bytes);
        bytes[DIGEST_COVERAGE..].copy_from_slice(&digest);

        assert!(matches!(
            Header::parse(&bytes),
            Err(GcapError::UnsupportedVersion { major: 2, minor: 0 })
        ));
    }

    #[test]
    fn test_short_header() {
        let bytes = sample_header_bytes();

        assert!(matches!(
            Header::parse(&bytes[..40]),
            Err(GcapError::TruncatedHeader { len: 40 })
        ));
    }
}
