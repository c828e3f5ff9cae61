//! Record payload decoding

use std::fmt;
use std::time::Duration;

use super::format::Header;
use super::index::IndexEntry;
use super::primitives::{read_u64_le, read_u8};
use super::varstring::VarString;
use crate::{GcapError, Result};

/// Top-level record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    /// Capture title and description
    Metadata = 0,
    /// Game event
    Game = 1,
}

impl TryFrom<u8> for RecordType {
    type Error = GcapError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Metadata),
            1 => Ok(Self::Game),
            other => Err(GcapError::UnsupportedRecordType(other)),
        }
    }
}

/// Game record subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GameRecordKind {
    /// Crypto state; recognized but not decodable
    Crypto = 0,
    /// Network packet
    Packet = 1,
}

impl TryFrom<u8> for GameRecordKind {
    type Error = GcapError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Crypto),
            1 => Ok(Self::Packet),
            other => Err(GcapError::UnsupportedGameRecord(other)),
        }
    }
}

/// Session a packet belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketKind {
    /// Login server session
    Login = 0,
    /// World server session
    Game = 1,
}

impl TryFrom<u8> for PacketKind {
    type Error = GcapError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Login),
            1 => Ok(Self::Game),
            other => Err(GcapError::UnsupportedPacketKind(other)),
        }
    }
}

/// Packet receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Destination {
    /// Sent by the client
    Server = 0,
    /// Sent by the server
    Client = 1,
}

impl Destination {
    /// Side that sent the packet
    pub fn source(self) -> Self {
        match self {
            Self::Server => Self::Client,
            Self::Client => Self::Server,
        }
    }
}

impl TryFrom<u8> for Destination {
    type Error = GcapError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Server),
            1 => Ok(Self::Client),
            other => Err(GcapError::UnsupportedDestination(other)),
        }
    }
}

/// Record 0 payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataRecord<'a> {
    /// Capture title
    pub title: VarString<'a>,
    /// Capture description
    pub description: VarString<'a>,
}

/// Captured network packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketRecord<'a> {
    /// Login or game session
    pub packet_kind: PacketKind,
    /// Receiving side
    pub destination: Destination,
    /// Packet bytes as sent on the wire
    pub raw: &'a [u8],
}

/// Decoded game record body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameBody<'a> {
    /// Network packet
    Packet(PacketRecord<'a>),
}

/// Game event record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRecord<'a> {
    /// Microseconds since capture start
    pub timestamp: u64,
    /// Subtype-specific body
    pub body: GameBody<'a>,
}

impl GameRecord<'_> {
    /// Game record subtype
    pub fn kind(&self) -> GameRecordKind {
        match self.body {
            GameBody::Packet(_) => GameRecordKind::Packet,
        }
    }

    /// Time since capture start
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.timestamp)
    }
}

/// Decoded record borrowing from the capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record<'a> {
    /// Capture metadata
    Metadata(MetadataRecord<'a>),
    /// Game event
    Game(GameRecord<'a>),
}

impl<'a> Record<'a> {
    /// Decode a record payload located by `entry`
    ///
    /// # Errors
    ///
    /// Returns error if the record type or game record subtype is
    /// unsupported, or the payload is malformed
    pub fn decode(entry: &IndexEntry, payload: &'a [u8]) -> Result<Self> {
        match RecordType::try_from(entry.record_type)? {
            RecordType::Metadata => Self::decode_metadata(payload),
            RecordType::Game => Self::decode_game(payload),
        }
    }

    fn decode_metadata(payload: &'a [u8]) -> Result<Self> {
        let (title, consumed) = VarString::decode(payload)?;
        let (description, _) = VarString::decode(&payload[consumed..])?;

        Ok(Self::Metadata(MetadataRecord { title, description }))
    }

    fn decode_game(payload: &'a [u8]) -> Result<Self> {
        let kind = read_u8(payload, 0)?;
        let timestamp = read_u64_le(payload, 1)?;

        let body = match GameRecordKind::try_from(kind)? {
            GameRecordKind::Crypto => return Err(GcapError::UnsupportedGameRecord(kind)),
            GameRecordKind::Packet => {
                let packet_kind = PacketKind::try_from(read_u8(payload, 9)?)?;
                let destination = Destination::try_from(read_u8(payload, 10)?)?;
                let (raw, _) = VarString::decode(&payload[11..])?;

                GameBody::Packet(PacketRecord {
                    packet_kind,
                    destination,
                    raw: raw.as_bytes(),
                })
            }
        };

        Ok(Self::Game(GameRecord { timestamp, body }))
    }

    /// Top-level record type
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::Metadata(_) => RecordType::Metadata,
            Self::Game(_) => RecordType::Game,
        }
    }

    /// Packet record, if this is one
    pub fn as_packet(&self) -> Option<&PacketRecord<'a>> {
        match self {
            Self::Game(GameRecord {
                body: GameBody::Packet(packet),
                ..
            }) => Some(packet),
            Self::Metadata(_) => None,
        }
    }
}

/// Header fields merged with the metadata record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureMetadata {
    /// Format version, "major.minor"
    pub version: String,
    /// Capture revision
    pub capture_revision: u64,
    /// Capture GUID
    pub guid: [u8; 16],
    /// Capture start timestamp
    pub start_time: u64,
    /// Capture end timestamp
    pub end_time: u64,
    /// Number of records
    pub record_count: u64,
    /// Header digest
    pub sha256_hash: [u8; 32],
    /// Capture title
    pub title: String,
    /// Capture description
    pub description: String,
}

impl CaptureMetadata {
    /// Merge header fields into the decoded metadata record
    pub fn new(header: &Header, record: &MetadataRecord<'_>) -> Self {
        Self {
            version: header.version(),
            capture_revision: header.capture_revision,
            guid: header.guid,
            start_time: header.start,
            end_time: header.end,
            record_count: header.record_count,
            sha256_hash: header.sha256_hash,
            title: record.title.to_string_lossy().into_owned(),
            description: record.description.to_string_lossy().into_owned(),
        }
    }

    /// Capture duration in seconds, zero if the end precedes the start
    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

impl fmt::Display for CaptureMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title: \"{}\"", self.title)?;
        writeln!(f, "GUID: {}", hex::encode(self.guid))?;
        writeln!(f)?;
        writeln!(f, "Number of records: {}", self.record_count)?;
        writeln!(f, "Revision: {}", self.capture_revision)?;
        writeln!(
            f,
            "Start: {}    End: {}    Delta: {} seconds",
            self.start_time,
            self.end_time,
            self.duration()
        )?;
        writeln!(f)?;
        writeln!(f, "Description:")?;
        write!(f, "\"{}\"", self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(record_type: u8, payload: &[u8]) -> IndexEntry {
        IndexEntry {
            record_type,
            payload_offset: 0,
            payload_length: payload.len() as u32,
        }
    }

    fn game_payload(kind: u8, timestamp: u64, tail: &[u8]) -> Vec<u8> {
        let mut payload = vec![kind];
        payload.extend_from_slice(&timestamp.to_le_bytes());
        payload.extend_from_slice(tail);
        payload
    }

    #[test]
    fn test_decode_metadata() {
        let payload = [0x00, 5, b't', b'i', b't', b'l', b'e', 0x00, 1, b'd'];

        let record = Record::decode(&entry(0, &payload), &payload).unwrap();
        let Record::Metadata(meta) = record else {
            panic!("expected metadata, got {record:?}");
        };
        assert_eq!(meta.title.as_str(), Some("title"));
        assert_eq!(meta.description.as_str(), Some("d"));
        assert_eq!(record.record_type(), RecordType::Metadata);
    }

    #[test]
    fn test_decode_packet() {
        let payload = game_payload(1, 1_500_000, &[0x01, 0x00, 0x02, 3, 0x00, 0x03, 0xAA]);

        let record = Record::decode(&entry(1, &payload), &payload).unwrap();
        assert_eq!(record.record_type(), RecordType::Game);

        let Record::Game(game) = record else {
            panic!("expected game record");
        };
        assert_eq!(game.kind(), GameRecordKind::Packet);
        assert_eq!(game.timestamp, 1_500_000);
        assert_eq!(game.elapsed(), Duration::from_millis(1_500));

        let packet = record.as_packet().unwrap();
        assert_eq!(packet.packet_kind, PacketKind::Game);
        assert_eq!(packet.destination, Destination::Server);
        assert_eq!(packet.destination.source(), Destination::Client);
        assert_eq!(packet.raw, &[0x00, 0x03, 0xAA]);
    }

    #[test]
    fn test_crypto_record_unsupported() {
        let payload = game_payload(0, 10, &[0xDE, 0xAD]);

        assert!(matches!(
            Record::decode(&entry(1, &payload), &payload),
            Err(GcapError::UnsupportedGameRecord(0))
        ));
    }

    #[test]
    fn test_unknown_types() {
        let payload = game_payload(7, 10, &[]);
        assert!(matches!(
            Record::decode(&entry(1, &payload), &payload),
            Err(GcapError::UnsupportedGameRecord(7))
        ));

        assert!(matches!(
            Record::decode(&entry(9, &payload), &payload),
            Err(GcapError::UnsupportedRecordType(9))
        ));

        let payload = game_payload(1, 10, &[0x05, 0x00, 0x02, 0]);
        assert!(matches!(
            Record::decode(&entry(1, &payload), &payload),
            Err(GcapError::UnsupportedPacketKind(5))
        ));

        let payload = game_payload(1, 10, &[0x00, 0x04, 0x02, 0]);
        assert!(matches!(
            Record::decode(&entry(1, &payload), &payload),
            Err(GcapError::UnsupportedDestination(4))
        ));
    }

    #[test]
    fn test_truncated_game_record() {
        let payload = [1u8, 0, 0];

        assert!(matches!(
            Record::decode(&entry(1, &payload), &payload),
            Err(GcapError::Truncated { .. })
        ));
    }

    #[test]
    fn test_metadata_display() {
        let meta = CaptureMetadata {
            version: "1.0".to_string(),
            capture_revision: 2,
            guid: [0x11; 16],
            start_time: 100,
            end_time: 40,
            record_count: 9,
            sha256_hash: [0; 32],
            title: "t".to_string(),
            description: "d".to_string(),
        };

        let text = meta.to_string();
        assert!(text.starts_with("Title: \"t\"\nGUID: 11111111"));
        assert!(text.contains("Delta: 0 seconds"));
        assert!(text.ends_with("Description:\n\"d\""));
    }
}
