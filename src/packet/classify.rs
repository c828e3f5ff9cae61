//! Packet classification

/// Wire classification of a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketClass {
    /// Byte 0 is zero; opcode is byte 1
    Control {
        /// Control opcode
        opcode: u8,
    },
    /// Byte 0 is the opcode
    Game {
        /// Game opcode
        opcode: u8,
    },
    /// Empty packet, or a lone zero byte
    Unclassified,
}

impl PacketClass {
    /// Bytes taken by the type header
    pub fn header_len(self) -> usize {
        match self {
            Self::Control { .. } => 2,
            Self::Game { .. } => 1,
            Self::Unclassified => 0,
        }
    }
}

/// Classify a packet by its leading bytes
pub fn classify(raw: &[u8]) -> PacketClass {
    match raw {
        [] | [0] => PacketClass::Unclassified,
        [0, opcode, ..] => PacketClass::Control { opcode: *opcode },
        [opcode, ..] => PacketClass::Game { opcode: *opcode },
    }
}

/// Control opcodes that bundle other packets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlOpcode {
    /// u8-length-prefixed subpackets
    MultiPacket = 0x03,
    /// Slot header followed by one packet
    SlottedMetaPacket0 = 0x09,
    /// Subpackets with escalating u8/u16/u32 lengths
    MultiPacketEx = 0x25,
}

impl ControlOpcode {
    /// Composite opcode for a control opcode, if it is one
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            0x03 => Some(Self::MultiPacket),
            0x09 => Some(Self::SlottedMetaPacket0),
            0x25 => Some(Self::MultiPacketEx),
            _ => None,
        }
    }

    /// Protocol name
    pub fn name(self) -> &'static str {
        match self {
            Self::MultiPacket => "MultiPacket",
            Self::SlottedMetaPacket0 => "SlottedMetaPacket0",
            Self::MultiPacketEx => "MultiPacketEx",
        }
    }
}

/// Opcode name lookup for both packet namespaces
pub trait OpcodeTable {
    /// Human-readable name of an opcode
    fn name(&self, class: PacketClass) -> Option<&str>;

    /// Whether the opcode's meaning is not known
    fn is_unknown(&self, class: PacketClass) -> bool {
        self.name(class).is_none()
    }
}

/// An unrolled packet and its classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicPacket<'a> {
    /// Packet bytes
    pub raw: &'a [u8],
    /// Classification of `raw`
    pub class: PacketClass,
}

impl<'a> AtomicPacket<'a> {
    /// Classify `raw`
    pub fn new(raw: &'a [u8]) -> Self {
        Self {
            raw,
            class: classify(raw),
        }
    }

    /// Name of this packet's opcode in `table`
    pub fn name<'t>(&self, table: &'t impl OpcodeTable) -> Option<&'t str> {
        table.name(self.class)
    }
}
