//! Tagged variable-length strings
//!
//! Layout: `tag | length | bytes[length]`. The top two bits of the tag pick
//! the width of the length field (1, 2 or 4 bytes, little-endian). The low
//! six bits are the string kind; kind 2 holds raw bytes, every other kind
//! holds UTF-8 text.

use std::borrow::Cow;

use super::primitives::{read_slice, read_u16_le, read_u32_le, read_u8};
use crate::{GcapError, Result};

/// String kind carrying untranslated bytes
pub const RAW_KIND: u8 = 2;

const KIND_MASK: u8 = 0x3F;

/// Decoded variable-length string borrowing from its source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarString<'a> {
    /// UTF-8 text
    Text {
        /// Kind tag (low six bits)
        kind: u8,
        /// Decoded text
        value: &'a str,
    },
    /// Raw bytes (kind 2)
    Raw(&'a [u8]),
}

impl<'a> VarString<'a> {
    /// Decode a string at the start of `data`
    ///
    /// Returns the string and the number of bytes it occupies, tag and
    /// length field included.
    ///
    /// # Errors
    ///
    /// Returns error on size class 3, on truncated input, or when a text
    /// kind carries invalid UTF-8
    pub fn decode(data: &'a [u8]) -> Result<(Self, usize)> {
        let tag = read_u8(data, 0)?;
        let kind = tag & KIND_MASK;

        let (len, width) = match tag >> 6 {
            0 => (usize::from(read_u8(data, 1)?), 1),
            1 => (usize::from(read_u16_le(data, 1)?), 2),
            2 => (read_u32_le(data, 1)? as usize, 4),
            _ => return Err(GcapError::UnsupportedStringEncoding(tag)),
        };

        let start = 1 + width;
        let bytes = read_slice(data, start, len)?;

        let value = if kind == RAW_KIND {
            VarString::Raw(bytes)
        } else {
            let value = std::str::from_utf8(bytes)
                .map_err(|_| GcapError::InvalidString { offset: start })?;
            VarString::Text { kind, value }
        };

        Ok((value, start + len))
    }

    /// Kind tag
    pub fn kind(&self) -> u8 {
        match *self {
            Self::Text { kind, .. } => kind,
            Self::Raw(_) => RAW_KIND,
        }
    }

    /// Underlying bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Self::Text { value, .. } => value.as_bytes(),
            Self::Raw(bytes) => bytes,
        }
    }

    /// Text value, if this is a text kind
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Self::Text { value, .. } => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Text value, replacing invalid UTF-8 in raw strings
    pub fn to_string_lossy(&self) -> Cow<'a, str> {
        match *self {
            Self::Text { value, .. } => Cow::Borrowed(value),
            Self::Raw(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(kind: u8, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        if let Ok(len) = u8::try_from(body.len()) {
            out.push(kind);
            out.push(len);
        } else if let Ok(len) = u16::try_from(body.len()) {
            out.push(0x40 | kind);
            out.extend_from_slice(&len.to_le_bytes());
        } else {
            out.push(0x80 | kind);
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        }
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_size_class_boundaries() {
        let cases = [(0, 0, 1), (255, 0, 1), (256, 1, 2), (65_535, 1, 2), (65_536, 2, 4)];
        for (len, class, width) in cases {
            let body = vec![b'a'; len];
            let encoded = encode(0, &body);
            assert_eq!(encoded[0] >> 6, class, "len {len}");

            let (value, consumed) = VarString::decode(&encoded).unwrap();
            assert_eq!(consumed, 1 + width + len, "len {len}");
            assert_eq!(value.as_bytes().len(), len);
            assert_eq!(value.as_str().map(str::len), Some(len));
        }
    }

    #[test]
    fn test_trailing_bytes_not_consumed() {
        let mut encoded = encode(1, b"title");
        encoded.extend_from_slice(b"rest");

        let (value, consumed) = VarString::decode(&encoded).unwrap();
        assert_eq!(value.as_str(), Some("title"));
        assert_eq!(value.kind(), 1);
        assert_eq!(&encoded[consumed..], b"rest");
    }

    #[test]
    fn test_raw_kind() {
        let encoded = encode(RAW_KIND, &[0xFF, 0x00, 0xFE]);

        let (value, consumed) = VarString::decode(&encoded).unwrap();
        assert_eq!(value, VarString::Raw(&[0xFF, 0x00, 0xFE]));
        assert_eq!(value.as_str(), None);
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_invalid_utf8_text() {
        let encoded = encode(0, &[0xFF, 0xFE]);

        assert!(matches!(
            VarString::decode(&encoded),
            Err(GcapError::InvalidString { offset: 2 })
        ));
    }

    #[test]
    fn test_unsupported_size_class() {
        assert!(matches!(
            VarString::decode(&[0xC0, 0x00]),
            Err(GcapError::UnsupportedStringEncoding(0xC0))
        ));
    }

    #[test]
    fn test_truncated_body() {
        assert!(matches!(
            VarString::decode(&[0x00, 0x05, b'a']),
            Err(GcapError::Truncated { .. })
        ));
        assert!(VarString::decode(&[]).is_err());
    }
}
