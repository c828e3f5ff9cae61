//! Bounds-checked little-endian readers

use crate::{GcapError, Result};

fn truncated(data: &[u8], offset: usize, needed: usize) -> GcapError {
    GcapError::Truncated {
        offset: offset as u64,
        needed: needed as u64,
        available: data.len().saturating_sub(offset) as u64,
    }
}

/// Borrow `len` bytes starting at `offset`
pub(crate) fn read_slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| truncated(data, offset, len))
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(read_slice(data, offset, N)?);
    Ok(out)
}

pub(crate) fn read_u8(data: &[u8], offset: usize) -> Result<u8> {
    data.get(offset).copied().ok_or_else(|| truncated(data, offset, 1))
}

pub(crate) fn read_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    read_array(data, offset).map(u16::from_le_bytes)
}

pub(crate) fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    read_array(data, offset).map(u32::from_le_bytes)
}

pub(crate) fn read_u64_le(data: &[u8], offset: usize) -> Result<u64> {
    read_array(data, offset).map(u64::from_le_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];
        assert_eq!(read_u8(&data, 0).unwrap(), 0x01);
        assert_eq!(read_u16_le(&data, 1).unwrap(), 0x0302);
        assert_eq!(read_u32_le(&data, 0).unwrap(), 0x0403_0201);
        assert_eq!(read_u64_le(&data, 1).unwrap(), 0x0908_0706_0504_0302);
        assert_eq!(read_slice(&data, 7, 2).unwrap(), &[0x08, 0x09]);
    }

    #[test]
    fn test_truncated_reads() {
        let data = [0u8; 3];
        assert!(matches!(
            read_u32_le(&data, 1),
            Err(GcapError::Truncated { offset: 1, needed: 4, available: 2 })
        ));
        assert!(read_u8(&data, 3).is_err());
        assert!(read_slice(&data, usize::MAX, 2).is_err());
    }
}
