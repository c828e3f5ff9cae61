//! Composite packet unrolling
//!
//! Control packets `0x03`, `0x09` and `0x25` carry other packets. Unrolling
//! replaces each of them with its own two-byte header (four bytes for
//! `0x09`) followed by the unrolled contents, depth first, left to right.
//! Every other packet is returned unchanged. Subpacket lengths that run
//! past the end of the packet are clamped to the bytes that remain.

use super::classify::{classify, AtomicPacket, ControlOpcode, PacketClass};
use crate::config::UnrollConfig;
use crate::{GcapError, Result};

const MULTI_HEADER_LEN: usize = 2;
const SLOTTED_HEADER_LEN: usize = 4;

const GUARD_U8: u8 = 0xFF;
const GUARD_U16: u16 = 0xFFFF;

/// Depth-limited packet unroller
#[derive(Debug, Clone, Copy, Default)]
pub struct Unroller {
    config: UnrollConfig,
}

impl Unroller {
    /// Create an unroller with the given limits
    pub fn new(config: UnrollConfig) -> Self {
        Self { config }
    }

    /// Split `raw` into atomic packets
    ///
    /// # Errors
    ///
    /// Returns error if a MultiPacketEx length cannot be resolved or
    /// nesting exceeds the configured depth. No partial result is returned.
    pub fn unroll<'a>(&self, raw: &'a [u8]) -> Result<Vec<&'a [u8]>> {
        let mut out = Vec::new();
        self.unroll_into(raw, 0, &mut out)?;
        Ok(out)
    }

    fn unroll_into<'a>(
        &self,
        raw: &'a [u8],
        depth: usize,
        out: &mut Vec<&'a [u8]>,
    ) -> Result<()> {
        let PacketClass::Control { opcode } = classify(raw) else {
            out.push(raw);
            return Ok(());
        };
        let Some(composite) = ControlOpcode::from_opcode(opcode) else {
            out.push(raw);
            return Ok(());
        };

        if depth >= self.config.max_depth {
            return Err(GcapError::NestingTooDeep {
                limit: self.config.max_depth,
            });
        }

        match composite {
            ControlOpcode::MultiPacket => {
                out.push(&raw[..MULTI_HEADER_LEN]);
                let mut offset = MULTI_HEADER_LEN;
                while offset < raw.len() {
                    let len = usize::from(raw[offset]);
                    let sub = subpacket(raw, offset + 1, len);
                    self.unroll_into(sub, depth + 1, out)?;
                    offset += 1 + len;
                }
            }
            ControlOpcode::MultiPacketEx => {
                out.push(&raw[..MULTI_HEADER_LEN]);
                let mut offset = MULTI_HEADER_LEN;
                while offset < raw.len() {
                    let (len, width) = ex_length(raw, offset)
                        .ok_or(GcapError::InvalidMultiPacketEx { offset })?;
                    let sub = subpacket(raw, offset + width, len);
                    self.unroll_into(sub, depth + 1, out)?;
                    offset += width + len;
                }
            }
            ControlOpcode::SlottedMetaPacket0 => {
                let (header, rest) = raw.split_at(SLOTTED_HEADER_LEN.min(raw.len()));
                out.push(header);
                self.unroll_into(rest, depth + 1, out)?;
            }
        }

        Ok(())
    }
}

/// `len` bytes from `start`, clamped to the end of `raw`
fn subpacket(raw: &[u8], start: usize, len: usize) -> &[u8] {
    let start = start.min(raw.len());
    let end = start.saturating_add(len).min(raw.len());
    &raw[start..end]
}

/// Resolve an escalating MultiPacketEx length at `offset`
///
/// Returns the length and the width of the length field. A u8 of `0xFF`
/// escalates to a u16, a u16 of `0xFFFF` escalates to a u32, and a u32 is
/// taken as is.
fn ex_length(raw: &[u8], offset: usize) -> Option<(usize, usize)> {
    let short = *raw.get(offset)?;
    if short != GUARD_U8 {
        return Some((usize::from(short), 1));
    }

    let medium = u16::from_le_bytes(raw.get(offset + 1..offset + 3)?.try_into().ok()?);
    if medium != GUARD_U16 {
        return Some((usize::from(medium), 3));
    }

    let long = u32::from_le_bytes(raw.get(offset + 3..offset + 7)?.try_into().ok()?);
    Some((long as usize, 7))
}

/// Split `raw` into atomic packets with the default depth limit
///
/// # Errors
///
/// See [`Unroller::unroll`]
pub fn unroll(raw: &[u8]) -> Result<Vec<&[u8]>> {
    Unroller::default().unroll(raw)
}

/// Split `raw` into classified atomic packets with the default depth limit
///
/// # Errors
///
/// See [`Unroller::unroll`]
pub fn unroll_classified(raw: &[u8]) -> Result<Vec<AtomicPacket<'_>>> {
    Ok(unroll(raw)?.into_iter().map(AtomicPacket::new).collect())
}
