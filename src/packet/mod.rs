//! Game packet classification and unrolling

mod classify;
mod unroll;

pub use classify::{classify, AtomicPacket, ControlOpcode, OpcodeTable, PacketClass};
pub use unroll::{unroll, unroll_classified, Unroller};
