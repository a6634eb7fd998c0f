//! Status register (P) bits.

pub const FLAG_CARRY: u8 = 0x01;
pub const FLAG_ZERO: u8 = 0x02;
pub const FLAG_INTERRUPT_DISABLE: u8 = 0x04;
/// Stored and restored, but the 2A03 has no decimal mode.
pub const FLAG_DECIMAL: u8 = 0x08;
/// Only exists in pushed copies of P: set by BRK/PHP, clear for NMI/IRQ.
pub const FLAG_BREAK: u8 = 0x10;
/// Reads as 1.
pub const FLAG_UNUSED: u8 = 0x20;
pub const FLAG_OVERFLOW: u8 = 0x40;
pub const FLAG_NEGATIVE: u8 = 0x80;
