//! 2A03 CPU: a 6502 core without decimal mode.
//!
//! Instructions are decoded through the [`opcodes::OPCODES`] table (documented and undocumented
//! opcodes) and executed against a [`crate::bus::Bus`]. Interrupts are sampled between
//! instructions.

pub mod cpu;
pub mod flags;
pub mod opcodes;
