//! nescore: a cycle-stepped NES (Nintendo Entertainment System) emulator core.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): the 2A03 CPU core, the 2C02
//! PPU, cartridge mappers, and controller I/O. Audio is not emulated.
//!
//! ## Modules (NESdev references)
//!
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): RAM, PPU,
//!   controllers, save RAM, cartridge; 3 PPU dots per CPU cycle
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading; [Mapper](https://www.nesdev.org/wiki/Mapper) NROM (0), MMC1 (1), CNROM (3), MMC3 (4)
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): $4016 strobe, serial reads
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: table-driven decode, undocumented opcodes, [NMI](https://www.nesdev.org/wiki/NMI) and IRQ
//! - **display** – frame sink the PPU draws into
//! - **nes** – the console driver: step, run a frame
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers), [scrolling](https://www.nesdev.org/wiki/PPU_scrolling), OAM, 256×240

pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod display;
pub mod nes;
pub mod ppu;
