//! NES cartridge loading and mapper support.
//!
//! - **cartridge**: Loads iNES (.nes) files, holds PRG/CHR banks and header metadata.
//! - **mapper**: NROM (0), MMC1 (1), CNROM (3), MMC3 (4); PRG/CHR bank switching, nametable
//!   mirroring and the MMC3 scanline IRQ.

pub mod cartridge;
pub mod mapper;
