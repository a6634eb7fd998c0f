//! NES mappers for PRG/CHR memory mapping.
//!
//! Mapper0 (NROM), Mapper1 (MMC1), Mapper3 (CNROM), Mapper4 (MMC3), and common types.

use crate::cartridge::cartridge::{Cartridge, CartridgeError};
use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::mapper0::Mapper0;
use crate::cartridge::mapper::mapper1::Mapper1;
use crate::cartridge::mapper::mapper3::Mapper3;
use crate::cartridge::mapper::mapper4::Mapper4;

/// Nametable mirroring mode for PPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    /// Both nametable halves read the first 1 KiB page.
    SingleScreenLower,
    /// Both nametable halves read the second 1 KiB page.
    SingleScreenUpper,
    /// Cartridge supplies the extra 2 KiB; all four nametables are distinct.
    FourScreen,
}

pub mod mapper;

pub mod mapper0;
pub mod mapper1;
pub mod mapper3;
pub mod mapper4;

/// Build the mapper named by the cartridge header. Unknown ids fail fast: there is no generic
/// fallback that would behave correctly.
pub fn for_cartridge(cart: Cartridge) -> Result<Box<dyn Mapper>, CartridgeError> {
    if cart.prg_count() == 0 {
        return Err(CartridgeError::NoPrgRom);
    }
    let chr_ram = cart.has_chr_ram();
    let mapper: Box<dyn Mapper> = match cart.mapper_id() {
        0 => Box::new(Mapper0::new(cart)),
        1 => Box::new(Mapper1::new(cart)),
        3 => Box::new(Mapper3::new(cart)),
        4 => Box::new(Mapper4::new(cart)),
        id => return Err(CartridgeError::UnsupportedMapper(id)),
    };
    log::info!(
        "mapper: {}{}",
        mapper.name(),
        if chr_ram { " with CHR RAM" } else { "" }
    );
    Ok(mapper)
}
