//! PPU address space: pattern tables (through the mapper), nametables with mirroring, and
//! palette RAM.
//!
//! See [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map) and
//! [Mirroring](https://www.nesdev.org/wiki/Mirroring).

use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

/// Nametable RAM plus palette RAM. Pattern tables belong to the cartridge.
pub struct PictureMemory {
    /// Four 1 KiB pages; only the first two are used unless the board is four-screen.
    pub nametables: [u8; 0x1000],
    /// Palette RAM $3F00-$3F1F (32 bytes, with NES mirroring).
    pub palette: [u8; 32],
}

impl PictureMemory {
    pub fn new() -> Self {
        Self {
            nametables: [0; 0x1000],
            palette: [0; 32],
        }
    }

    /// Read a byte of PPU address space ($0000–$3FFF, higher bits ignored).
    pub fn read(&self, addr: u16, mapper: &dyn Mapper) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => mapper.read_chr(addr),
            0x2000..=0x3EFF => self.nametables[map_nametable_addr(addr, mapper.mirroring())],
            _ => self.palette[palette_index(addr)],
        }
    }

    /// Write a byte of PPU address space. Pattern writes go to the mapper (CHR RAM only).
    pub fn write(&mut self, addr: u16, data: u8, mapper: &mut dyn Mapper) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => mapper.write_chr(addr, data),
            0x2000..=0x3EFF => {
                let index = map_nametable_addr(addr, mapper.mirroring());
                self.nametables[index] = data;
            }
            // Upper 2 bits of palette entries do not exist on real NES.
            _ => self.palette[palette_index(addr)] = data & 0x3F,
        }
    }

    /// Nametable byte for an address in $2000–$2FFF (or its $3000 mirror).
    pub fn nametable(&self, addr: u16, mirroring: Mirroring) -> u8 {
        self.nametables[map_nametable_addr(addr, mirroring)]
    }

    /// Palette entry `index` (0–31) as a 6-bit NES color number.
    pub fn palette_color(&self, index: usize) -> u8 {
        self.palette[palette_index(index as u16)]
    }
}

impl Default for PictureMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve palette address $3F00–$3F1F (and $3F20–$3FFF mirrors) to a 32-byte index.
/// $3F10, $3F14, $3F18, $3F1C mirror $3F00, $3F04, $3F08, $3F0C.
pub fn palette_index(addr: u16) -> usize {
    let i = (addr & 0x1F) as usize;
    if i >= 16 && i % 4 == 0 { i - 16 } else { i }
}

/// Map a nametable address ($2000–$3EFF) to an index into the 4 KiB nametable RAM.
pub fn map_nametable_addr(addr: u16, mirroring: Mirroring) -> usize {
    let addr = (addr & 0x0FFF) as usize;
    let table = addr / 0x400;
    let offset = addr & 0x3FF;

    let page = match mirroring {
        Mirroring::Vertical => table & 1,
        Mirroring::Horizontal => table >> 1,
        Mirroring::SingleScreenLower => 0,
        Mirroring::SingleScreenUpper => 1,
        Mirroring::FourScreen => table,
    };
    page * 0x400 + offset
}
