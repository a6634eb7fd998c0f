//! Mapper trait: PRG/CHR memory access, mirroring and scanline IRQs.

use crate::cartridge::mapper::Mirroring;

/// Trait for NES cartridge mappers. CPU/PPU use these for all cartridge address space.
///
/// Reads outside a mapper's windows return 0 and writes there are ignored.
pub trait Mapper {
    /// Short board name for logs.
    fn name(&self) -> &'static str;
    /// Read PRG ROM ($8000–$FFFF).
    fn read_prg(&self, addr: u16) -> u8;
    /// Write into PRG space: mapper registers (PRG ROM itself is read-only).
    fn write_prg(&mut self, addr: u16, data: u8);
    /// Read pattern memory ($0000–$1FFF).
    fn read_chr(&self, addr: u16) -> u8;
    /// Write pattern memory; only CHR RAM boards store the byte.
    fn write_chr(&mut self, addr: u16, data: u8);
    /// Current nametable mirroring for the PPU.
    fn mirroring(&self) -> Mirroring;
    /// Clocked by the PPU once per rendered scanline. Only scanline-counting boards care.
    fn tick_scanline(&mut self) {}
    /// Whether $6000–$7FFF save RAM currently responds.
    fn prg_ram_enabled(&self) -> bool {
        true
    }
    /// Whether writes to save RAM are accepted.
    fn prg_ram_writable(&self) -> bool {
        self.prg_ram_enabled()
    }
    /// Level of the cartridge IRQ line.
    fn irq_pending(&self) -> bool {
        false
    }
}
