//! Mapper 0 (NROM): no bank switching, 16/32 KiB PRG, 8 KiB CHR ROM or RAM.

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

/// NROM mapper: fixed PRG and CHR, 16 KiB PRG mirrored into $C000–$FFFF.
pub struct Mapper0 {
    cart: Cartridge,
}

impl Mapper0 {
    pub fn new(cart: Cartridge) -> Self {
        Self { cart }
    }
}

impl Mapper for Mapper0 {
    fn name(&self) -> &'static str {
        "NROM"
    }

    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            // Bank 1 wraps to bank 0 on NROM-128.
            0x8000..=0xBFFF => self.cart.prg_bank(0)[(addr & 0x3FFF) as usize],
            0xC000..=0xFFFF => self.cart.prg_bank(1)[(addr & 0x3FFF) as usize],
            _ => 0,
        }
    }

    fn write_prg(&mut self, _addr: u16, _data: u8) {}

    fn read_chr(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.cart.chr_bank(0)[addr as usize],
            _ => 0,
        }
    }

    fn write_chr(&mut self, addr: u16, data: u8) {
        if addr < 0x2000 {
            self.cart.write_chr(addr as usize, data);
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.cart.mirroring()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prg(banks: usize) -> Vec<u8> {
        let mut prg = vec![0; banks * 0x4000];
        for (i, b) in prg.iter_mut().enumerate() {
            *b = (i / 0x4000) as u8 + 1;
        }
        prg
    }

    #[test]
    fn nrom_128_mirrors_the_single_bank() {
        let m = Mapper0::new(Cartridge::new(prg(1), vec![], 0, Mirroring::Horizontal));
        assert_eq!(m.read_prg(0x8000), 1);
        assert_eq!(m.read_prg(0xC000), 1);
        assert_eq!(m.read_prg(0xFFFF), 1);
    }

    #[test]
    fn nrom_256_maps_both_banks() {
        let m = Mapper0::new(Cartridge::new(prg(2), vec![], 0, Mirroring::Horizontal));
        assert_eq!(m.read_prg(0xBFFF), 1);
        assert_eq!(m.read_prg(0xC000), 2);
    }

    #[test]
    fn chr_ram_is_writable_and_mirroring_follows_header() {
        let mut m = Mapper0::new(Cartridge::new(prg(1), vec![], 0, Mirroring::Vertical));
        m.write_chr(0x1234, 0xAB);
        assert_eq!(m.read_chr(0x1234), 0xAB);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn out_of_window_reads_are_zero() {
        let m = Mapper0::new(Cartridge::new(prg(1), vec![], 0, Mirroring::Vertical));
        assert_eq!(m.read_prg(0x6000), 0);
        assert_eq!(m.read_chr(0x2000), 0);
    }
}
