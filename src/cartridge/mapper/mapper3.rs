//! Mapper 3 (CNROM): fixed PRG, one register switching the whole 8 KiB CHR window.
//!
//! [CNROM](https://www.nesdev.org/wiki/CNROM): any write to $8000–$FFFF selects the CHR bank.
//! Bus conflicts are not modelled.

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

pub struct Mapper3 {
    cart: Cartridge,
    chr_bank: u8,
}

impl Mapper3 {
    pub fn new(cart: Cartridge) -> Self {
        Self { cart, chr_bank: 0 }
    }
}

impl Mapper for Mapper3 {
    fn name(&self) -> &'static str {
        "CNROM"
    }

    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            0x8000..=0xBFFF => self.cart.prg_bank(0)[(addr & 0x3FFF) as usize],
            0xC000..=0xFFFF => self.cart.prg_bank(1)[(addr & 0x3FFF) as usize],
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, data: u8) {
        if addr >= 0x8000 {
            self.chr_bank = data;
            log::debug!("CNROM: CHR bank {}", data as usize % self.cart.chr_count().max(1));
        }
    }

    fn read_chr(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.cart.chr_bank(self.chr_bank as usize)[addr as usize],
            _ => 0,
        }
    }

    fn write_chr(&mut self, addr: u16, data: u8) {
        if addr < 0x2000 {
            let banks = self.cart.chr_count().max(1);
            let offset = (self.chr_bank as usize % banks) * 0x2000 + addr as usize;
            self.cart.write_chr(offset, data);
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.cart.mirroring()
    }
}
