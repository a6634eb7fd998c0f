//! Mapper 1 (MMC1): bank switching via 5-bit shift register.
//!
//! [MMC1](https://www.nesdev.org/wiki/MMC1): writes to $8000–$9FFF (control), $A000–$BFFF (CHR0),
//! $C000–$DFFF (CHR1), $E000–$FFFF (PRG bank). Any write with bit 7 set resets the shift register.
//! Otherwise, bit 0 is shifted in (LSB first); on the fifth write the value is latched into the
//! register selected by address bits 13–14 of that fifth write. Control bits 0–1 = mirroring,
//! bits 2–3 = PRG mode, bit 4 = CHR mode (8 KiB or two 4 KiB banks).
//!
//! SUROM boards (512 KiB PRG) reuse CHR0 bit 4 to pick the 256 KiB PRG half.

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

/// MMC1 state: 5-bit shift register, control byte (mirroring + PRG/CHR mode), bank selects.
pub struct Mapper1 {
    cart: Cartridge,
    shift_reg: u8,
    shift_count: u8,
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
}

impl Mapper1 {
    /// Control defaults to $0C (PRG mode 3: $8000 switchable, $C000 fixed last).
    pub fn new(cart: Cartridge) -> Self {
        Self {
            cart,
            shift_reg: 0,
            shift_count: 0,
            control: 0x0C,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
        }
    }

    /// PRG bank mode from control bits 2–3: 0/1 = 32 KiB mode; 2 = $8000 fixed first,
    /// $C000 switchable; 3 = $8000 switchable, $C000 fixed last.
    fn prg_bank_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    /// First 16 KiB bank of the active 256 KiB PRG half (non-zero only on SUROM).
    fn prg_outer_base(&self) -> usize {
        if self.cart.prg_count() > 16 {
            (self.chr_bank0 & 0x10) as usize
        } else {
            0
        }
    }

    /// 16 KiB banks mapped at $8000 and $C000.
    fn prg_banks(&self) -> (usize, usize) {
        let base = self.prg_outer_base();
        let bank = base + (self.prg_bank & 0x0F) as usize;
        let last = base + self.cart.prg_count().clamp(1, 16) - 1;
        match self.prg_bank_mode() {
            0 | 1 => {
                let pair = bank & !1;
                (pair, pair + 1)
            }
            2 => (base, bank),
            _ => (bank, last),
        }
    }

    /// 4 KiB CHR bank mapped at `addr` ($0000 or $1000 half).
    fn chr_bank_4k(&self, addr: u16) -> usize {
        let upper = addr & 0x1000 != 0;
        if self.control & 0x10 == 0 {
            // 8 KiB mode ignores the low bit of CHR0.
            ((self.chr_bank0 & 0x1E) as usize) | upper as usize
        } else if upper {
            self.chr_bank1 as usize
        } else {
            self.chr_bank0 as usize
        }
    }

    fn latch(&mut self, addr: u16, value: u8) {
        match (addr >> 13) & 0b11 {
            0 => self.control = value,
            1 => self.chr_bank0 = value,
            2 => self.chr_bank1 = value,
            _ => self.prg_bank = value,
        }
        log::debug!(
            "MMC1: ${:04X} <- {:05b} (control {:05b}, chr {:02X}/{:02X}, prg {:02X})",
            addr,
            value,
            self.control,
            self.chr_bank0,
            self.chr_bank1,
            self.prg_bank
        );
    }
}

impl Mapper for Mapper1 {
    fn name(&self) -> &'static str {
        "MMC1"
    }

    fn read_prg(&self, addr: u16) -> u8 {
        let (low, high) = self.prg_banks();
        match addr {
            0x8000..=0xBFFF => self.cart.prg_bank(low)[(addr & 0x3FFF) as usize],
            0xC000..=0xFFFF => self.cart.prg_bank(high)[(addr & 0x3FFF) as usize],
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, data: u8) {
        if addr < 0x8000 {
            return;
        }
        // Bit 7 set aborts the serial sequence and forces PRG mode 3.
        if data & 0x80 != 0 {
            self.shift_reg = 0;
            self.shift_count = 0;
            self.control |= 0x0C;
            return;
        }

        self.shift_reg >>= 1;
        self.shift_reg |= (data & 1) << 4;
        self.shift_count += 1;

        if self.shift_count < 5 {
            return;
        }

        let value = self.shift_reg & 0x1F;
        self.latch(addr, value);
        self.shift_reg = 0;
        self.shift_count = 0;
    }

    fn read_chr(&self, addr: u16) -> u8 {
        if addr >= 0x2000 {
            return 0;
        }
        self.cart.chr_bank_4k(self.chr_bank_4k(addr))[(addr & 0x0FFF) as usize]
    }

    fn write_chr(&mut self, addr: u16, data: u8) {
        if addr >= 0x2000 {
            return;
        }
        let banks = (self.cart.chr_count() * 2).max(1);
        let bank = self.chr_bank_4k(addr) % banks;
        self.cart
            .write_chr(bank * 0x1000 + (addr & 0x0FFF) as usize, data);
    }

    /// Mirroring from control bits 0–1: 0 = one-screen lower, 1 = one-screen upper,
    /// 2 = vertical, 3 = horizontal.
    fn mirroring(&self) -> Mirroring {
        match self.control & 0b11 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }

    /// PRG RAM enable: bit 4 of the PRG register clear.
    fn prg_ram_enabled(&self) -> bool {
        self.prg_bank & 0x10 == 0
    }
}
