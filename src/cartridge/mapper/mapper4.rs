//! Mapper 4 (MMC3): 8 KiB PRG banking, 1/2 KiB CHR banking, switchable mirroring, scanline IRQ.
//!
//! [MMC3](https://www.nesdev.org/wiki/MMC3): Bank select at $8000–$9FFE (even), bank data at
//! $8001–$9FFF (odd). R0/R1 = 2 KiB CHR, R2–R5 = 1 KiB CHR, R6/R7 = 8 KiB PRG. Mirroring at
//! $A000–$BFFE (even). IRQ latch $C000, reload $C001, disable $E000, enable $E001. The IRQ counter
//! is clocked once per rendered scanline by the PPU through [`Mapper::tick_scanline`].

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

/// MMC3 state: bank registers, mirroring, IRQ counter/latch/enable.
pub struct Mapper4 {
    cart: Cartridge,
    /// Bank select ($8000): bits 0–2 = register index, bit 6 = PRG mode, bit 7 = CHR A12 invert.
    bank_select: u8,
    /// R0–R5 CHR, R6–R7 PRG.
    regs: [u8; 8],
    mirroring: Mirroring,
    /// PRG RAM enable / write protect ($A001).
    prg_ram_enable: bool,
    prg_ram_write_protect: bool,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload_pending: bool,
    irq_enabled: bool,
    irq_pending: bool,
}

impl Mapper4 {
    pub fn new(cart: Cartridge) -> Self {
        let mirroring = match cart.mirroring() {
            Mirroring::FourScreen => Mirroring::FourScreen,
            _ => Mirroring::Vertical,
        };
        Self {
            cart,
            bank_select: 0,
            regs: [0, 2, 4, 5, 6, 7, 0, 1],
            mirroring,
            prg_ram_enable: true,
            prg_ram_write_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload_pending: false,
            irq_enabled: false,
            irq_pending: false,
        }
    }

    fn prg_bank_count(&self) -> usize {
        (self.cart.prg_count() * 2).max(1)
    }

    /// 8 KiB PRG bank visible in window `slot` (0 = $8000, 1 = $A000, 2 = $C000, 3 = $E000).
    fn prg_bank(&self, slot: usize) -> usize {
        let last = self.prg_bank_count() - 1;
        let second_last = last.saturating_sub(1);
        let r6 = (self.regs[6] & 0x3F) as usize;
        let r7 = (self.regs[7] & 0x3F) as usize;
        let swapped = self.bank_select & 0x40 != 0;
        match (slot, swapped) {
            (0, false) => r6,
            (0, true) => second_last,
            (1, _) => r7,
            (2, false) => second_last,
            (2, true) => r6,
            _ => last,
        }
    }

    /// 1 KiB CHR bank visible in 1 KiB window `slot` (0..8) of the pattern space.
    fn chr_bank(&self, slot: usize) -> usize {
        // With inversion the 2 KiB pair moves to $1000 and the 1 KiB quad to $0000.
        let slot = if self.bank_select & 0x80 != 0 {
            slot ^ 4
        } else {
            slot
        };
        match slot {
            0 | 1 => (self.regs[0] & 0xFE) as usize + slot,
            2 | 3 => (self.regs[1] & 0xFE) as usize + (slot - 2),
            _ => self.regs[slot - 2] as usize,
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let banks = (self.cart.chr_count() * 8).max(1);
        let bank = self.chr_bank((addr as usize >> 10) & 7) % banks;
        bank * 0x400 + (addr & 0x3FF) as usize
    }
}

impl Mapper for Mapper4 {
    fn name(&self) -> &'static str {
        "MMC3"
    }

    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            0x8000..=0xFFFF => {
                let slot = ((addr - 0x8000) >> 13) as usize;
                self.cart.prg_bank_8k(self.prg_bank(slot))[(addr & 0x1FFF) as usize]
            }
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, data: u8) {
        let even = addr & 1 == 0;
        match addr {
            0x8000..=0x9FFF if even => self.bank_select = data,
            0x8000..=0x9FFF => {
                let r = (self.bank_select & 7) as usize;
                self.regs[r] = data;
                log::debug!("MMC3: R{} <- {:02X}", r, data);
            }
            0xA000..=0xBFFF if even => {
                if self.mirroring != Mirroring::FourScreen {
                    self.mirroring = if data & 1 == 0 {
                        Mirroring::Vertical
                    } else {
                        Mirroring::Horizontal
                    };
                }
            }
            0xA000..=0xBFFF => {
                self.prg_ram_enable = data & 0x80 != 0;
                self.prg_ram_write_protect = data & 0x40 != 0;
            }
            0xC000..=0xDFFF if even => self.irq_latch = data,
            0xC000..=0xDFFF => {
                self.irq_counter = 0;
                self.irq_reload_pending = true;
            }
            0xE000..=0xFFFF if even => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            0xE000..=0xFFFF => self.irq_enabled = true,
            _ => {}
        }
    }

    fn read_chr(&self, addr: u16) -> u8 {
        if addr >= 0x2000 {
            return 0;
        }
        let offset = self.chr_offset(addr);
        self.cart.chr_bank_1k(offset / 0x400)[offset & 0x3FF]
    }

    fn write_chr(&mut self, addr: u16, data: u8) {
        if addr < 0x2000 {
            let offset = self.chr_offset(addr);
            self.cart.write_chr(offset, data);
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Reload from the latch when the counter is zero or a reload was requested, otherwise
    /// decrement; raise the IRQ when the result is zero and IRQs are enabled.
    fn tick_scanline(&mut self) {
        if self.irq_counter == 0 || self.irq_reload_pending {
            self.irq_counter = self.irq_latch;
            self.irq_reload_pending = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    fn prg_ram_enabled(&self) -> bool {
        self.prg_ram_enable
    }

    fn prg_ram_writable(&self) -> bool {
        self.prg_ram_enable && !self.prg_ram_write_protect
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }
}
