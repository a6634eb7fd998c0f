//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mapper, mirroring, trainer and
//! four-screen VRAM), an optional 512-byte trainer, then PRG ROM, then CHR ROM. A CHR size of zero
//! means the board carries 8 KiB of CHR RAM instead.
//!
//! The cartridge only holds bank data and header metadata. Bank switching lives in the
//! [mapper](crate::cartridge::mapper), which picks which of these banks is visible.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::cartridge::mapper::Mirroring;

pub const HEADER_LEN: usize = 16;
pub const TRAINER_LEN: usize = 512;
pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;

const MAGIC: &[u8; 4] = b"NES\x1A";

/// Errors raised while loading a cartridge image. None of these are recoverable.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("failed to read ROM: {0}")]
    Io(#[from] std::io::Error),
    #[error("not an iNES image (bad header magic)")]
    BadMagic,
    #[error("ROM image truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("ROM image has no PRG ROM")]
    NoPrgRom,
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),
}

/// Raw PRG/CHR banks plus the header fields the mappers need.
pub struct Cartridge {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_ram: bool,
    mapper_id: u8,
    mirroring: Mirroring,
}

impl Cartridge {
    /// Load cartridge from an iNES file on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Parse an in-memory iNES image. Header bytes 4–5 = PRG/CHR size; bytes 6–7 = mapper number
    /// (low nibble from flags 6, high nibble from flags 7).
    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN {
            return Err(CartridgeError::Truncated {
                expected: HEADER_LEN,
                found: data.len(),
            });
        }
        if &data[0..4] != MAGIC {
            return Err(CartridgeError::BadMagic);
        }

        if data[4] == 0 {
            return Err(CartridgeError::NoPrgRom);
        }

        let prg_rom_size = data[4] as usize * PRG_BANK_SIZE;
        let chr_rom_size = data[5] as usize * CHR_BANK_SIZE;
        let flags6 = data[6];
        let flags7 = data[7];

        let mapper_id = (flags6 >> 4) | (flags7 & 0xF0);
        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        // Trainer (flags 6 bit 2) sits between header and PRG; we skip it.
        let prg_start = if flags6 & 0x04 != 0 {
            HEADER_LEN + TRAINER_LEN
        } else {
            HEADER_LEN
        };
        let prg_end = prg_start + prg_rom_size;
        let chr_end = prg_end + chr_rom_size;
        if data.len() < chr_end {
            return Err(CartridgeError::Truncated {
                expected: chr_end,
                found: data.len(),
            });
        }

        let prg_rom = data[prg_start..prg_end].to_vec();
        let (chr, chr_ram) = if chr_rom_size > 0 {
            (data[prg_end..chr_end].to_vec(), false)
        } else {
            (vec![0; CHR_BANK_SIZE], true)
        };

        log::info!(
            "cartridge: mapper {}, {} PRG bank(s), {} CHR bank(s){}, {:?} mirroring",
            mapper_id,
            data[4],
            data[5],
            if chr_ram { " (8 KiB CHR RAM)" } else { "" },
            mirroring
        );

        Ok(Self {
            prg_rom,
            chr,
            chr_ram,
            mapper_id,
            mirroring,
        })
    }

    /// Build a cartridge directly from bank data (used by tests and tools).
    pub fn new(prg_rom: Vec<u8>, chr_rom: Vec<u8>, mapper_id: u8, mirroring: Mirroring) -> Self {
        let chr_ram = chr_rom.is_empty();
        let chr = if chr_ram { vec![0; CHR_BANK_SIZE] } else { chr_rom };
        Self {
            prg_rom,
            chr,
            chr_ram,
            mapper_id,
            mirroring,
        }
    }

    /// Number of 16 KiB PRG banks.
    pub fn prg_count(&self) -> usize {
        self.prg_rom.len() / PRG_BANK_SIZE
    }

    /// Number of 8 KiB CHR banks (CHR RAM counts as one).
    pub fn chr_count(&self) -> usize {
        self.chr.len() / CHR_BANK_SIZE
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn mapper_id(&self) -> u8 {
        self.mapper_id
    }

    pub fn has_chr_ram(&self) -> bool {
        self.chr_ram
    }

    /// 16 KiB PRG bank `n`, wrapped to the bank count.
    pub fn prg_bank(&self, n: usize) -> &[u8] {
        bank(&self.prg_rom, PRG_BANK_SIZE, n)
    }

    /// 8 KiB PRG bank `n` (MMC3 granularity).
    pub fn prg_bank_8k(&self, n: usize) -> &[u8] {
        bank(&self.prg_rom, 0x2000, n)
    }

    /// 8 KiB CHR bank `n`.
    pub fn chr_bank(&self, n: usize) -> &[u8] {
        bank(&self.chr, CHR_BANK_SIZE, n)
    }

    /// 4 KiB CHR bank `n` (MMC1 granularity).
    pub fn chr_bank_4k(&self, n: usize) -> &[u8] {
        bank(&self.chr, 0x1000, n)
    }

    /// 1 KiB CHR bank `n` (MMC3 granularity).
    pub fn chr_bank_1k(&self, n: usize) -> &[u8] {
        bank(&self.chr, 0x400, n)
    }

    /// Write into CHR RAM at an absolute offset. Ignored for CHR ROM.
    pub fn write_chr(&mut self, offset: usize, data: u8) {
        if !self.chr_ram {
            return;
        }
        if let Some(b) = self.chr.get_mut(offset) {
            *b = data;
        }
    }
}

/// Slice out bank `n` of `size` bytes; bank numbers wrap around the available banks the way
/// unconnected high bank lines do on real boards. Empty data yields an empty slice.
fn bank(data: &[u8], size: usize, n: usize) -> &[u8] {
    let count = data.len() / size;
    if count == 0 {
        return &data[0..0];
    }
    let start = (n % count) * size;
    &data[start..start + size]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(prg: u8, chr: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut data = vec![b'N', b'E', b'S', 0x1A, prg, chr, flags6, flags7];
        data.resize(HEADER_LEN, 0);
        if flags6 & 0x04 != 0 {
            data.extend(std::iter::repeat(0xEE).take(TRAINER_LEN));
        }
        for bank in 0..prg {
            data.extend(std::iter::repeat(bank).take(PRG_BANK_SIZE));
        }
        for bank in 0..chr {
            data.extend(std::iter::repeat(0x80 | bank).take(CHR_BANK_SIZE));
        }
        data
    }

    #[test]
    fn parses_header_fields() {
        let cart = Cartridge::from_bytes(&image(2, 1, 0x11, 0x40)).unwrap();
        assert_eq!(cart.prg_count(), 2);
        assert_eq!(cart.chr_count(), 1);
        assert_eq!(cart.mapper_id(), 0x41);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        assert!(!cart.has_chr_ram());
    }

    #[test]
    fn four_screen_bit_wins_over_mirroring_bit() {
        let cart = Cartridge::from_bytes(&image(1, 1, 0x09, 0)).unwrap();
        assert_eq!(cart.mirroring(), Mirroring::FourScreen);
    }

    #[test]
    fn trainer_is_skipped() {
        let cart = Cartridge::from_bytes(&image(2, 0, 0x04, 0)).unwrap();
        assert_eq!(cart.prg_bank(0)[0], 0);
        assert_eq!(cart.prg_bank(1)[0], 1);
    }

    #[test]
    fn zero_chr_banks_allocates_chr_ram() {
        let mut cart = Cartridge::from_bytes(&image(1, 0, 0, 0)).unwrap();
        assert!(cart.has_chr_ram());
        assert_eq!(cart.chr_count(), 1);
        cart.write_chr(0x10, 0x5A);
        assert_eq!(cart.chr_bank(0)[0x10], 0x5A);
    }

    #[test]
    fn chr_rom_is_read_only() {
        let mut cart = Cartridge::from_bytes(&image(1, 1, 0, 0)).unwrap();
        cart.write_chr(0, 0x12);
        assert_eq!(cart.chr_bank(0)[0], 0x80);
    }

    #[test]
    fn sub_banks_index_into_the_same_data() {
        let cart = Cartridge::from_bytes(&image(2, 2, 0, 0)).unwrap();
        assert_eq!(cart.prg_bank_8k(2)[0], 1);
        assert_eq!(cart.chr_bank_4k(2)[0], 0x81);
        assert_eq!(cart.chr_bank_1k(9)[0], 0x81);
        // Bank numbers wrap past the end.
        assert_eq!(cart.prg_bank(3)[0], 1);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = image(1, 1, 0, 0);
        data[0] = b'X';
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::BadMagic)
        ));
    }

    #[test]
    fn rejects_image_without_prg_rom() {
        assert!(matches!(
            Cartridge::from_bytes(&image(0, 1, 0, 0)),
            Err(CartridgeError::NoPrgRom)
        ));
    }

    #[test]
    fn rejects_truncated_image() {
        let mut data = image(2, 1, 0, 0);
        data.truncate(HEADER_LEN + PRG_BANK_SIZE);
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::Truncated { .. })
        ));
    }
}
