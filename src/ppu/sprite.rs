//! OAM entries decoded for rendering.
//!
//! OAM holds 64 sprites × 4 bytes: Y, tile index, attributes, X. Attributes: bits 0–1 palette,
//! bit 5 priority (behind background), bit 6 horizontal flip, bit 7 vertical flip. The PPU
//! decodes the whole list once per frame, pattern rows included.

use crate::cartridge::mapper::mapper::Mapper;

pub const SPRITE_COUNT: usize = 64;

pub const ATTR_PALETTE: u8 = 0x03;
pub const ATTR_BEHIND_BACKGROUND: u8 = 0x20;
pub const ATTR_FLIP_H: u8 = 0x40;
pub const ATTR_FLIP_V: u8 = 0x80;

/// One sprite with its pattern already decoded into 2-bit pixel values.
#[derive(Clone)]
pub struct Sprite {
    pub y: u8,
    pub attr: u8,
    pub x: u8,
    /// 8 or 16.
    pub height: u8,
    /// Unflipped pixel values, one row per line of the sprite.
    pattern: [[u8; 8]; 16],
}

impl Sprite {
    /// Decode OAM entry `index`. `pattern_table` is the 8×8 sprite table base from PPUCTRL; 8×16
    /// sprites take their table from bit 0 of the tile index instead.
    pub fn decode(
        oam: &[u8; 256],
        index: usize,
        tall: bool,
        pattern_table: u16,
        mapper: &dyn Mapper,
    ) -> Self {
        let base = index * 4;
        let (y, tile, attr, x) = (oam[base], oam[base + 1], oam[base + 2], oam[base + 3]);
        let height = if tall { 16 } else { 8 };

        let mut pattern = [[0u8; 8]; 16];
        for (row, out) in pattern.iter_mut().take(height as usize).enumerate() {
            let tile_addr = if tall {
                let table = (tile & 1) as u16 * 0x1000;
                let top = (tile & 0xFE) as u16;
                table + (top + (row / 8) as u16) * 16
            } else {
                pattern_table + tile as u16 * 16
            };
            *out = decode_row(mapper, tile_addr, (row % 8) as u16);
        }

        Self {
            y,
            attr,
            x,
            height,
            pattern,
        }
    }

    /// Screen row of the sprite's first line. Sprite data is delayed by one scanline.
    pub fn top(&self) -> usize {
        self.y as usize + 1
    }

    pub fn covers_line(&self, line: usize) -> bool {
        line >= self.top() && line < self.top() + self.height as usize
    }

    pub fn palette_group(&self) -> u8 {
        self.attr & ATTR_PALETTE
    }

    pub fn behind_background(&self) -> bool {
        self.attr & ATTR_BEHIND_BACKGROUND != 0
    }

    /// Pixel value (0 = transparent) at sprite-relative (row, col), after flips. For 8×16 sprites
    /// a vertical flip also swaps the top and bottom tiles.
    pub fn pixel(&self, row: usize, col: usize) -> u8 {
        let row = if self.attr & ATTR_FLIP_V != 0 {
            self.height as usize - 1 - row
        } else {
            row
        };
        let col = if self.attr & ATTR_FLIP_H != 0 { 7 - col } else { col };
        self.pattern[row][col]
    }
}

/// Decode one 8-pixel row of the tile at `tile_addr` from its two bitplanes.
pub fn decode_row(mapper: &dyn Mapper, tile_addr: u16, row: u16) -> [u8; 8] {
    let lo = mapper.read_chr(tile_addr + row);
    let hi = mapper.read_chr(tile_addr + row + 8);
    let mut out = [0u8; 8];
    for (col, px) in out.iter_mut().enumerate() {
        let bit = 7 - col;
        *px = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
    }
    out
}
