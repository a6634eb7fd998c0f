//! Background and sprite drawing.
//!
//! Background pixels are produced one scanline at a time while the CPU runs, walking the `v`
//! register across the nametables the way the hardware's fetch pipeline does (see
//! [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling)). Sprites are composited over the
//! finished background in one pass at the frame boundary.

use std::collections::HashMap;

use crate::cartridge::mapper::mapper::Mapper;
use crate::display::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::ppu::memory::PictureMemory;
use crate::ppu::ppu::{
    CTRL_BACKGROUND_TABLE, MASK_BACKGROUND_LEFT, MASK_GRAYSCALE, MASK_SPRITES_LEFT,
    NES_PALETTE_RGB, PPU,
};
use crate::ppu::sprite::decode_row;

/// Tile identity: pattern table (0 or 1), tile index, palette group (0–3 background, 4–7 sprite).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub table: u8,
    pub index: u8,
    pub palette: u8,
}

/// A decoded 8×8 tile: 2-bit pixel values and their final colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub pixels: [[u8; 8]; 8],
    pub rgb: [[u32; 8]; 8],
}

impl Tile {
    pub fn decode(key: TileKey, mapper: &dyn Mapper, memory: &PictureMemory, gray: bool) -> Self {
        let tile_addr = key.table as u16 * 0x1000 + key.index as u16 * 16;
        let mut pixels = [[0u8; 8]; 8];
        let mut rgb = [[0u32; 8]; 8];
        for row in 0..8 {
            pixels[row] = decode_row(mapper, tile_addr, row as u16);
            for col in 0..8 {
                let px = pixels[row][col] as usize;
                // Pixel value 0 always shows the universal background color.
                let entry = if px == 0 { 0 } else { key.palette as usize * 4 + px };
                rgb[row][col] = color(memory.palette_color(entry), gray);
            }
        }
        Self { pixels, rgb }
    }
}

/// Decoded tiles, reused by neighbouring pixels. Cleared at every frame boundary and whenever
/// pattern, palette, or bank state changes.
#[derive(Default)]
pub struct TileCache {
    tiles: HashMap<TileKey, Tile>,
}

impl TileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &mut self,
        key: TileKey,
        mapper: &dyn Mapper,
        memory: &PictureMemory,
        gray: bool,
    ) -> Tile {
        *self
            .tiles
            .entry(key)
            .or_insert_with(|| Tile::decode(key, mapper, memory, gray))
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// NES color number → 0xRRGGBB, honouring the grayscale bit.
pub fn color(nes_color: u8, gray: bool) -> u32 {
    let nes_color = if gray { nes_color & 0x30 } else { nes_color };
    NES_PALETTE_RGB[(nes_color & 0x3F) as usize]
}

impl PPU {
    fn grayscale(&self) -> bool {
        self.mask & MASK_GRAYSCALE != 0
    }

    fn backdrop(&self) -> u32 {
        color(self.memory.palette_color(0), self.grayscale())
    }

    /// Fill a line with the backdrop color while rendering is off.
    pub fn draw_blank_line(&mut self, line: usize) {
        let backdrop = self.backdrop();
        let row = line * SCREEN_WIDTH..(line + 1) * SCREEN_WIDTH;
        self.framebuffer[row.clone()].fill(backdrop);
        self.bg_opaque[row].fill(false);
    }

    /// Draw the background of one visible scanline, then resolve sprite 0 hit and sprite
    /// overflow for it.
    pub fn draw_scanline(&mut self, line: usize, mapper: &dyn Mapper) {
        let bg_on = self.background_enabled();
        let backdrop = self.backdrop();
        let show_left = self.mask & MASK_BACKGROUND_LEFT != 0;

        if bg_on {
            // Horizontal position restarts from `t` on every line.
            self.v = (self.v & !0x041F) | (self.t & 0x041F);
        }

        let mut fine = self.fine_x as usize;
        let mut tile = if bg_on {
            Some(self.background_tile(mapper))
        } else {
            None
        };
        let fine_y = ((self.v >> 12) & 7) as usize;

        for x in 0..SCREEN_WIDTH {
            let idx = line * SCREEN_WIDTH + x;
            let visible = x >= 8 || show_left;
            let (opaque, rgb) = match &tile {
                Some(t) if visible && t.pixels[fine_y][fine] != 0 => (true, t.rgb[fine_y][fine]),
                _ => (false, backdrop),
            };
            self.framebuffer[idx] = rgb;
            self.bg_opaque[idx] = opaque;

            if bg_on {
                fine += 1;
                if fine == 8 {
                    fine = 0;
                    self.increment_x();
                    tile = Some(self.background_tile(mapper));
                }
            }
        }

        if bg_on {
            self.increment_y();
        }

        self.evaluate_sprite_overflow(line);
        if !self.sprite_0_hit {
            self.sprite_0_hit = self.sprite_zero_hits(line);
        }
    }

    /// Tile under the current `v`: nametable byte → attribute palette group → cached pattern.
    fn background_tile(&mut self, mapper: &dyn Mapper) -> Tile {
        let mirroring = mapper.mirroring();
        let v = self.v;
        let index = self.memory.nametable(0x2000 | (v & 0x0FFF), mirroring);
        let attr_addr = 0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
        let attr = self.memory.nametable(attr_addr, mirroring);
        let shift = ((v >> 4) & 0x04) | (v & 0x02);
        let key = TileKey {
            table: (self.ctrl & CTRL_BACKGROUND_TABLE != 0) as u8,
            index,
            palette: (attr >> shift) & 0x03,
        };
        let gray = self.grayscale();
        self.tiles.get(key, mapper, &self.memory, gray)
    }

    /// Coarse X increment; wrapping past 31 toggles the horizontal nametable (bit 10).
    pub fn increment_x(&mut self) {
        if self.v & 0x001F == 31 {
            self.v &= !0x001F;
            self.v ^= 0x0400;
        } else {
            self.v += 1;
        }
    }

    /// Fine Y increment, carrying into coarse Y. Row 29 wraps and toggles the vertical
    /// nametable (bit 11); rows 30–31 (attribute memory) wrap without toggling.
    pub fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
            return;
        }
        self.v &= !0x7000;
        let mut coarse_y = (self.v & 0x03E0) >> 5;
        if coarse_y == 29 {
            coarse_y = 0;
            self.v ^= 0x0800;
        } else if coarse_y == 31 {
            coarse_y = 0;
        } else {
            coarse_y += 1;
        }
        self.v = (self.v & !0x03E0) | (coarse_y << 5);
    }

    fn evaluate_sprite_overflow(&mut self, line: usize) {
        if self.sprite_overflow || !self.rendering_enabled() {
            return;
        }
        let count = self.sprites.iter().filter(|s| s.covers_line(line)).count();
        if count > 8 {
            self.sprite_overflow = true;
        }
    }

    /// Does an opaque pixel of sprite 0 land on an opaque background pixel on this line?
    fn sprite_zero_hits(&self, line: usize) -> bool {
        if !(self.background_enabled() && self.sprites_enabled()) {
            return false;
        }
        let Some(sprite) = self.sprites.first() else {
            return false;
        };
        if !sprite.covers_line(line) {
            return false;
        }
        let clip_left =
            self.mask & MASK_BACKGROUND_LEFT == 0 || self.mask & MASK_SPRITES_LEFT == 0;
        let row = line - sprite.top();
        (0..8).any(|col| {
            let x = sprite.x as usize + col;
            // Never at x = 255, nor in a clipped left column.
            if x >= SCREEN_WIDTH - 1 || (x < 8 && clip_left) {
                return false;
            }
            sprite.pixel(row, col) != 0 && self.bg_opaque[line * SCREEN_WIDTH + x]
        })
    }

    /// Composite all sprites over the finished background. Lower OAM index wins; a sprite pixel
    /// behind opaque background is hidden but still blocks higher-index sprites.
    pub fn draw_sprites(&mut self) {
        self.sprite_drawn.fill(false);
        let gray = self.grayscale();
        let show_left = self.mask & MASK_SPRITES_LEFT != 0;

        for sprite in &self.sprites {
            let palette_base = 0x10 + sprite.palette_group() as usize * 4;
            for row in 0..sprite.height as usize {
                let y = sprite.top() + row;
                if y >= SCREEN_HEIGHT {
                    break;
                }
                for col in 0..8 {
                    let x = sprite.x as usize + col;
                    if x >= SCREEN_WIDTH {
                        break;
                    }
                    if x < 8 && !show_left {
                        continue;
                    }
                    let px = sprite.pixel(row, col);
                    if px == 0 {
                        continue;
                    }
                    let idx = y * SCREEN_WIDTH + x;
                    if self.sprite_drawn[idx] {
                        continue;
                    }
                    self.sprite_drawn[idx] = true;
                    if sprite.behind_background() && self.bg_opaque[idx] {
                        continue;
                    }
                    let entry = palette_base + px as usize;
                    self.framebuffer[idx] = color(self.memory.palette_color(entry), gray);
                }
            }
        }
    }
}
