//! NES PPU (Picture Processing Unit) implementation.
//!
//! Handles scanline/frame timing, vblank NMI, the $2000–$2007 register file (with the internal
//! `v`/`t`/fine-X/write-toggle scroll registers), OAM, and the 256×240 framebuffer. Drawing
//! itself lives in [`crate::ppu::render`].
//!
//! Time is measured in PPU dots: 341 per scanline, 262 scanlines per frame. Scanlines 0–239 are
//! visible, vblank starts at scanline 241 dot 1, and scanline 261 is the pre-render line whose end
//! is the frame boundary.

use crate::cartridge::mapper::mapper::Mapper;
use crate::display::{SCREEN_HEIGHT, SCREEN_WIDTH, VideoSink};
use crate::ppu::memory::PictureMemory;
use crate::ppu::render::TileCache;
use crate::ppu::sprite::{SPRITE_COUNT, Sprite};

/// NES 2C02-style 64-color palette (0xRRGGBB). Index 0 = backdrop.
pub const NES_PALETTE_RGB: [u32; 64] = [
    0x545454, 0x001E74, 0x081090, 0x300088, 0x440064, 0x5C0030, 0x540400, 0x3C1800, 0x202A00,
    0x083A00, 0x004000, 0x003C00, 0x00302C, 0x000000, 0x000000, 0x000000, 0x989698, 0x084CC4,
    0x3032EC, 0x5C1EE4, 0x8814B0, 0xA01464, 0x982220, 0x783C00, 0x545A00, 0x287200, 0x087C00,
    0x007628, 0x006678, 0x000000, 0x000000, 0x000000, 0xECEEEC, 0x3C7EEC, 0x5C5CEC, 0x8844EC,
    0xB02CEC, 0xE028B0, 0xD83C50, 0xC45400, 0xAC7000, 0x808800, 0x409C30, 0x20A458, 0x209A88,
    0x404040, 0x000000, 0x000000, 0xECEEEC, 0xA8BCEC, 0xBCACEC, 0xD4A0EC, 0xEC94EC, 0xEC90D4,
    0xEC9CB4, 0xE4B090, 0xDCC878, 0xD4DC78, 0xB8EC98, 0xA8ECBC, 0xA0E4E4, 0xA0A0A0, 0x000000,
    0x000000,
];

/// OAM (Object Attribute Memory): 64 sprites × 4 bytes. Each entry: Y, tile, attr, X.
pub const OAM_LEN: usize = 256;

pub const DOTS_PER_SCANLINE: u32 = 341;
pub const SCANLINES_PER_FRAME: u16 = 262;
pub const VISIBLE_SCANLINES: u16 = 240;
pub const VBLANK_SCANLINE: u16 = 241;
pub const PRE_RENDER_SCANLINE: u16 = SCANLINES_PER_FRAME - 1;

// PPUCTRL ($2000)
pub const CTRL_NAMETABLE: u8 = 0x03;
pub const CTRL_INCREMENT_32: u8 = 0x04;
pub const CTRL_SPRITE_TABLE: u8 = 0x08;
pub const CTRL_BACKGROUND_TABLE: u8 = 0x10;
pub const CTRL_SPRITE_8X16: u8 = 0x20;
pub const CTRL_NMI_ENABLE: u8 = 0x80;

// PPUMASK ($2001)
pub const MASK_GRAYSCALE: u8 = 0x01;
pub const MASK_BACKGROUND_LEFT: u8 = 0x02;
pub const MASK_SPRITES_LEFT: u8 = 0x04;
pub const MASK_BACKGROUND: u8 = 0x08;
pub const MASK_SPRITES: u8 = 0x10;

// PPUSTATUS ($2002)
pub const STATUS_SPRITE_OVERFLOW: u8 = 0x20;
pub const STATUS_SPRITE_0_HIT: u8 = 0x40;
pub const STATUS_VBLANK: u8 = 0x80;

/// PPU state: timing, scroll registers, picture memory, OAM, and framebuffer.
pub struct PPU {
    /// Dots elapsed within the current scanline.
    pub scanline_cycles: u32,
    /// Dots elapsed within the current frame.
    pub frame_cycles: u32,
    pub scanline: u16,
    /// Completed frames.
    pub frame: u64,
    /// NMI latched for the CPU; consumed by the bus.
    pub nmi: bool,
    pub ctrl: u8,
    pub mask: u8,
    pub vblank: bool,
    /// Vblank has already begun in this frame.
    pub vblank_started: bool,
    /// Sprite 0 hit (PPUSTATUS bit 6).
    pub sprite_0_hit: bool,
    /// Sprite overflow (PPUSTATUS bit 5).
    pub sprite_overflow: bool,
    /// Current VRAM address (15 bits): yyy NN YYYYY XXXXX.
    pub v: u16,
    /// Temporary VRAM address, reloaded into `v` at scanline and frame starts.
    pub t: u16,
    /// Fine X scroll (3 bits).
    pub fine_x: u8,
    /// Shared $2005/$2006 write toggle; reset by reading $2002.
    pub w: bool,
    /// $2007 read buffer.
    pub read_buffer: u8,
    /// Last value written to any PPU register; write-only registers read back as this.
    pub io_latch: u8,
    pub memory: PictureMemory,
    /// OAM: 64 sprites × 4 bytes (Y, tile, attr, X). Written via $2003/$2004 or $4014 DMA.
    pub oam: [u8; OAM_LEN],
    /// OAM address for $2003/$2004 (byte index 0..255).
    pub oam_addr: u8,
    /// Decoded sprite list for the frame being drawn.
    pub sprites: Vec<Sprite>,
    pub tiles: TileCache,
    /// 256×240 framebuffer (0xRRGGBB per pixel). Row-major, left-to-right, top-to-bottom.
    pub framebuffer: Vec<u32>,
    /// Per-pixel background opacity for sprite priority and sprite 0 hit.
    pub bg_opaque: Vec<bool>,
    /// Per-pixel "a sprite already claimed this pixel" marks for the compositing pass.
    pub sprite_drawn: Vec<bool>,
}

impl PPU {
    /// Create PPU at the start of a frame (scanline 0, dot 0).
    pub fn new() -> Self {
        Self {
            scanline_cycles: 0,
            frame_cycles: 0,
            scanline: 0,
            frame: 0,
            nmi: false,
            ctrl: 0,
            mask: 0,
            vblank: false,
            vblank_started: false,
            sprite_0_hit: false,
            sprite_overflow: false,
            v: 0,
            t: 0,
            fine_x: 0,
            w: false,
            read_buffer: 0,
            io_latch: 0,
            memory: PictureMemory::new(),
            oam: [0; OAM_LEN],
            oam_addr: 0,
            sprites: Vec::with_capacity(SPRITE_COUNT),
            tiles: TileCache::new(),
            framebuffer: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            bg_opaque: vec![false; SCREEN_WIDTH * SCREEN_HEIGHT],
            sprite_drawn: vec![false; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    pub fn background_enabled(&self) -> bool {
        self.mask & MASK_BACKGROUND != 0
    }

    pub fn sprites_enabled(&self) -> bool {
        self.mask & MASK_SPRITES != 0
    }

    pub fn rendering_enabled(&self) -> bool {
        self.background_enabled() || self.sprites_enabled()
    }

    /// Advance the PPU by `cycles` dots. Every scanline whose end is crossed is finished before
    /// returning: visible lines are drawn, the mapper's scanline counter is clocked, and the
    /// frame boundary is handled when the pre-render line ends.
    pub fn exec_cycle(&mut self, cycles: u32, mapper: &mut dyn Mapper, sink: &mut dyn VideoSink) {
        self.frame_cycles += cycles;
        self.scanline_cycles += cycles;

        while self.scanline_cycles >= DOTS_PER_SCANLINE {
            self.enter_vblank_if_due();
            self.scanline_cycles -= DOTS_PER_SCANLINE;
            self.finish_scanline(mapper, sink);
        }
        self.enter_vblank_if_due();
    }

    /// Sets the vblank flag (and latches NMI if enabled) once per frame, as soon as the timing
    /// reaches scanline 241 dot 1.
    fn enter_vblank_if_due(&mut self) {
        if self.vblank_started || self.scanline < VBLANK_SCANLINE {
            return;
        }
        if self.scanline == PRE_RENDER_SCANLINE {
            return;
        }
        if self.scanline == VBLANK_SCANLINE && self.scanline_cycles < 1 {
            return;
        }
        self.vblank_started = true;
        self.vblank = true;
        if self.ctrl & CTRL_NMI_ENABLE != 0 {
            self.nmi = true;
        }
    }

    fn finish_scanline(&mut self, mapper: &mut dyn Mapper, sink: &mut dyn VideoSink) {
        match self.scanline {
            line if line < VISIBLE_SCANLINES => {
                if self.rendering_enabled() {
                    self.draw_scanline(line as usize, mapper);
                    mapper.tick_scanline();
                } else {
                    self.draw_blank_line(line as usize);
                }
                self.scanline += 1;
            }
            PRE_RENDER_SCANLINE => {
                if self.rendering_enabled() {
                    mapper.tick_scanline();
                }
                self.scanline = 0;
                self.end_frame(mapper, sink);
            }
            _ => self.scanline += 1,
        }
    }

    /// Frame boundary: composite sprites, hand the frame to the sink, and prepare the next one.
    fn end_frame(&mut self, mapper: &mut dyn Mapper, sink: &mut dyn VideoSink) {
        if self.sprites_enabled() {
            self.draw_sprites();
        }
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                sink.draw_pixel(x, y, self.framebuffer[y * SCREEN_WIDTH + x]);
            }
        }
        sink.present();

        self.vblank = false;
        self.sprite_0_hit = false;
        self.sprite_overflow = false;
        self.vblank_started = false;
        if self.background_enabled() {
            self.v = self.t;
        }
        self.tiles.clear();
        self.load_sprites(mapper);

        self.frame += 1;
        self.frame_cycles = self.scanline_cycles;
        log::debug!("PPU: frame {} complete", self.frame);
    }

    /// Decode all 64 OAM entries for the coming frame.
    pub fn load_sprites(&mut self, mapper: &dyn Mapper) {
        let tall = self.ctrl & CTRL_SPRITE_8X16 != 0;
        let table = if self.ctrl & CTRL_SPRITE_TABLE != 0 {
            0x1000
        } else {
            0x0000
        };
        self.sprites.clear();
        for i in 0..SPRITE_COUNT {
            self.sprites
                .push(Sprite::decode(&self.oam, i, tall, table, mapper));
        }
    }

    /// Read a PPU register; `reg` is the address offset 0–7.
    pub fn read_register(&mut self, reg: u16, mapper: &dyn Mapper) -> u8 {
        match reg & 7 {
            2 => self.read_status(),
            4 => self.read_oam_data(),
            7 => self.read_data(mapper),
            _ => self.io_latch,
        }
    }

    /// Write a PPU register; `reg` is the address offset 0–7.
    pub fn write_register(&mut self, reg: u16, data: u8, mapper: &mut dyn Mapper) {
        self.io_latch = data;
        match reg & 7 {
            0 => self.write_ctrl(data),
            1 => self.write_mask(data),
            3 => self.write_oam_addr(data),
            4 => self.write_oam_data(data),
            5 => self.write_scroll(data),
            6 => self.write_addr(data),
            7 => self.write_data(data, mapper),
            _ => {}
        }
    }

    /// Read PPUSTATUS ($2002); clears vblank and the write toggle.
    pub fn read_status(&mut self) -> u8 {
        let mut status = self.io_latch & 0x1F;

        if self.vblank {
            status |= STATUS_VBLANK;
        }
        if self.sprite_0_hit {
            status |= STATUS_SPRITE_0_HIT;
        }
        if self.sprite_overflow {
            status |= STATUS_SPRITE_OVERFLOW;
        }

        self.vblank = false;
        self.w = false;

        status
    }

    /// Write PPUCTRL ($2000). Nametable select goes into `t` bits 10–11. Turning NMI on while
    /// the vblank flag is still set raises an NMI immediately.
    pub fn write_ctrl(&mut self, data: u8) {
        let nmi_was_enabled = self.ctrl & CTRL_NMI_ENABLE != 0;
        self.ctrl = data;
        self.t = (self.t & !0x0C00) | (((data & CTRL_NAMETABLE) as u16) << 10);
        if !nmi_was_enabled && data & CTRL_NMI_ENABLE != 0 && self.vblank {
            self.nmi = true;
        }
    }

    /// Write PPUMASK ($2001).
    pub fn write_mask(&mut self, data: u8) {
        // Cached tile colours bake in grayscale.
        if (self.mask ^ data) & MASK_GRAYSCALE != 0 {
            self.tiles.clear();
        }
        self.mask = data;
    }

    /// Write OAMADDR ($2003).
    pub fn write_oam_addr(&mut self, data: u8) {
        self.oam_addr = data;
    }

    /// Read OAMDATA ($2004); returns OAM byte at current OAMADDR (read does not increment).
    pub fn read_oam_data(&mut self) -> u8 {
        self.oam[self.oam_addr as usize]
    }

    /// Write OAMDATA ($2004); writes OAM and increments OAMADDR.
    pub fn write_oam_data(&mut self, data: u8) {
        self.oam[self.oam_addr as usize] = data;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    /// Copy a 256-byte page into OAM (OAM DMA from $4014), starting at OAMADDR.
    pub fn oam_dma(&mut self, page: &[u8; OAM_LEN]) {
        for (i, &byte) in page.iter().enumerate() {
            let addr = self.oam_addr.wrapping_add(i as u8);
            self.oam[addr as usize] = byte;
        }
    }

    /// Write PPUSCROLL ($2005). First write: coarse X into `t`, fine X. Second write: fine Y and
    /// coarse Y into `t`.
    pub fn write_scroll(&mut self, data: u8) {
        if !self.w {
            self.t = (self.t & !0x001F) | (data >> 3) as u16;
            self.fine_x = data & 0x07;
        } else {
            self.t = (self.t & !0x73E0)
                | (((data & 0x07) as u16) << 12)
                | (((data >> 3) as u16) << 5);
        }
        self.w = !self.w;
    }

    /// Write PPUADDR ($2006). First write: high six bits of `t` (bit 14 cleared). Second write:
    /// low byte of `t`, then `v = t`.
    pub fn write_addr(&mut self, data: u8) {
        if !self.w {
            self.t = (self.t & 0x00FF) | (((data & 0x3F) as u16) << 8);
        } else {
            self.t = (self.t & 0xFF00) | data as u16;
            self.v = self.t;
        }
        self.w = !self.w;
    }

    /// Read PPUDATA ($2007). Palette reads return immediately (the buffer picks up the
    /// nametable byte underneath); everything else returns the previous buffered byte.
    pub fn read_data(&mut self, mapper: &dyn Mapper) -> u8 {
        let addr = self.v & 0x3FFF;
        let data = if addr >= 0x3F00 {
            self.read_buffer = self.memory.read(addr - 0x1000, mapper);
            self.memory.read(addr, mapper)
        } else {
            let buffered = self.read_buffer;
            self.read_buffer = self.memory.read(addr, mapper);
            buffered
        };
        self.increment_vram_addr();
        data
    }

    /// Write PPUDATA ($2007): writes picture memory at `v`, then increments.
    pub fn write_data(&mut self, data: u8, mapper: &mut dyn Mapper) {
        let addr = self.v & 0x3FFF;
        self.memory.write(addr, data, mapper);
        // Pattern and palette writes change what cached tiles decode to.
        if addr < 0x2000 || addr >= 0x3F00 {
            self.tiles.clear();
        }
        self.increment_vram_addr();
    }

    /// Increment by 32 if PPUCTRL bit 2 set, else 1.
    fn increment_vram_addr(&mut self) {
        let inc = if self.ctrl & CTRL_INCREMENT_32 != 0 {
            32
        } else {
            1
        };
        self.v = self.v.wrapping_add(inc) & 0x7FFF;
    }
}

impl Default for PPU {
    fn default() -> Self {
        Self::new()
    }
}
