use crate::{
    cartridge::{
        cartridge::Cartridge,
        mapper::{Mirroring, mapper::Mapper, mapper0::Mapper0},
    },
    display::FrameBuffer,
    ppu::{
        ppu::{
            CTRL_NMI_ENABLE, CTRL_SPRITE_8X16, DOTS_PER_SCANLINE, MASK_BACKGROUND,
            MASK_BACKGROUND_LEFT, MASK_SPRITES, MASK_SPRITES_LEFT, PPU, SCANLINES_PER_FRAME,
        },
        render::{Tile, TileKey, color},
        sprite::Sprite,
    },
};

/// NROM board with 8 KiB CHR RAM so tests can write patterns through $2007.
fn chr_ram_mapper() -> Mapper0 {
    Mapper0::new(Cartridge::new(vec![0; 0x4000], vec![], 0, Mirroring::Vertical))
}

fn write_vram(ppu: &mut PPU, mapper: &mut dyn Mapper, addr: u16, bytes: &[u8]) {
    ppu.write_register(6, (addr >> 8) as u8, mapper);
    ppu.write_register(6, addr as u8, mapper);
    for &b in bytes {
        ppu.write_register(7, b, mapper);
    }
}

/// Tile `index` in pattern table 0 becomes solid pixel value 1.
fn solid_tile(ppu: &mut PPU, mapper: &mut dyn Mapper, index: u16) {
    write_vram(ppu, mapper, index * 16, &[0xFF; 8]);
}

fn hide_all_sprites(ppu: &mut PPU) {
    for i in 0..64 {
        ppu.oam[i * 4] = 0xFF;
    }
}

fn reset_scroll(ppu: &mut PPU, mapper: &mut dyn Mapper) {
    ppu.write_register(6, 0, mapper);
    ppu.write_register(6, 0, mapper);
}

#[test]
fn coarse_x_wrap_toggles_horizontal_nametable() {
    let mut ppu = PPU::new();
    ppu.v = 0x001F;
    ppu.increment_x();
    assert_eq!(ppu.v, 0x0400);
    ppu.v = 0x041F;
    ppu.increment_x();
    assert_eq!(ppu.v, 0x0000);
    ppu.v = 0x0005;
    ppu.increment_x();
    assert_eq!(ppu.v, 0x0006);
}

#[test]
fn fine_y_carries_into_coarse_y() {
    let mut ppu = PPU::new();
    ppu.v = 0x3000 | (4 << 5);
    ppu.increment_y();
    assert_eq!(ppu.v, 0x4000 | (4 << 5));
    ppu.v = 0x7000 | (4 << 5);
    ppu.increment_y();
    assert_eq!(ppu.v, 5 << 5);
}

#[test]
fn coarse_y_29_wraps_and_toggles_vertical_nametable() {
    let mut ppu = PPU::new();
    ppu.v = 0x7000 | (29 << 5);
    ppu.increment_y();
    assert_eq!(ppu.v, 0x0800);
}

#[test]
fn coarse_y_31_wraps_without_toggle() {
    let mut ppu = PPU::new();
    ppu.v = 0x7000 | (31 << 5) | 0x0800;
    ppu.increment_y();
    assert_eq!(ppu.v, 0x0800);
}

#[test]
fn status_read_clears_vblank_and_write_toggle() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    ppu.vblank = true;
    ppu.write_register(5, 0x10, &mut m);
    assert!(ppu.w);
    let status = ppu.read_register(2, &m);
    assert_eq!(status & 0x80, 0x80);
    assert!(!ppu.vblank);
    assert!(!ppu.w);
    assert_eq!(ppu.read_register(2, &m) & 0x80, 0);
}

#[test]
fn scroll_writes_fill_temporary_address() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    ppu.write_register(5, 0x7D, &mut m); // coarse X 15, fine X 5
    ppu.write_register(5, 0x5E, &mut m); // coarse Y 11, fine Y 6
    assert_eq!(ppu.fine_x, 5);
    assert_eq!(ppu.t, (6 << 12) | (11 << 5) | 15);
    assert!(!ppu.w);
}

#[test]
fn ctrl_write_sets_nametable_bits_of_t() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    ppu.write_register(0, 0x03, &mut m);
    assert_eq!(ppu.t, 0x0C00);
}

#[test]
fn address_writes_load_v_on_second_write() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    ppu.write_register(6, 0xFF, &mut m);
    assert_eq!(ppu.t, 0x3F00);
    assert_eq!(ppu.v, 0);
    ppu.write_register(6, 0x10, &mut m);
    assert_eq!(ppu.v, 0x3F10);
}

#[test]
fn data_reads_are_buffered_outside_palette() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    write_vram(&mut ppu, &mut m, 0x2000, &[0x11, 0x22]);
    reset_scroll(&mut ppu, &mut m);
    ppu.write_register(6, 0x20, &mut m);
    ppu.write_register(6, 0x00, &mut m);
    let _stale = ppu.read_register(7, &m);
    assert_eq!(ppu.read_register(7, &m), 0x11);
    assert_eq!(ppu.read_register(7, &m), 0x22);
}

#[test]
fn palette_reads_are_immediate() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    write_vram(&mut ppu, &mut m, 0x3F01, &[0x2A]);
    ppu.write_register(6, 0x3F, &mut m);
    ppu.write_register(6, 0x01, &mut m);
    assert_eq!(ppu.read_register(7, &m), 0x2A);
}

#[test]
fn increment_32_mode() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    ppu.write_register(0, 0x04, &mut m);
    write_vram(&mut ppu, &mut m, 0x2000, &[1, 2]);
    assert_eq!(ppu.v, 0x2040);
    assert_eq!(ppu.memory.nametables[0x20], 2);
}

#[test]
fn vblank_starts_at_scanline_241_dot_1() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    ppu.write_register(0, CTRL_NMI_ENABLE, &mut m);
    ppu.exec_cycle(241 * DOTS_PER_SCANLINE, &mut m, &mut sink);
    assert_eq!(ppu.scanline, 241);
    assert!(!ppu.vblank);
    ppu.exec_cycle(1, &mut m, &mut sink);
    assert!(ppu.vblank);
    assert!(ppu.nmi);
}

#[test]
fn vblank_without_nmi_enable_does_not_latch_nmi() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    ppu.exec_cycle(242 * DOTS_PER_SCANLINE, &mut m, &mut sink);
    assert!(ppu.vblank);
    assert!(!ppu.nmi);
}

#[test]
fn large_step_across_vblank_line_still_sets_vblank() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    ppu.exec_cycle(240 * DOTS_PER_SCANLINE, &mut m, &mut sink);
    ppu.exec_cycle(3 * DOTS_PER_SCANLINE, &mut m, &mut sink);
    assert_eq!(ppu.scanline, 243);
    assert!(ppu.vblank);
}

#[test]
fn enabling_nmi_during_vblank_raises_nmi() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    ppu.vblank = true;
    ppu.write_register(0, CTRL_NMI_ENABLE, &mut m);
    assert!(ppu.nmi);
}

#[test]
fn frame_boundary_presents_and_resets_status() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    ppu.sprite_0_hit = true;
    ppu.exec_cycle(
        SCANLINES_PER_FRAME as u32 * DOTS_PER_SCANLINE + 10,
        &mut m,
        &mut sink,
    );
    assert_eq!(ppu.frame, 1);
    assert_eq!(sink.frames(), 1);
    assert_eq!(ppu.scanline, 0);
    assert_eq!(ppu.frame_cycles, 10);
    assert!(!ppu.vblank);
    assert!(!ppu.vblank_started);
    assert!(!ppu.sprite_0_hit);
}

#[test]
fn frame_boundary_reloads_v_from_t_when_background_on() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    ppu.write_register(1, MASK_BACKGROUND, &mut m);
    ppu.exec_cycle(241 * DOTS_PER_SCANLINE, &mut m, &mut sink);
    ppu.write_register(5, 0x08, &mut m);
    ppu.write_register(5, 0x10, &mut m);
    ppu.exec_cycle(21 * DOTS_PER_SCANLINE, &mut m, &mut sink);
    assert_eq!(ppu.v, ppu.t);
}

#[test]
fn visible_scanline_is_drawn_as_soon_as_it_ends() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    solid_tile(&mut ppu, &mut m, 0);
    write_vram(&mut ppu, &mut m, 0x3F00, &[0x0F, 0x30]);
    reset_scroll(&mut ppu, &mut m);
    ppu.write_register(1, MASK_BACKGROUND | MASK_BACKGROUND_LEFT, &mut m);

    ppu.exec_cycle(DOTS_PER_SCANLINE, &mut m, &mut sink);

    assert_eq!(ppu.framebuffer[0], color(0x30, false));
    assert_eq!(ppu.framebuffer[255], color(0x30, false));
    assert!(ppu.bg_opaque[100]);
    // Line 1 not reached yet.
    assert_eq!(ppu.framebuffer[256], 0);
}

#[test]
fn left_column_clipping_shows_backdrop() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    solid_tile(&mut ppu, &mut m, 0);
    write_vram(&mut ppu, &mut m, 0x3F00, &[0x0F, 0x30]);
    reset_scroll(&mut ppu, &mut m);
    ppu.write_register(1, MASK_BACKGROUND, &mut m);

    ppu.exec_cycle(DOTS_PER_SCANLINE, &mut m, &mut sink);

    assert_eq!(ppu.framebuffer[7], color(0x0F, false));
    assert!(!ppu.bg_opaque[7]);
    assert_eq!(ppu.framebuffer[8], color(0x30, false));
}

#[test]
fn attribute_bits_select_palette_group() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    solid_tile(&mut ppu, &mut m, 0);
    // Top-left quadrant of the first attribute byte uses group 2.
    write_vram(&mut ppu, &mut m, 0x23C0, &[0x02]);
    write_vram(&mut ppu, &mut m, 0x3F00, &[0x0F, 0x01, 0x02, 0x03, 0x0F, 0x11, 0x12, 0x13]);
    write_vram(&mut ppu, &mut m, 0x3F08, &[0x0F, 0x21]);
    reset_scroll(&mut ppu, &mut m);
    ppu.write_register(1, MASK_BACKGROUND | MASK_BACKGROUND_LEFT, &mut m);

    ppu.exec_cycle(DOTS_PER_SCANLINE, &mut m, &mut sink);

    assert_eq!(ppu.framebuffer[0], color(0x21, false));
    assert_eq!(ppu.framebuffer[40], color(0x01, false));
}

#[test]
fn sprite_zero_hit_resolves_on_overlapping_scanline() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    solid_tile(&mut ppu, &mut m, 0);
    solid_tile(&mut ppu, &mut m, 1);
    reset_scroll(&mut ppu, &mut m);
    hide_all_sprites(&mut ppu);
    ppu.oam[0..4].copy_from_slice(&[9, 1, 0, 20]);
    ppu.load_sprites(&m);
    ppu.write_register(
        1,
        MASK_BACKGROUND | MASK_SPRITES | MASK_BACKGROUND_LEFT | MASK_SPRITES_LEFT,
        &mut m,
    );

    ppu.exec_cycle(10 * DOTS_PER_SCANLINE, &mut m, &mut sink);
    assert!(!ppu.sprite_0_hit);
    ppu.exec_cycle(DOTS_PER_SCANLINE, &mut m, &mut sink);
    assert!(ppu.sprite_0_hit);
    assert_eq!(ppu.read_register(2, &m) & 0x40, 0x40);
}

#[test]
fn sprite_zero_never_hits_transparent_background() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    solid_tile(&mut ppu, &mut m, 1);
    reset_scroll(&mut ppu, &mut m);
    hide_all_sprites(&mut ppu);
    ppu.oam[0..4].copy_from_slice(&[9, 1, 0, 20]);
    ppu.load_sprites(&m);
    ppu.write_register(1, 0x1E, &mut m);

    ppu.exec_cycle(240 * DOTS_PER_SCANLINE, &mut m, &mut sink);
    assert!(!ppu.sprite_0_hit);
}

#[test]
fn lower_oam_index_wins_overlap() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    solid_tile(&mut ppu, &mut m, 1);
    write_vram(&mut ppu, &mut m, 0x3F11, &[0x16]);
    write_vram(&mut ppu, &mut m, 0x3F15, &[0x2A]);
    hide_all_sprites(&mut ppu);
    ppu.oam[0..4].copy_from_slice(&[19, 1, 0, 10]);
    ppu.oam[4..8].copy_from_slice(&[19, 1, 1, 12]);
    ppu.write_register(1, MASK_SPRITES | MASK_SPRITES_LEFT, &mut m);
    ppu.load_sprites(&m);

    ppu.draw_sprites();

    assert_eq!(ppu.framebuffer[20 * 256 + 12], color(0x16, false));
    assert_eq!(ppu.framebuffer[20 * 256 + 18], color(0x2A, false));
    // Sprite rows start one line below OAM Y.
    assert_eq!(ppu.framebuffer[19 * 256 + 12], 0);
}

#[test]
fn sprite_behind_background_still_blocks_later_sprites() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    solid_tile(&mut ppu, &mut m, 1);
    write_vram(&mut ppu, &mut m, 0x3F15, &[0x2A]);
    hide_all_sprites(&mut ppu);
    ppu.oam[0..4].copy_from_slice(&[19, 1, 0x20, 10]);
    ppu.oam[4..8].copy_from_slice(&[19, 1, 1, 10]);
    ppu.load_sprites(&m);
    let idx = 20 * 256 + 12;
    ppu.bg_opaque[idx] = true;
    ppu.framebuffer[idx] = 0x123456;

    ppu.draw_sprites();

    assert_eq!(ppu.framebuffer[idx], 0x123456);
}

#[test]
fn sprites_are_composited_at_frame_boundary() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    solid_tile(&mut ppu, &mut m, 1);
    write_vram(&mut ppu, &mut m, 0x3F11, &[0x16]);
    reset_scroll(&mut ppu, &mut m);
    hide_all_sprites(&mut ppu);
    ppu.oam[0..4].copy_from_slice(&[49, 1, 0, 100]);
    ppu.load_sprites(&m);
    ppu.write_register(1, MASK_SPRITES | MASK_SPRITES_LEFT, &mut m);

    ppu.exec_cycle(SCANLINES_PER_FRAME as u32 * DOTS_PER_SCANLINE, &mut m, &mut sink);

    assert_eq!(sink.pixel(100, 50), color(0x16, false));
    assert_eq!(sink.pixel(100, 49), color(0x00, false));
}

#[test]
fn tall_sprite_vertical_flip_swaps_tiles() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    // Tile 2 top half: pixel value 1; tile 3 bottom half: pixel value 2.
    write_vram(&mut ppu, &mut m, 2 * 16, &[0xFF; 8]);
    write_vram(&mut ppu, &mut m, 3 * 16 + 8, &[0xFF; 8]);
    ppu.oam[0..4].copy_from_slice(&[0, 2, 0x80, 0]);
    ppu.write_register(0, CTRL_SPRITE_8X16, &mut m);

    let sprite = Sprite::decode(&ppu.oam, 0, true, 0, &m);
    assert_eq!(sprite.height, 16);
    assert_eq!(sprite.pixel(0, 0), 2);
    assert_eq!(sprite.pixel(15, 0), 1);
}

#[test]
fn horizontal_flip_mirrors_columns() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    write_vram(&mut ppu, &mut m, 16, &[0x80]);
    ppu.oam[0..4].copy_from_slice(&[0, 1, 0x40, 0]);
    let sprite = Sprite::decode(&ppu.oam, 0, false, 0, &m);
    assert_eq!(sprite.pixel(0, 0), 0);
    assert_eq!(sprite.pixel(0, 7), 1);
}

#[test]
fn more_than_eight_sprites_on_a_line_sets_overflow() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    hide_all_sprites(&mut ppu);
    for i in 0..9 {
        ppu.oam[i * 4..i * 4 + 4].copy_from_slice(&[30, 0, 0, (i * 10) as u8]);
    }
    ppu.load_sprites(&m);
    ppu.write_register(1, MASK_SPRITES, &mut m);
    ppu.exec_cycle(40 * DOTS_PER_SCANLINE, &mut m, &mut sink);
    assert!(ppu.sprite_overflow);
}

#[test]
fn cached_tile_matches_fresh_decode() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    write_vram(&mut ppu, &mut m, 5 * 16, &[0x81, 0x42, 0x24, 0x18, 0, 0, 0, 0]);
    write_vram(&mut ppu, &mut m, 5 * 16 + 8, &[0xFF, 0, 0, 0, 0, 0, 0, 0]);
    let key = TileKey {
        table: 0,
        index: 5,
        palette: 1,
    };
    let cached = ppu.tiles.get(key, &m, &ppu.memory, false);
    let again = ppu.tiles.get(key, &m, &ppu.memory, false);
    let fresh = Tile::decode(key, &m, &ppu.memory, false);
    assert_eq!(cached, fresh);
    assert_eq!(again, fresh);
    assert_eq!(cached.pixels[0], [3, 2, 2, 2, 2, 2, 2, 3]);
    assert_eq!(cached.pixels[3], [0, 0, 0, 1, 1, 0, 0, 0]);
}

#[test]
fn pattern_writes_invalidate_tile_cache() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let key = TileKey {
        table: 0,
        index: 0,
        palette: 0,
    };
    let before = ppu.tiles.get(key, &m, &ppu.memory, false);
    assert_eq!(ppu.tiles.len(), 1);
    solid_tile(&mut ppu, &mut m, 0);
    assert!(ppu.tiles.is_empty());
    let after = ppu.tiles.get(key, &m, &ppu.memory, false);
    assert_ne!(before.pixels, after.pixels);
}

#[test]
fn tile_cache_is_cleared_every_frame() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    let mut sink = FrameBuffer::new();
    ppu.write_register(1, MASK_BACKGROUND, &mut m);
    ppu.exec_cycle(DOTS_PER_SCANLINE, &mut m, &mut sink);
    assert!(!ppu.tiles.is_empty());
    ppu.exec_cycle(261 * DOTS_PER_SCANLINE, &mut m, &mut sink);
    assert!(ppu.tiles.is_empty());
}

#[test]
fn oam_data_port_and_dma() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    ppu.write_register(3, 0x10, &mut m);
    ppu.write_register(4, 0xAB, &mut m);
    assert_eq!(ppu.oam[0x10], 0xAB);
    assert_eq!(ppu.oam_addr, 0x11);

    let mut page = [0u8; 256];
    for (i, b) in page.iter_mut().enumerate() {
        *b = i as u8;
    }
    ppu.write_register(3, 0, &mut m);
    ppu.oam_dma(&page);
    assert_eq!(ppu.oam[0xFF], 0xFF);
    ppu.write_register(3, 0x42, &mut m);
    assert_eq!(ppu.read_register(4, &m), 0x42);
}

#[test]
fn write_only_registers_read_back_io_latch() {
    let mut ppu = PPU::new();
    let mut m = chr_ram_mapper();
    ppu.write_register(5, 0x5A, &mut m);
    assert_eq!(ppu.read_register(0, &m), 0x5A);
    assert_eq!(ppu.read_register(2, &m) & 0x1F, 0x1A);
}
