//! Memory bus and address decoding for the NES.
//!
//! Maps CPU addresses to RAM, PPU registers, controllers, save RAM, and the cartridge
//! ([CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map)).

use crate::{
    cartridge::{
        cartridge::{Cartridge, CartridgeError},
        mapper::{self, mapper::Mapper},
    },
    controller::Controller,
    display::{FrameBuffer, VideoSink},
    ppu::ppu::{OAM_LEN, PPU},
};

pub const RAM_SIZE: usize = 0x0800;
pub const SRAM_SIZE: usize = 0x2000;

/// PPU dots per CPU cycle (NTSC).
pub const PPU_DOTS_PER_CPU_CYCLE: u32 = 3;

/// Trait for memory-mapped I/O and bus access used by the CPU.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
    /// Let the rest of the system catch up after the CPU spent `cycles`.
    fn tick(&mut self, cycles: usize);
    /// Take a pending NMI, if any. Each NMI is reported once.
    fn poll_nmi(&mut self) -> bool;
    /// Level of the shared IRQ line.
    fn irq_pending(&self) -> bool;
}

/// Main NES bus: RAM, PPU, cartridge mapper, controllers, save RAM, and the video sink.
pub struct NesBus<V: VideoSink = FrameBuffer> {
    pub ram: [u8; RAM_SIZE],
    pub ppu: PPU,
    pub mapper: Box<dyn Mapper>,
    pub controller1: Controller,
    pub controller2: Controller,
    /// $6000–$7FFF battery/work RAM.
    pub sram: Vec<u8>,
    pub video: V,
}

impl<V: VideoSink> NesBus<V> {
    pub fn new(mapper: Box<dyn Mapper>, video: V) -> Self {
        let mut ppu = PPU::new();
        ppu.load_sprites(mapper.as_ref());
        Self {
            ram: [0; RAM_SIZE],
            ppu,
            mapper,
            controller1: Controller::new(),
            controller2: Controller::new(),
            sram: vec![0; SRAM_SIZE],
            video,
        }
    }

    /// Pick the mapper for `cart` and build a bus around it.
    pub fn from_cartridge(cart: Cartridge, video: V) -> Result<Self, CartridgeError> {
        Ok(Self::new(mapper::for_cartridge(cart)?, video))
    }

    /// Frames completed by the PPU.
    pub fn frame(&self) -> u64 {
        self.ppu.frame
    }

    /// $4014: copy CPU page `page` into OAM.
    fn oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        let mut data = [0u8; OAM_LEN];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = self.read(base | i as u16);
        }
        self.ppu.oam_dma(&data);
    }
}

impl<V: VideoSink> Bus for NesBus<V> {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => self.ppu.read_register(addr & 0x0007, self.mapper.as_ref()),
            0x4016 => self.controller1.read(),
            0x4017 => self.controller2.read(),
            // APU and test registers are not emulated
            0x4000..=0x401F => 0,
            // Expansion area
            0x4020..=0x5FFF => 0,
            0x6000..=0x7FFF => {
                if self.mapper.prg_ram_enabled() {
                    self.sram[(addr & 0x1FFF) as usize]
                } else {
                    0
                }
            }
            0x8000..=0xFFFF => self.mapper.read_prg(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            0x2000..=0x3FFF => {
                self.ppu
                    .write_register(addr & 0x0007, data, self.mapper.as_mut())
            }
            0x4014 => self.oam_dma(data),
            0x4016 => {
                // One strobe line feeds both ports.
                self.controller1.write(data);
                self.controller2.write(data);
            }
            0x4000..=0x401F => {}
            0x4020..=0x5FFF => {}
            0x6000..=0x7FFF => {
                if self.mapper.prg_ram_writable() {
                    self.sram[(addr & 0x1FFF) as usize] = data;
                }
            }
            // Cartridge: mapper registers
            0x8000..=0xFFFF => {
                self.mapper.write_prg(addr, data);
                // Bank switches can change what any cached tile decodes to.
                self.ppu.tiles.clear();
            }
        }
    }

    fn tick(&mut self, cycles: usize) {
        let dots = cycles as u32 * PPU_DOTS_PER_CPU_CYCLE;
        self.ppu
            .exec_cycle(dots, self.mapper.as_mut(), &mut self.video);
    }

    fn poll_nmi(&mut self) -> bool {
        // Consume NMI if PPU triggered vblank
        if self.ppu.nmi {
            self.ppu.nmi = false;
            true
        } else {
            false
        }
    }

    fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }
}
