//! The console: CPU, bus, PPU, and cartridge wired together.

use crate::{
    bus::NesBus,
    cartridge::cartridge::{Cartridge, CartridgeError},
    controller::Controller,
    cpu::cpu::CPU,
    display::{FrameBuffer, VideoSink},
};

pub struct Nes<V: VideoSink = FrameBuffer> {
    pub cpu: CPU<NesBus<V>>,
}

impl<V: VideoSink> Nes<V> {
    /// Insert `cart`, power on, and reset. Fails if the cartridge's mapper is not supported.
    pub fn new(cart: Cartridge, video: V) -> Result<Self, CartridgeError> {
        let bus = NesBus::from_cartridge(cart, video)?;
        let mut cpu = CPU::new(bus);
        cpu.reset();
        log::info!("Reset vector ${:04X}", cpu.pc);
        Ok(Self { cpu })
    }

    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// One CPU step (an interrupt or an instruction) and the PPU time it covers.
    pub fn step(&mut self) -> usize {
        self.cpu.step()
    }

    /// Step until the PPU finishes the current frame. Returns the CPU cycles spent.
    pub fn run_frame(&mut self) -> usize {
        let frame = self.frame();
        let mut cycles = 0;
        while self.frame() == frame {
            cycles += self.step();
        }
        cycles
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.cpu.bus.frame()
    }

    pub fn video(&self) -> &V {
        &self.cpu.bus.video
    }

    pub fn controller1(&mut self) -> &mut Controller {
        &mut self.cpu.bus.controller1
    }

    pub fn controller2(&mut self) -> &mut Controller {
        &mut self.cpu.bus.controller2
    }
}
