//! NES emulator entry point.
//!
//! Loads a cartridge and runs it in a window, or headless for a fixed number of frames.
//! Usage: nescore [--frames N] [--nestest] path/to/game.nes

use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use ansi_term::Colour::{Green, Red};
use clap::Parser;
use minifb::{Key, Scale, Window, WindowOptions};
use nescore::{
    cartridge::cartridge::Cartridge,
    controller::Button,
    display::{FrameBuffer, SCREEN_HEIGHT, SCREEN_WIDTH},
    nes::Nes,
};

/// NES runs at ~60.0988 Hz (NTSC). Target one frame per 16.67 ms for ~60 fps.
const FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

/// nestest.nes runs its automated mode from here.
const NESTEST_ENTRY: u16 = 0xC000;

const KEY_MAP: [(Key, Button); 8] = [
    (Key::Z, Button::A),
    (Key::X, Button::B),
    (Key::RightShift, Button::Select),
    (Key::Enter, Button::Start),
    (Key::Up, Button::Up),
    (Key::Down, Button::Down),
    (Key::Left, Button::Left),
    (Key::Right, Button::Right),
];

/// NES emulator
#[derive(Parser, Debug)]
#[command(name = "nescore", version, about = "A cycle-stepped NES emulator")]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Run this many frames without a window, then print a frame checksum
    #[arg(short, long)]
    frames: Option<u64>,

    /// Start at $C000 (nestest automated mode) instead of the reset vector
    #[arg(long)]
    nestest: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(message) = run(&args) {
        eprintln!("{} {}", Red.bold().paint("ERROR"), message);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let cart = Cartridge::load(&args.rom).map_err(|e| format!("{}: {e}", args.rom.display()))?;
    let mut nes = Nes::new(cart, FrameBuffer::new()).map_err(|e| e.to_string())?;

    if args.nestest {
        nes.cpu.pc = NESTEST_ENTRY;
        nes.cpu.cycles = 7;
    }

    match args.frames {
        Some(frames) => run_headless(&mut nes, frames),
        None => run_windowed(&mut nes),
    }
}

fn run_headless(nes: &mut Nes, frames: u64) -> Result<(), String> {
    for _ in 0..frames {
        nes.run_frame();
    }
    println!(
        "{} {} frames, {} CPU cycles, checksum {:016x}",
        Green.bold().paint("DONE"),
        nes.frame(),
        nes.cpu.cycles,
        checksum(nes.video().pixels())
    );
    Ok(())
}

fn run_windowed(nes: &mut Nes) -> Result<(), String> {
    let mut window = Window::new(
        "nescore",
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
        WindowOptions {
            resize: true,
            scale: Scale::X2,
            ..WindowOptions::default()
        },
    )
    .map_err(|e| format!("failed to create window: {e}"))?;

    window.set_target_fps(60);

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        let controller = nes.controller1();
        for (key, button) in KEY_MAP {
            controller.set_button(button, window.is_key_down(key));
        }

        nes.run_frame();

        window
            .update_with_buffer(nes.video().pixels(), SCREEN_WIDTH, SCREEN_HEIGHT)
            .map_err(|e| format!("failed to update window: {e}"))?;

        // Pace to ~60 fps so we don't burn CPU (emulation is far faster than real NES)
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }
    Ok(())
}

/// FNV-1a over the frame, for comparing headless runs.
fn checksum(pixels: &[u32]) -> u64 {
    pixels.iter().fold(0xcbf2_9ce4_8422_2325, |hash, &pixel| {
        (hash ^ pixel as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}
