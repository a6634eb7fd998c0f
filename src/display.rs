//! Pixel output for the PPU.
//!
//! The PPU pushes every pixel of a finished frame through [`VideoSink::draw_pixel`] and then
//! calls [`VideoSink::present`] once. It never reads pixels back.

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;

/// Destination for rendered frames.
pub trait VideoSink {
    /// Set pixel (x, y) to a 0xRRGGBB color.
    fn draw_pixel(&mut self, x: usize, y: usize, rgb: u32);
    /// The frame is complete.
    fn present(&mut self);
}

/// 256×240 framebuffer (0xRRGGBB per pixel), row-major. Counts presented frames.
pub struct FrameBuffer {
    pixels: Vec<u32>,
    frames: u64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            frames: 0,
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * SCREEN_WIDTH + x]
    }

    /// Number of frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSink for FrameBuffer {
    fn draw_pixel(&mut self, x: usize, y: usize, rgb: u32) {
        if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
            self.pixels[y * SCREEN_WIDTH + x] = rgb;
        }
    }

    fn present(&mut self) {
        self.frames += 1;
    }
}
