//! NES controller input handling.
//!
//! Implements the standard NES controller shift protocol on $4016/$4017: while the strobe bit is
//! high the controller keeps reporting A; when strobe falls the read position restarts, and each
//! read returns the next button (A, B, Select, Start, Up, Down, Left, Right), cycling.

/// Buttons in the order the controller reports them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    A = 0,
    B = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
}

/// A single NES controller port.
#[derive(Default)]
pub struct Controller {
    /// Current button states, indexed by [`Button`].
    buttons: [bool; 8],
    /// Next button to report.
    position: u8,
    /// Last value of the strobe bit written to $4016.
    strobe: bool,
}

impl Controller {
    /// Create a new controller with no buttons pressed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.buttons[button as usize] = pressed;
    }

    pub fn set_buttons(&mut self, buttons: [bool; 8]) {
        self.buttons = buttons;
    }

    /// Read one button state. Bit 0 carries the button, $40 is open bus.
    pub fn read(&mut self) -> u8 {
        let bit = self.buttons[self.position as usize] as u8;
        if !self.strobe {
            self.position = (self.position + 1) % 8;
        }
        bit | 0x40
    }

    /// Write to $4016. Bit 0 is the strobe; a 1 → 0 transition restarts the read sequence.
    pub fn write(&mut self, data: u8) {
        let strobe = data & 1 != 0;
        // Held at A while high; restarts on the falling edge.
        if strobe || self.strobe {
            self.position = 0;
        }
        self.strobe = strobe;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latched(buttons: [bool; 8]) -> Controller {
        let mut c = Controller::new();
        c.set_buttons(buttons);
        c.write(1);
        c.write(0);
        c
    }

    #[test]
    fn reads_buttons_in_fixed_order() {
        let mut c = latched([true, false, false, true, false, false, true, false]);
        let bits: Vec<u8> = (0..8).map(|_| c.read() & 1).collect();
        assert_eq!(bits, vec![1, 0, 0, 1, 0, 0, 1, 0]);
    }

    #[test]
    fn read_position_cycles() {
        let mut c = latched([true, false, false, false, false, false, false, false]);
        for _ in 0..8 {
            c.read();
        }
        assert_eq!(c.read() & 1, 1);
    }

    #[test]
    fn strobe_high_keeps_reporting_a() {
        let mut c = Controller::new();
        c.set_button(Button::A, true);
        c.write(1);
        assert_eq!(c.read() & 1, 1);
        assert_eq!(c.read() & 1, 1);
    }

    #[test]
    fn falling_strobe_restarts_sequence() {
        let mut c = latched([false, true, false, false, false, false, false, false]);
        c.read();
        assert_eq!(c.read() & 1, 1);
        c.write(1);
        c.write(0);
        assert_eq!(c.read() & 1, 0);
        assert_eq!(c.read() & 1, 1);
    }

    #[test]
    fn open_bus_bits_are_set() {
        let mut c = Controller::new();
        assert_eq!(c.read(), 0x40);
    }
}
