use crate::{interrupt::Interrupt, mmu::IoMap};

pub const P1: u16 = 0xFF00;

const SELECT_DIRECTIONS: u8 = 0x10;
const SELECT_BUTTONS: u8 = 0x20;
const P1_UNUSED_BITS: u8 = 0xC0;

/// The eight physical keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    A,
    B,
    Start,
    Select,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    pub const ALL: [Key; 8] = [
        Key::A,
        Key::B,
        Key::Start,
        Key::Select,
        Key::Up,
        Key::Down,
        Key::Left,
        Key::Right,
    ];

    /// Bit in the internal state byte: buttons in the low nibble, directions
    /// in the high nibble, each in P1 line order.
    const fn mask(self) -> u8 {
        match self {
            Key::A => 0x01,
            Key::B => 0x02,
            Key::Select => 0x04,
            Key::Start => 0x08,
            Key::Right => 0x10,
            Key::Left => 0x20,
            Key::Up => 0x40,
            Key::Down => 0x80,
        }
    }
}

/// Joypad register (P1) and the host-side key state behind it.
pub struct Joypad {
    /// Pressed keys, 1 = pressed. See [`Key::mask`].
    state: u8,
    /// P1 bits 4-5 as last written.
    select: u8,
    /// Low nibble of P1 observed at the previous sample.
    last_lines: u8,
}

impl Joypad {
    pub fn new() -> Self {
        Self {
            state: 0,
            select: SELECT_DIRECTIONS | SELECT_BUTTONS,
            last_lines: 0x0F,
        }
    }

    pub fn key_pressed(&mut self, key: Key) {
        self.state |= key.mask();
    }

    pub fn key_released(&mut self, key: Key) {
        self.state &= !key.mask();
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.state & key.mask() != 0
    }

    /// Active-low input lines visible through the current column select.
    fn lines(&self) -> u8 {
        let mut low = 0x0F;
        if self.select & SELECT_BUTTONS == 0 {
            low &= !self.state & 0x0F;
        }
        if self.select & SELECT_DIRECTIONS == 0 {
            low &= !(self.state >> 4) & 0x0F;
        }
        low
    }

    pub fn read(&self) -> u8 {
        P1_UNUSED_BITS | self.select | self.lines()
    }

    pub fn write(&mut self, val: u8) {
        self.select = val & (SELECT_DIRECTIONS | SELECT_BUTTONS);
    }

    pub(crate) fn register_io(io: &mut IoMap) {
        io.bind(P1, |mmu, _| mmu.joypad.read(), |mmu, _, val| mmu.joypad.write(val));
    }

    /// Sample the lines once per CPU step; any line falling from released to
    /// pressed raises the Joypad interrupt.
    pub fn tick(&mut self, if_reg: &mut u8) {
        let lines = self.lines();
        if self.last_lines & !lines != 0 {
            Interrupt::Joypad.request(if_reg);
        }
        self.last_lines = lines;
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}
