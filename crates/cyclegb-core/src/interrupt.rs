// Interrupt sources in priority order (gbdev.io/pandocs/Interrupts.html)

use crate::mmu::IoMap;

pub const IF: u16 = 0xFF0F;
pub const IE: u16 = 0xFFFF;

/// IF bits above the five interrupt lines always read back as set.
pub const IF_UNUSED_BITS: u8 = 0xE0;
pub const INTERRUPT_MASK: u8 = 0x1F;

const VECTOR_BASE: u16 = 0x0040;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Interrupt {
    VBlank = 0,
    LcdStat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

impl Interrupt {
    pub const ALL: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::LcdStat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    #[inline]
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Handler address: 0x40, 0x48, 0x50, 0x58, 0x60.
    #[inline]
    pub const fn vector(self) -> u16 {
        VECTOR_BASE + (self as u16) * 8
    }

    #[inline]
    pub fn request(self, if_reg: &mut u8) {
        *if_reg |= self.bit();
    }

    /// Lowest-numbered line set in `pending`, which wins arbitration.
    pub fn highest_priority(pending: u8) -> Option<Interrupt> {
        Self::ALL
            .into_iter()
            .find(|irq| pending & irq.bit() != 0)
    }
}

/// Bind IF and IE. Both live on the MMU so every component can raise a line.
pub(crate) fn register_io(io: &mut IoMap) {
    io.bind(
        IF,
        |mmu, _| mmu.if_reg | IF_UNUSED_BITS,
        |mmu, _, val| mmu.if_reg = val & INTERRUPT_MASK,
    );
    io.bind(IE, |mmu, _| mmu.ie_reg, |mmu, _, val| mmu.ie_reg = val);
}
