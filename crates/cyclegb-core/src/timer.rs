use crate::{interrupt::Interrupt, mmu::IoMap};

// Timer register addresses (gbdev.io/pandocs/Timer_and_Divider_Registers.html)
pub const DIV: u16 = 0xFF04;
pub const TIMA: u16 = 0xFF05;
pub const TMA: u16 = 0xFF06;
pub const TAC: u16 = 0xFF07;

const TAC_ENABLE: u8 = 0x04;
const TAC_UNUSED_BITS: u8 = 0xF8;

pub struct Timer {
    /// 16-bit internal divider counter. DIV register is the upper 8 bits, so
    /// it advances once every 256 cycles.
    pub div: u16,
    /// Timer counter
    pub tima: u8,
    /// Timer modulo
    pub tma: u8,
    /// Timer control
    pub tac: u8,
    /// Cycles accumulated towards the next TIMA increment.
    counter_cycles: u32,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            div: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            counter_cycles: 0,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            DIV => (self.div >> 8) as u8,
            TIMA => self.tima,
            TMA => self.tma,
            TAC => self.tac | TAC_UNUSED_BITS,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            // Any write clears the divider, whatever the value.
            DIV => self.reset_div(),
            TIMA => self.tima = val,
            TMA => self.tma = val,
            TAC => self.tac = val & 0x07,
            _ => {}
        }
    }

    pub fn reset_div(&mut self) {
        self.div = 0;
        self.counter_cycles = 0;
    }

    pub(crate) fn register_io(io: &mut IoMap) {
        for addr in DIV..=TAC {
            io.bind(
                addr,
                |mmu, addr| mmu.timer.read(addr),
                |mmu, addr, val| mmu.timer.write(addr, val),
            );
        }
    }

    /// Cycles between TIMA increments for the current TAC clock select.
    pub fn period(&self) -> u32 {
        match self.tac & 0x03 {
            0x00 => 1024, // 4096 Hz
            0x01 => 16,   // 262144 Hz
            0x02 => 64,   // 65536 Hz
            _ => 256,     // 16384 Hz
        }
    }

    fn enabled(&self) -> bool {
        self.tac & TAC_ENABLE != 0
    }

    /// Advance the timer by `cycles` CPU cycles and update IF when TIMA
    /// overflows.
    pub fn tick(&mut self, cycles: u32, if_reg: &mut u8) {
        self.div = self.div.wrapping_add(cycles as u16);

        if !self.enabled() {
            return;
        }

        self.counter_cycles += cycles;
        let period = self.period();
        while self.counter_cycles >= period {
            self.counter_cycles -= period;
            let (next, overflow) = self.tima.overflowing_add(1);
            if overflow {
                self.tima = self.tma;
                Interrupt::Timer.request(if_reg);
            } else {
                self.tima = next;
            }
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
