//! Audio register boundary.
//!
//! Sound synthesis lives outside the core. The MMU forwards every access in
//! 0xFF10-0xFF3F to an [`AudioPort`]; the default [`RegisterLatch`] keeps
//! the register file so software reading back its own writes sees
//! hardware-plausible values.

pub const AUDIO_START: u16 = 0xFF10;
pub const AUDIO_END: u16 = 0xFF3F;

const NR52: u16 = 0xFF26;
const NR52_POWER: u8 = 0x80;

// Register contents after the boot ROM hands over.
const POWER_ON_REGS: [u8; 0x30] = [
    0x80, 0xBF, 0xF3, 0xFF, 0xBF, 0xFF, 0x3F, 0x00, 0xFF, 0xBF, 0x7F, 0xFF, 0x9F, 0xFF, 0xBF, 0xFF,
    0xFF, 0x00, 0x00, 0xBF, 0x77, 0xF3, 0xF1, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Receiver for sound register traffic.
pub trait AudioPort {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, val: u8);
}

/// Stores sound registers without producing any audio.
pub struct RegisterLatch {
    regs: [u8; 0x30],
}

impl RegisterLatch {
    pub fn new() -> Self {
        Self {
            regs: POWER_ON_REGS,
        }
    }

    /// Bits that always read back as 1 (write-only or unused).
    fn read_mask(addr: u16) -> u8 {
        match addr {
            0xFF10 => 0x80,
            0xFF11 | 0xFF16 => 0x3F,
            0xFF13 | 0xFF18 | 0xFF1B | 0xFF1D | 0xFF20 => 0xFF,
            0xFF14 | 0xFF19 | 0xFF1E | 0xFF23 => 0xBF,
            0xFF1A => 0x7F,
            0xFF1C => 0x9F,
            0xFF26 => 0x70,
            0xFF12 | 0xFF17 | 0xFF21 | 0xFF22 | 0xFF24 | 0xFF25 => 0x00,
            0xFF30..=0xFF3F => 0x00,
            _ => 0xFF,
        }
    }

    fn powered(&self) -> bool {
        self.regs[(NR52 - AUDIO_START) as usize] & NR52_POWER != 0
    }
}

impl AudioPort for RegisterLatch {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            AUDIO_START..=AUDIO_END => {
                self.regs[(addr - AUDIO_START) as usize] | Self::read_mask(addr)
            }
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        if !(AUDIO_START..=AUDIO_END).contains(&addr) {
            return;
        }
        // With the APU powered down only NR52 and wave RAM accept writes.
        let wave_ram = addr >= 0xFF30;
        if !self.powered() && addr != NR52 && !wave_ram {
            return;
        }
        if addr == NR52 {
            let idx = (NR52 - AUDIO_START) as usize;
            self.regs[idx] = val & NR52_POWER;
            if val & NR52_POWER == 0 {
                self.regs[..idx].fill(0);
            }
            return;
        }
        self.regs[(addr - AUDIO_START) as usize] = val;
    }
}

impl Default for RegisterLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_bits_read_high() {
        let mut apu = RegisterLatch::new();
        apu.write(0xFF11, 0x00);
        assert_eq!(apu.read(0xFF11), 0x3F);
        assert_eq!(apu.read(0xFF15), 0xFF);
    }

    #[test]
    fn power_off_clears_and_locks_registers() {
        let mut apu = RegisterLatch::new();
        apu.write(0xFF24, 0x77);
        apu.write(0xFF26, 0x00);
        assert_eq!(apu.read(0xFF24), 0x00);
        apu.write(0xFF24, 0x55);
        assert_eq!(apu.read(0xFF24), 0x00);

        apu.write(0xFF30, 0x12);
        assert_eq!(apu.read(0xFF30), 0x12);
    }
}
