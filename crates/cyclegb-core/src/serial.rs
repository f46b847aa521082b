use crate::{interrupt::Interrupt, mmu::IoMap};

pub const SB: u16 = 0xFF01;
pub const SC: u16 = 0xFF02;

const SC_START: u8 = 0x80;
const SC_INTERNAL_CLOCK: u8 = 0x01;
const SC_UNUSED_BITS: u8 = 0x7E;

/// Serial registers with no cable attached.
///
/// A transfer started on the internal clock completes at once: the outgoing
/// byte is captured in an output buffer (test ROMs print through it), SB
/// reads back as 0xFF and the Serial interrupt fires. Externally clocked
/// transfers never complete.
pub struct Serial {
    sb: u8,
    sc: u8,
    out_buf: Vec<u8>,
}

impl Serial {
    pub fn new() -> Self {
        Self {
            sb: 0,
            sc: 0,
            out_buf: Vec::new(),
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            SB => self.sb,
            SC => self.sc | SC_UNUSED_BITS,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8, if_reg: &mut u8) {
        match addr {
            SB => self.sb = val,
            SC => {
                self.sc = val & (SC_START | SC_INTERNAL_CLOCK);
                if self.sc == SC_START | SC_INTERNAL_CLOCK {
                    self.out_buf.push(self.sb);
                    self.sb = 0xFF;
                    self.sc &= !SC_START;
                    Interrupt::Serial.request(if_reg);
                }
            }
            _ => {}
        }
    }

    pub(crate) fn register_io(io: &mut IoMap) {
        for addr in [SB, SC] {
            io.bind(
                addr,
                |mmu, addr| mmu.serial.read(addr),
                |mmu, addr, val| mmu.serial.write(addr, val, &mut mmu.if_reg),
            );
        }
    }

    /// Drain everything sent since the last call.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out_buf)
    }
}

impl Default for Serial {
    fn default() -> Self {
        Self::new()
    }
}
