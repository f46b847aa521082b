use log::error;
#[cfg(feature = "cpu-trace")]
use log::trace;

use crate::{
    error::CoreError,
    hardware::Model,
    interrupt::{INTERRUPT_MASK, Interrupt},
    mmu::Mmu,
    opcodes::{self, Instruction},
};

// CPU flag bits as documented in gbdev.io/pandocs/The_CPU_Flags.html
pub const FLAG_Z: u8 = 0x80; // Zero
pub const FLAG_N: u8 = 0x40; // Subtract
pub const FLAG_H: u8 = 0x20; // Half Carry
pub const FLAG_C: u8 = 0x10; // Carry

// Post-boot CPU state from gbdev.io/pandocs/Power_Up_State.html
const BOOT_PC: u16 = 0x0100;
const BOOT_SP: u16 = 0xFFFE;

const DMG_BOOT_REGS: [u8; 8] = [0x01, 0xB0, 0x00, 0x13, 0x00, 0xD8, 0x01, 0x4D];
const CGB_BOOT_REGS: [u8; 8] = [0x11, 0x80, 0x00, 0x00, 0x00, 0x08, 0x00, 0x7C];

/// Cycles charged for dispatching an interrupt.
pub const INTERRUPT_CYCLES: u32 = 20;
/// Cycles charged per step while halted.
const HALT_CYCLES: u32 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    fn post_boot(model: Model) -> Self {
        let [a, f, b, c, d, e, h, l] = match model {
            Model::Dmg => DMG_BOOT_REGS,
            Model::Cgb => CGB_BOOT_REGS,
        };
        Self {
            a,
            f,
            b,
            c,
            d,
            e,
            h,
            l,
            sp: BOOT_SP,
            pc: BOOT_PC,
        }
    }

    pub fn af(&self) -> u16 {
        ((self.a as u16) << 8) | (self.f & 0xF0) as u16
    }

    /// The low nibble of F does not exist in hardware and always reads zero.
    pub fn set_af(&mut self, val: u16) {
        self.a = (val >> 8) as u8;
        self.f = val as u8 & 0xF0;
    }

    pub fn bc(&self) -> u16 {
        ((self.b as u16) << 8) | self.c as u16
    }

    pub fn set_bc(&mut self, val: u16) {
        self.b = (val >> 8) as u8;
        self.c = val as u8;
    }

    pub fn de(&self) -> u16 {
        ((self.d as u16) << 8) | self.e as u16
    }

    pub fn set_de(&mut self, val: u16) {
        self.d = (val >> 8) as u8;
        self.e = val as u8;
    }

    pub fn hl(&self) -> u16 {
        ((self.h as u16) << 8) | self.l as u16
    }

    pub fn set_hl(&mut self, val: u16) {
        self.h = (val >> 8) as u8;
        self.l = val as u8;
    }

    #[inline]
    pub fn flag(&self, mask: u8) -> bool {
        self.f & mask != 0
    }

    #[inline]
    pub fn set_flag(&mut self, mask: u8, on: bool) {
        if on {
            self.f |= mask;
        } else {
            self.f &= !mask;
        }
    }

    /// Replace all four flags at once.
    #[inline]
    pub fn set_flags(&mut self, z: bool, n: bool, h: bool, c: bool) {
        self.f = if z { FLAG_Z } else { 0 }
            | if n { FLAG_N } else { 0 }
            | if h { FLAG_H } else { 0 }
            | if c { FLAG_C } else { 0 };
    }
}

pub struct Cpu {
    pub regs: Registers,
    pub ime: bool,
    pub halted: bool,
    /// Set by the first undecodable opcode; the CPU never runs again.
    fault: Option<CoreError>,
    cycles: u64,
}

impl Cpu {
    /// Registers as the boot ROM leaves them.
    pub fn new(model: Model) -> Self {
        Self {
            regs: Registers::post_boot(model),
            ime: false,
            halted: false,
            fault: None,
            cycles: 0,
        }
    }

    /// Cleared registers with PC at 0, for running a boot ROM.
    pub fn power_on() -> Self {
        Self {
            regs: Registers::default(),
            ime: false,
            halted: false,
            fault: None,
            cycles: 0,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    /// Total cycles consumed since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_dead(&self) -> bool {
        self.fault.is_some()
    }

    /// Run one instruction (or one halted slot), clock the rest of the
    /// machine by its cost, then service at most one interrupt.
    pub fn step(&mut self, mmu: &mut Mmu) -> Result<u32, CoreError> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }

        let mut cycles = if self.halted {
            HALT_CYCLES
        } else {
            self.execute(mmu)?
        };
        mmu.tick(cycles);

        let pending = mmu.if_reg & mmu.ie_reg & INTERRUPT_MASK;
        if pending != 0 {
            self.halted = false;
        }
        if self.ime
            && let Some(irq) = Interrupt::highest_priority(pending)
        {
            self.ime = false;
            let pc = self.regs.pc;
            self.push(mmu, pc);
            self.regs.pc = irq.vector();
            mmu.if_reg &= !irq.bit();
            mmu.tick(INTERRUPT_CYCLES);
            cycles += INTERRUPT_CYCLES;
        }

        self.cycles += cycles as u64;
        Ok(cycles)
    }

    fn execute(&mut self, mmu: &mut Mmu) -> Result<u32, CoreError> {
        let address = self.regs.pc;
        let opcode = self.fetch8(mmu);
        let tables = opcodes::tables();

        let (instr, op): (Instruction, u8) = if opcode == 0xCB {
            let op = self.fetch8(mmu);
            (tables.cb[op as usize], op)
        } else {
            match tables.primary[opcode as usize] {
                Some(instr) => (instr, opcode),
                None => {
                    let fault = CoreError::UnknownOpcode { opcode, address };
                    error!("{fault}; {}", self.debug_state());
                    self.fault = Some(fault.clone());
                    return Err(fault);
                }
            }
        };

        #[cfg(feature = "cpu-trace")]
        trace!("{address:04X}  {:<14} {}", instr.mnemonic, self.debug_state());

        let extra = (instr.handler)(self, mmu, op);
        Ok(instr.cycles + extra)
    }

    pub(crate) fn fetch8(&mut self, mmu: &mut Mmu) -> u8 {
        let val = mmu.read_byte(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        val
    }

    pub(crate) fn fetch16(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = self.fetch8(mmu) as u16;
        let hi = self.fetch8(mmu) as u16;
        (hi << 8) | lo
    }

    pub(crate) fn push(&mut self, mmu: &mut Mmu, val: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        mmu.write_byte(self.regs.sp, (val >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        mmu.write_byte(self.regs.sp, val as u8);
    }

    pub(crate) fn pop(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = mmu.read_byte(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = mmu.read_byte(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    /// 8-bit operand by encoding index: B, C, D, E, H, L, (HL), A.
    pub(crate) fn read_r8(&mut self, mmu: &mut Mmu, index: u8) -> u8 {
        match index & 0x07 {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            6 => mmu.read_byte(self.regs.hl()),
            _ => self.regs.a,
        }
    }

    pub(crate) fn write_r8(&mut self, mmu: &mut Mmu, index: u8, val: u8) {
        match index & 0x07 {
            0 => self.regs.b = val,
            1 => self.regs.c = val,
            2 => self.regs.d = val,
            3 => self.regs.e = val,
            4 => self.regs.h = val,
            5 => self.regs.l = val,
            6 => mmu.write_byte(self.regs.hl(), val),
            _ => self.regs.a = val,
        }
    }

    /// 16-bit pair by encoding index: BC, DE, HL, SP.
    pub(crate) fn read_r16(&self, index: u8) -> u16 {
        match index & 0x03 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    pub(crate) fn write_r16(&mut self, index: u8, val: u16) {
        match index & 0x03 {
            0 => self.regs.set_bc(val),
            1 => self.regs.set_de(val),
            2 => self.regs.set_hl(val),
            _ => self.regs.sp = val,
        }
    }

    /// Branch condition by encoding index: NZ, Z, NC, C.
    pub(crate) fn condition(&self, index: u8) -> bool {
        match index & 0x03 {
            0 => !self.regs.flag(FLAG_Z),
            1 => self.regs.flag(FLAG_Z),
            2 => !self.regs.flag(FLAG_C),
            _ => self.regs.flag(FLAG_C),
        }
    }

    /// Formatted CPU state string for debugging.
    pub fn debug_state(&self) -> String {
        format!(
            "AF:{:04X} BC:{:04X} DE:{:04X} HL:{:04X} PC:{:04X} SP:{:04X} IME:{} HALT:{} CY:{}",
            self.regs.af(),
            self.regs.bc(),
            self.regs.de(),
            self.regs.hl(),
            self.regs.pc,
            self.regs.sp,
            self.ime as u8,
            self.halted as u8,
            self.cycles
        )
    }

    /// Mnemonic of the instruction at `addr` with its immediate operand
    /// filled in, e.g. `LD A,$3F` or `JP $0150`.
    pub fn disassemble(mmu: &mut Mmu, addr: u16) -> String {
        let opcode = mmu.read_byte(addr);
        let tables = opcodes::tables();
        if opcode == 0xCB {
            let op = mmu.read_byte(addr.wrapping_add(1));
            return tables.cb[op as usize].mnemonic.to_string();
        }
        let Some(instr) = tables.primary[opcode as usize] else {
            return format!("DB ${opcode:02X}");
        };

        let b1 = mmu.read_byte(addr.wrapping_add(1));
        let b2 = mmu.read_byte(addr.wrapping_add(2));
        let word = ((b2 as u16) << 8) | b1 as u16;
        let m = instr.mnemonic;
        if m.contains("d16") || m.contains("a16") {
            m.replace("d16", &format!("${word:04X}"))
                .replace("a16", &format!("${word:04X}"))
        } else if m.contains("r8") {
            let target = addr.wrapping_add(2).wrapping_add(b1 as i8 as u16);
            if m.starts_with("JR") {
                m.replace("r8", &format!("${target:04X}"))
            } else {
                m.replace("r8", &format!("{}", b1 as i8))
            }
        } else {
            m.replace("d8", &format!("${b1:02X}"))
                .replace("a8", &format!("$FF{b1:02X}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn af_masks_low_nibble() {
        let mut regs = Registers::default();
        regs.set_af(0x12FF);
        assert_eq!(regs.a, 0x12);
        assert_eq!(regs.f, 0xF0);
        assert_eq!(regs.af(), 0x12F0);
    }

    #[test]
    fn post_boot_registers_per_model() {
        let dmg = Cpu::new(Model::Dmg);
        assert_eq!(dmg.regs.af(), 0x01B0);
        assert_eq!(dmg.regs.bc(), 0x0013);
        assert_eq!(dmg.regs.de(), 0x00D8);
        assert_eq!(dmg.regs.hl(), 0x014D);
        assert_eq!(dmg.regs.sp, 0xFFFE);
        assert_eq!(dmg.regs.pc, 0x0100);

        let cgb = Cpu::new(Model::Cgb);
        assert_eq!(cgb.regs.af(), 0x1180);
        assert_eq!(cgb.regs.de(), 0x0008);
        assert_eq!(cgb.regs.hl(), 0x007C);

        let cold = Cpu::power_on();
        assert_eq!(cold.regs, Registers::default());
    }
}
