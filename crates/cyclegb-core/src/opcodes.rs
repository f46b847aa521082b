//! Instruction descriptor tables.
//!
//! Two 256-entry tables map an opcode to its base cost, mnemonic and
//! handler: the primary table and the 0xCB-prefixed table. They are built
//! once per process and shared by every [`Cpu`]. Handlers decode register
//! and condition operands from the opcode bits and return any cycles on top
//! of the base cost (taken branches).

use std::sync::OnceLock;

use crate::{
    cpu::{Cpu, FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Registers},
    mmu::Mmu,
};

/// Executes one instruction. Receives the opcode (the second byte for
/// CB-prefixed instructions) and returns extra cycles.
pub type Handler = fn(&mut Cpu, &mut Mmu, u8) -> u32;

#[derive(Clone, Copy)]
pub struct Instruction {
    pub mnemonic: &'static str,
    /// Base cost in T-cycles. CB entries include the prefix fetch.
    pub cycles: u32,
    pub handler: Handler,
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instruction")
            .field("mnemonic", &self.mnemonic)
            .field("cycles", &self.cycles)
            .finish()
    }
}

pub struct OpcodeTables {
    /// `None` for the undefined opcodes and for 0xCB, which the CPU follows
    /// into `cb`.
    pub primary: [Option<Instruction>; 256],
    pub cb: [Instruction; 256],
}

static TABLES: OnceLock<OpcodeTables> = OnceLock::new();

pub fn tables() -> &'static OpcodeTables {
    TABLES.get_or_init(build)
}

fn build() -> OpcodeTables {
    let mut primary = [None; 256];
    for (op, slot) in primary.iter_mut().enumerate() {
        *slot = primary_handler(op as u8).map(|handler| Instruction {
            mnemonic: PRIMARY_MNEMONICS[op],
            cycles: PRIMARY_CYCLES[op],
            handler,
        });
    }
    let cb = std::array::from_fn(|op| Instruction {
        mnemonic: CB_MNEMONICS[op],
        cycles: CB_CYCLES[op],
        handler: cb_handler(op as u8),
    });
    OpcodeTables { primary, cb }
}

fn primary_handler(op: u8) -> Option<Handler> {
    let handler: Handler = match op {
        0x00 => nop,
        0x10 => stop,
        0x76 => halt,
        0xF3 => di,
        0xFB => ei,

        0x01 | 0x11 | 0x21 | 0x31 => ld_r16_d16,
        0x02 | 0x12 | 0x22 | 0x32 | 0x0A | 0x1A | 0x2A | 0x3A => ld_indirect_a,
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => ld_r8_d8,
        0x08 => ld_a16_sp,
        0x40..=0x7F => ld_r8_r8,
        0xE0 | 0xF0 => ldh_a8,
        0xE2 | 0xF2 => ldh_c,
        0xEA | 0xFA => ld_a16_a,
        0xF8 => ld_hl_sp_r8,
        0xF9 => ld_sp_hl,

        0x03 | 0x13 | 0x23 | 0x33 => inc_r16,
        0x0B | 0x1B | 0x2B | 0x3B => dec_r16,
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => inc_r8,
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => dec_r8,
        0x09 | 0x19 | 0x29 | 0x39 => add_hl_r16,
        0xE8 => add_sp_r8,
        0x80..=0xBF => alu_r8,
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => alu_d8,

        0x07 => rlca,
        0x0F => rrca,
        0x17 => rla,
        0x1F => rra,
        0x27 => daa,
        0x2F => cpl,
        0x37 => scf,
        0x3F => ccf,

        0x18 => jr,
        0x20 | 0x28 | 0x30 | 0x38 => jr_cc,
        0xC3 => jp,
        0xC2 | 0xCA | 0xD2 | 0xDA => jp_cc,
        0xE9 => jp_hl,
        0xCD => call,
        0xC4 | 0xCC | 0xD4 | 0xDC => call_cc,
        0xC9 => ret,
        0xC0 | 0xC8 | 0xD0 | 0xD8 => ret_cc,
        0xD9 => reti,
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => rst,
        0xC5 | 0xD5 | 0xE5 | 0xF5 => push,
        0xC1 | 0xD1 | 0xE1 | 0xF1 => pop,

        // 0xCB and 0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD
        _ => return None,
    };
    Some(handler)
}

fn cb_handler(op: u8) -> Handler {
    match op {
        0x00..=0x3F => cb_shift,
        0x40..=0x7F => cb_bit,
        0x80..=0xBF => cb_res,
        _ => cb_set,
    }
}

// Control

fn nop(_: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    0
}

/// Speed switching is not modelled: STOP skips its padding byte and clears
/// DIV.
fn stop(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u32 {
    cpu.fetch8(mmu);
    mmu.timer.reset_div();
    0
}

fn halt(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    cpu.halted = true;
    0
}

fn di(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    cpu.ime = false;
    0
}

// Takes effect at once; the one-instruction delay of real hardware is not
// modelled.
fn ei(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    cpu.ime = true;
    0
}

// Loads

fn ld_r16_d16(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let val = cpu.fetch16(mmu);
    cpu.write_r16(op >> 4, val);
    0
}

/// LD (BC)/(DE)/(HL+)/(HL-) to or from A.
fn ld_indirect_a(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let hl = cpu.regs.hl();
    let addr = match op >> 4 {
        0 => cpu.regs.bc(),
        1 => cpu.regs.de(),
        2 => {
            cpu.regs.set_hl(hl.wrapping_add(1));
            hl
        }
        _ => {
            cpu.regs.set_hl(hl.wrapping_sub(1));
            hl
        }
    };
    if op & 0x08 == 0 {
        mmu.write_byte(addr, cpu.regs.a);
    } else {
        cpu.regs.a = mmu.read_byte(addr);
    }
    0
}

fn ld_r8_d8(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let val = cpu.fetch8(mmu);
    cpu.write_r8(mmu, op >> 3, val);
    0
}

fn ld_a16_sp(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u32 {
    let addr = cpu.fetch16(mmu);
    mmu.write_word(addr, cpu.regs.sp);
    0
}

fn ld_r8_r8(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let val = cpu.read_r8(mmu, op);
    cpu.write_r8(mmu, op >> 3, val);
    0
}

fn ldh_a8(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let addr = 0xFF00 | cpu.fetch8(mmu) as u16;
    if op == 0xE0 {
        mmu.write_byte(addr, cpu.regs.a);
    } else {
        cpu.regs.a = mmu.read_byte(addr);
    }
    0
}

fn ldh_c(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let addr = 0xFF00 | cpu.regs.c as u16;
    if op == 0xE2 {
        mmu.write_byte(addr, cpu.regs.a);
    } else {
        cpu.regs.a = mmu.read_byte(addr);
    }
    0
}

fn ld_a16_a(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let addr = cpu.fetch16(mmu);
    if op == 0xEA {
        mmu.write_byte(addr, cpu.regs.a);
    } else {
        cpu.regs.a = mmu.read_byte(addr);
    }
    0
}

/// SP plus a signed offset, flagged from the low byte as an unsigned add.
fn sp_offset(cpu: &mut Cpu, mmu: &mut Mmu) -> u16 {
    let sp = cpu.regs.sp;
    let offset = cpu.fetch8(mmu) as i8 as i16 as u16;
    let result = sp.wrapping_add(offset);
    let carries = sp ^ offset ^ result;
    cpu.regs
        .set_flags(false, false, carries & 0x10 != 0, carries & 0x100 != 0);
    result
}

fn ld_hl_sp_r8(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u32 {
    let val = sp_offset(cpu, mmu);
    cpu.regs.set_hl(val);
    0
}

fn add_sp_r8(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u32 {
    cpu.regs.sp = sp_offset(cpu, mmu);
    0
}

fn ld_sp_hl(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    cpu.regs.sp = cpu.regs.hl();
    0
}

// Arithmetic

fn inc_r16(cpu: &mut Cpu, _: &mut Mmu, op: u8) -> u32 {
    let val = cpu.read_r16(op >> 4).wrapping_add(1);
    cpu.write_r16(op >> 4, val);
    0
}

fn dec_r16(cpu: &mut Cpu, _: &mut Mmu, op: u8) -> u32 {
    let val = cpu.read_r16(op >> 4).wrapping_sub(1);
    cpu.write_r16(op >> 4, val);
    0
}

fn inc_r8(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let val = cpu.read_r8(mmu, op >> 3);
    let result = val.wrapping_add(1);
    cpu.write_r8(mmu, op >> 3, result);
    cpu.regs.set_flag(FLAG_Z, result == 0);
    cpu.regs.set_flag(FLAG_N, false);
    cpu.regs.set_flag(FLAG_H, val & 0x0F == 0x0F);
    0
}

fn dec_r8(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let val = cpu.read_r8(mmu, op >> 3);
    let result = val.wrapping_sub(1);
    cpu.write_r8(mmu, op >> 3, result);
    cpu.regs.set_flag(FLAG_Z, result == 0);
    cpu.regs.set_flag(FLAG_N, true);
    cpu.regs.set_flag(FLAG_H, val & 0x0F == 0x00);
    0
}

fn add_hl_r16(cpu: &mut Cpu, _: &mut Mmu, op: u8) -> u32 {
    let hl = cpu.regs.hl() as u32;
    let rr = cpu.read_r16(op >> 4) as u32;
    let result = hl + rr;
    cpu.regs.set_flag(FLAG_N, false);
    cpu.regs.set_flag(FLAG_H, (hl ^ rr ^ result) & 0x1000 != 0);
    cpu.regs.set_flag(FLAG_C, result > 0xFFFF);
    cpu.regs.set_hl(result as u16);
    0
}

/// The eight accumulator operations in encoding order: ADD, ADC, SUB, SBC,
/// AND, XOR, OR, CP.
fn alu(regs: &mut Registers, op: u8, val: u8) {
    let a = regs.a as u16;
    let v = val as u16;
    let carry_in = regs.flag(FLAG_C) as u16;
    match op & 0x07 {
        0 | 1 => {
            let result = a + v + if op & 0x07 == 1 { carry_in } else { 0 };
            regs.set_flags(
                result as u8 == 0,
                false,
                (a ^ v ^ result) & 0x10 != 0,
                result > 0xFF,
            );
            regs.a = result as u8;
        }
        2 | 3 | 7 => {
            let borrow_in = if op & 0x07 == 3 { carry_in } else { 0 };
            let result = a.wrapping_sub(v).wrapping_sub(borrow_in);
            regs.set_flags(
                result as u8 == 0,
                true,
                (a ^ v ^ result) & 0x10 != 0,
                result & 0x100 != 0,
            );
            if op & 0x07 != 7 {
                regs.a = result as u8;
            }
        }
        4 => {
            regs.a &= val;
            regs.set_flags(regs.a == 0, false, true, false);
        }
        5 => {
            regs.a ^= val;
            regs.set_flags(regs.a == 0, false, false, false);
        }
        _ => {
            regs.a |= val;
            regs.set_flags(regs.a == 0, false, false, false);
        }
    }
}

fn alu_r8(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let val = cpu.read_r8(mmu, op);
    alu(&mut cpu.regs, op >> 3, val);
    0
}

fn alu_d8(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let val = cpu.fetch8(mmu);
    alu(&mut cpu.regs, op >> 3, val);
    0
}

fn daa(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    let regs = &mut cpu.regs;
    let mut a = regs.a;
    let mut carry = regs.flag(FLAG_C);
    if regs.flag(FLAG_N) {
        if regs.flag(FLAG_H) {
            a = a.wrapping_sub(0x06);
        }
        if carry {
            a = a.wrapping_sub(0x60);
        }
    } else {
        if carry || a > 0x99 {
            a = a.wrapping_add(0x60);
            carry = true;
        }
        if regs.flag(FLAG_H) || a & 0x0F > 0x09 {
            a = a.wrapping_add(0x06);
        }
    }
    regs.a = a;
    regs.set_flag(FLAG_Z, a == 0);
    regs.set_flag(FLAG_H, false);
    regs.set_flag(FLAG_C, carry);
    0
}

fn cpl(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    cpu.regs.a = !cpu.regs.a;
    cpu.regs.set_flag(FLAG_N, true);
    cpu.regs.set_flag(FLAG_H, true);
    0
}

fn scf(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    cpu.regs.set_flag(FLAG_N, false);
    cpu.regs.set_flag(FLAG_H, false);
    cpu.regs.set_flag(FLAG_C, true);
    0
}

fn ccf(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    let carry = cpu.regs.flag(FLAG_C);
    cpu.regs.set_flag(FLAG_N, false);
    cpu.regs.set_flag(FLAG_H, false);
    cpu.regs.set_flag(FLAG_C, !carry);
    0
}

// Rotates and shifts

/// Shared by the accumulator rotates and CB 0x00-0x3F. Operation index in
/// encoding order: RLC, RRC, RL, RR, SLA, SRA, SWAP, SRL. Returns the result
/// and the carry out.
fn shift(op: u8, val: u8, carry_in: bool) -> (u8, bool) {
    match op & 0x07 {
        0 => (val.rotate_left(1), val & 0x80 != 0),
        1 => (val.rotate_right(1), val & 0x01 != 0),
        2 => ((val << 1) | carry_in as u8, val & 0x80 != 0),
        3 => ((val >> 1) | ((carry_in as u8) << 7), val & 0x01 != 0),
        4 => (val << 1, val & 0x80 != 0),
        5 => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
        6 => (val.rotate_left(4), false),
        _ => (val >> 1, val & 0x01 != 0),
    }
}

/// RLCA, RRCA, RLA, RRA: like their CB forms but Z is always cleared.
fn rotate_a(cpu: &mut Cpu, op: u8) -> u32 {
    let (result, carry) = shift(op, cpu.regs.a, cpu.regs.flag(FLAG_C));
    cpu.regs.a = result;
    cpu.regs.set_flags(false, false, false, carry);
    0
}

fn rlca(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    rotate_a(cpu, 0)
}

fn rrca(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    rotate_a(cpu, 1)
}

fn rla(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    rotate_a(cpu, 2)
}

fn rra(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    rotate_a(cpu, 3)
}

fn cb_shift(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let val = cpu.read_r8(mmu, op);
    let (result, carry) = shift(op >> 3, val, cpu.regs.flag(FLAG_C));
    cpu.write_r8(mmu, op, result);
    cpu.regs.set_flags(result == 0, false, false, carry);
    0
}

fn cb_bit(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let bit = (op >> 3) & 0x07;
    let val = cpu.read_r8(mmu, op);
    cpu.regs.set_flag(FLAG_Z, val & (1 << bit) == 0);
    cpu.regs.set_flag(FLAG_N, false);
    cpu.regs.set_flag(FLAG_H, true);
    0
}

fn cb_res(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let bit = (op >> 3) & 0x07;
    let val = cpu.read_r8(mmu, op);
    cpu.write_r8(mmu, op, val & !(1 << bit));
    0
}

fn cb_set(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let bit = (op >> 3) & 0x07;
    let val = cpu.read_r8(mmu, op);
    cpu.write_r8(mmu, op, val | (1 << bit));
    0
}

// Jumps, calls and the stack

fn jr(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u32 {
    let offset = cpu.fetch8(mmu) as i8;
    cpu.regs.pc = cpu.regs.pc.wrapping_add(offset as i16 as u16);
    0
}

fn jr_cc(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let offset = cpu.fetch8(mmu) as i8;
    if cpu.condition(op >> 3) {
        cpu.regs.pc = cpu.regs.pc.wrapping_add(offset as i16 as u16);
        4
    } else {
        0
    }
}

fn jp(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u32 {
    cpu.regs.pc = cpu.fetch16(mmu);
    0
}

fn jp_cc(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let target = cpu.fetch16(mmu);
    if cpu.condition(op >> 3) {
        cpu.regs.pc = target;
        4
    } else {
        0
    }
}

fn jp_hl(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u32 {
    cpu.regs.pc = cpu.regs.hl();
    0
}

fn call(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u32 {
    let target = cpu.fetch16(mmu);
    let ret = cpu.regs.pc;
    cpu.push(mmu, ret);
    cpu.regs.pc = target;
    0
}

fn call_cc(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let target = cpu.fetch16(mmu);
    if cpu.condition(op >> 3) {
        let ret = cpu.regs.pc;
        cpu.push(mmu, ret);
        cpu.regs.pc = target;
        12
    } else {
        0
    }
}

fn ret(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u32 {
    cpu.regs.pc = cpu.pop(mmu);
    0
}

fn ret_cc(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    if cpu.condition(op >> 3) {
        cpu.regs.pc = cpu.pop(mmu);
        12
    } else {
        0
    }
}

fn reti(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u32 {
    cpu.regs.pc = cpu.pop(mmu);
    cpu.ime = true;
    0
}

fn rst(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let ret = cpu.regs.pc;
    cpu.push(mmu, ret);
    cpu.regs.pc = (op & 0x38) as u16;
    0
}

/// PUSH/POP pair index: BC, DE, HL, AF.
fn push(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let val = match (op >> 4) & 0x03 {
        3 => cpu.regs.af(),
        idx => cpu.read_r16(idx),
    };
    cpu.push(mmu, val);
    0
}

fn pop(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u32 {
    let val = cpu.pop(mmu);
    match (op >> 4) & 0x03 {
        3 => cpu.regs.set_af(val),
        idx => cpu.write_r16(idx, val),
    }
    0
}

// Mnemonics and base costs in T-cycles. Conditional branches list the
// not-taken cost.

#[rustfmt::skip]
const PRIMARY_MNEMONICS: [&str; 256] = [
    "NOP", "LD BC,d16", "LD (BC),A", "INC BC", "INC B", "DEC B", "LD B,d8", "RLCA",
    "LD (a16),SP", "ADD HL,BC", "LD A,(BC)", "DEC BC", "INC C", "DEC C", "LD C,d8", "RRCA",
    "STOP d8", "LD DE,d16", "LD (DE),A", "INC DE", "INC D", "DEC D", "LD D,d8", "RLA",
    "JR r8", "ADD HL,DE", "LD A,(DE)", "DEC DE", "INC E", "DEC E", "LD E,d8", "RRA",
    "JR NZ,r8", "LD HL,d16", "LD (HL+),A", "INC HL", "INC H", "DEC H", "LD H,d8", "DAA",
    "JR Z,r8", "ADD HL,HL", "LD A,(HL+)", "DEC HL", "INC L", "DEC L", "LD L,d8", "CPL",
    "JR NC,r8", "LD SP,d16", "LD (HL-),A", "INC SP", "INC (HL)", "DEC (HL)", "LD (HL),d8", "SCF",
    "JR C,r8", "ADD HL,SP", "LD A,(HL-)", "DEC SP", "INC A", "DEC A", "LD A,d8", "CCF",
    "LD B,B", "LD B,C", "LD B,D", "LD B,E", "LD B,H", "LD B,L", "LD B,(HL)", "LD B,A",
    "LD C,B", "LD C,C", "LD C,D", "LD C,E", "LD C,H", "LD C,L", "LD C,(HL)", "LD C,A",
    "LD D,B", "LD D,C", "LD D,D", "LD D,E", "LD D,H", "LD D,L", "LD D,(HL)", "LD D,A",
    "LD E,B", "LD E,C", "LD E,D", "LD E,E", "LD E,H", "LD E,L", "LD E,(HL)", "LD E,A",
    "LD H,B", "LD H,C", "LD H,D", "LD H,E", "LD H,H", "LD H,L", "LD H,(HL)", "LD H,A",
    "LD L,B", "LD L,C", "LD L,D", "LD L,E", "LD L,H", "LD L,L", "LD L,(HL)", "LD L,A",
    "LD (HL),B", "LD (HL),C", "LD (HL),D", "LD (HL),E", "LD (HL),H", "LD (HL),L", "HALT", "LD (HL),A",
    "LD A,B", "LD A,C", "LD A,D", "LD A,E", "LD A,H", "LD A,L", "LD A,(HL)", "LD A,A",
    "ADD A,B", "ADD A,C", "ADD A,D", "ADD A,E", "ADD A,H", "ADD A,L", "ADD A,(HL)", "ADD A,A",
    "ADC A,B", "ADC A,C", "ADC A,D", "ADC A,E", "ADC A,H", "ADC A,L", "ADC A,(HL)", "ADC A,A",
    "SUB B", "SUB C", "SUB D", "SUB E", "SUB H", "SUB L", "SUB (HL)", "SUB A",
    "SBC A,B", "SBC A,C", "SBC A,D", "SBC A,E", "SBC A,H", "SBC A,L", "SBC A,(HL)", "SBC A,A",
    "AND B", "AND C", "AND D", "AND E", "AND H", "AND L", "AND (HL)", "AND A",
    "XOR B", "XOR C", "XOR D", "XOR E", "XOR H", "XOR L", "XOR (HL)", "XOR A",
    "OR B", "OR C", "OR D", "OR E", "OR H", "OR L", "OR (HL)", "OR A",
    "CP B", "CP C", "CP D", "CP E", "CP H", "CP L", "CP (HL)", "CP A",
    "RET NZ", "POP BC", "JP NZ,a16", "JP a16", "CALL NZ,a16", "PUSH BC", "ADD A,d8", "RST 00H",
    "RET Z", "RET", "JP Z,a16", "PREFIX CB", "CALL Z,a16", "CALL a16", "ADC A,d8", "RST 08H",
    "RET NC", "POP DE", "JP NC,a16", "", "CALL NC,a16", "PUSH DE", "SUB d8", "RST 10H",
    "RET C", "RETI", "JP C,a16", "", "CALL C,a16", "", "SBC A,d8", "RST 18H",
    "LDH (a8),A", "POP HL", "LD (C),A", "", "", "PUSH HL", "AND d8", "RST 20H",
    "ADD SP,r8", "JP (HL)", "LD (a16),A", "", "", "", "XOR d8", "RST 28H",
    "LDH A,(a8)", "POP AF", "LD A,(C)", "DI", "", "PUSH AF", "OR d8", "RST 30H",
    "LD HL,SP+r8", "LD SP,HL", "LD A,(a16)", "EI", "", "", "CP d8", "RST 38H",
];

#[rustfmt::skip]
const PRIMARY_CYCLES: [u32; 256] = [
    4, 12, 8, 8, 4, 4, 8, 4, 20, 8, 8, 8, 4, 4, 8, 4,
    4, 12, 8, 8, 4, 4, 8, 4, 12, 8, 8, 8, 4, 4, 8, 4,
    8, 12, 8, 8, 4, 4, 8, 4, 8, 8, 8, 8, 4, 4, 8, 4,
    8, 12, 8, 8, 12, 12, 12, 4, 8, 8, 8, 8, 4, 4, 8, 4,
    4, 4, 4, 4, 4, 4, 8, 4, 4, 4, 4, 4, 4, 4, 8, 4,
    4, 4, 4, 4, 4, 4, 8, 4, 4, 4, 4, 4, 4, 4, 8, 4,
    4, 4, 4, 4, 4, 4, 8, 4, 4, 4, 4, 4, 4, 4, 8, 4,
    8, 8, 8, 8, 8, 8, 4, 8, 4, 4, 4, 4, 4, 4, 8, 4,
    4, 4, 4, 4, 4, 4, 8, 4, 4, 4, 4, 4, 4, 4, 8, 4,
    4, 4, 4, 4, 4, 4, 8, 4, 4, 4, 4, 4, 4, 4, 8, 4,
    4, 4, 4, 4, 4, 4, 8, 4, 4, 4, 4, 4, 4, 4, 8, 4,
    4, 4, 4, 4, 4, 4, 8, 4, 4, 4, 4, 4, 4, 4, 8, 4,
    8, 12, 12, 16, 12, 16, 8, 16, 8, 16, 12, 4, 12, 24, 8, 16,
    8, 12, 12, 0, 12, 16, 8, 16, 8, 16, 12, 0, 12, 0, 8, 16,
    12, 12, 8, 0, 0, 16, 8, 16, 16, 4, 16, 0, 0, 0, 8, 16,
    12, 12, 8, 4, 0, 16, 8, 16, 12, 8, 16, 4, 0, 0, 8, 16,
];

#[rustfmt::skip]
const CB_MNEMONICS: [&str; 256] = [
    "RLC B", "RLC C", "RLC D", "RLC E", "RLC H", "RLC L", "RLC (HL)", "RLC A",
    "RRC B", "RRC C", "RRC D", "RRC E", "RRC H", "RRC L", "RRC (HL)", "RRC A",
    "RL B", "RL C", "RL D", "RL E", "RL H", "RL L", "RL (HL)", "RL A",
    "RR B", "RR C", "RR D", "RR E", "RR H", "RR L", "RR (HL)", "RR A",
    "SLA B", "SLA C", "SLA D", "SLA E", "SLA H", "SLA L", "SLA (HL)", "SLA A",
    "SRA B", "SRA C", "SRA D", "SRA E", "SRA H", "SRA L", "SRA (HL)", "SRA A",
    "SWAP B", "SWAP C", "SWAP D", "SWAP E", "SWAP H", "SWAP L", "SWAP (HL)", "SWAP A",
    "SRL B", "SRL C", "SRL D", "SRL E", "SRL H", "SRL L", "SRL (HL)", "SRL A",
    "BIT 0,B", "BIT 0,C", "BIT 0,D", "BIT 0,E", "BIT 0,H", "BIT 0,L", "BIT 0,(HL)", "BIT 0,A",
    "BIT 1,B", "BIT 1,C", "BIT 1,D", "BIT 1,E", "BIT 1,H", "BIT 1,L", "BIT 1,(HL)", "BIT 1,A",
    "BIT 2,B", "BIT 2,C", "BIT 2,D", "BIT 2,E", "BIT 2,H", "BIT 2,L", "BIT 2,(HL)", "BIT 2,A",
    "BIT 3,B", "BIT 3,C", "BIT 3,D", "BIT 3,E", "BIT 3,H", "BIT 3,L", "BIT 3,(HL)", "BIT 3,A",
    "BIT 4,B", "BIT 4,C", "BIT 4,D", "BIT 4,E", "BIT 4,H", "BIT 4,L", "BIT 4,(HL)", "BIT 4,A",
    "BIT 5,B", "BIT 5,C", "BIT 5,D", "BIT 5,E", "BIT 5,H", "BIT 5,L", "BIT 5,(HL)", "BIT 5,A",
    "BIT 6,B", "BIT 6,C", "BIT 6,D", "BIT 6,E", "BIT 6,H", "BIT 6,L", "BIT 6,(HL)", "BIT 6,A",
    "BIT 7,B", "BIT 7,C", "BIT 7,D", "BIT 7,E", "BIT 7,H", "BIT 7,L", "BIT 7,(HL)", "BIT 7,A",
    "RES 0,B", "RES 0,C", "RES 0,D", "RES 0,E", "RES 0,H", "RES 0,L", "RES 0,(HL)", "RES 0,A",
    "RES 1,B", "RES 1,C", "RES 1,D", "RES 1,E", "RES 1,H", "RES 1,L", "RES 1,(HL)", "RES 1,A",
    "RES 2,B", "RES 2,C", "RES 2,D", "RES 2,E", "RES 2,H", "RES 2,L", "RES 2,(HL)", "RES 2,A",
    "RES 3,B", "RES 3,C", "RES 3,D", "RES 3,E", "RES 3,H", "RES 3,L", "RES 3,(HL)", "RES 3,A",
    "RES 4,B", "RES 4,C", "RES 4,D", "RES 4,E", "RES 4,H", "RES 4,L", "RES 4,(HL)", "RES 4,A",
    "RES 5,B", "RES 5,C", "RES 5,D", "RES 5,E", "RES 5,H", "RES 5,L", "RES 5,(HL)", "RES 5,A",
    "RES 6,B", "RES 6,C", "RES 6,D", "RES 6,E", "RES 6,H", "RES 6,L", "RES 6,(HL)", "RES 6,A",
    "RES 7,B", "RES 7,C", "RES 7,D", "RES 7,E", "RES 7,H", "RES 7,L", "RES 7,(HL)", "RES 7,A",
    "SET 0,B", "SET 0,C", "SET 0,D", "SET 0,E", "SET 0,H", "SET 0,L", "SET 0,(HL)", "SET 0,A",
    "SET 1,B", "SET 1,C", "SET 1,D", "SET 1,E", "SET 1,H", "SET 1,L", "SET 1,(HL)", "SET 1,A",
    "SET 2,B", "SET 2,C", "SET 2,D", "SET 2,E", "SET 2,H", "SET 2,L", "SET 2,(HL)", "SET 2,A",
    "SET 3,B", "SET 3,C", "SET 3,D", "SET 3,E", "SET 3,H", "SET 3,L", "SET 3,(HL)", "SET 3,A",
    "SET 4,B", "SET 4,C", "SET 4,D", "SET 4,E", "SET 4,H", "SET 4,L", "SET 4,(HL)", "SET 4,A",
    "SET 5,B", "SET 5,C", "SET 5,D", "SET 5,E", "SET 5,H", "SET 5,L", "SET 5,(HL)", "SET 5,A",
    "SET 6,B", "SET 6,C", "SET 6,D", "SET 6,E", "SET 6,H", "SET 6,L", "SET 6,(HL)", "SET 6,A",
    "SET 7,B", "SET 7,C", "SET 7,D", "SET 7,E", "SET 7,H", "SET 7,L", "SET 7,(HL)", "SET 7,A",
];

#[rustfmt::skip]
const CB_CYCLES: [u32; 256] = [
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
    8, 8, 8, 8, 8, 8, 12, 8, 8, 8, 8, 8, 8, 8, 12, 8,
    8, 8, 8, 8, 8, 8, 12, 8, 8, 8, 8, 8, 8, 8, 12, 8,
    8, 8, 8, 8, 8, 8, 12, 8, 8, 8, 8, 8, 8, 8, 12, 8,
    8, 8, 8, 8, 8, 8, 12, 8, 8, 8, 8, 8, 8, 8, 12, 8,
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
    8, 8, 8, 8, 8, 8, 16, 8, 8, 8, 8, 8, 8, 8, 16, 8,
];
