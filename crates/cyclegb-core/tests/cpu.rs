mod common;

use common::{RomBuilder, dmg_with_code, machine};
use cyclegb_core::{
    CoreError, ModelSelection,
    cpu::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z},
};

#[test]
fn base_cycle_costs() {
    let mut gb = dmg_with_code(&[
        0x00, // NOP
        0x01, 0x34, 0x12, // LD BC,0x1234
        0x36, 0x99, // LD (HL),0x99 (HL = 0x014D, ROM; write ignored)
        0xCB, 0x46, // BIT 0,(HL)
        0xCB, 0x06, // RLC (HL)
        0x08, 0x00, 0xC0, // LD (0xC000),SP
    ]);
    let costs: Vec<u32> = (0..6).map(|_| gb.step().unwrap()).collect();
    assert_eq!(costs, vec![4, 12, 12, 12, 16, 20]);
    assert_eq!(gb.cpu.regs.bc(), 0x1234);
    assert_eq!(gb.mmu.read_word(0xC000), 0xFFFE);
    assert_eq!(gb.cpu.cycles(), 76);
}

#[test]
fn inc_dec_leave_carry_alone() {
    let mut gb = dmg_with_code(&[
        0x05, // DEC B
        0x2C, // INC L
    ]);
    assert_eq!(gb.cpu.regs.b, 0x00);
    assert_eq!(gb.cpu.regs.f, 0xB0);

    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.b, 0xFF);
    assert_eq!(gb.cpu.regs.f, FLAG_N | FLAG_H | FLAG_C, "DEC B flags");

    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.l, 0x4E);
    assert_eq!(gb.cpu.regs.f, FLAG_C, "INC L flags");
}

#[test]
fn dec_and_inc_without_half_carry() {
    let mut gb = dmg_with_code(&[
        0x06, 0x38, // LD B,0x38
        0x2E, 0x36, // LD L,0x36
        0x05, // DEC B
        0x2C, // INC L
    ]);
    gb.step().unwrap();
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.b, 0x37);
    assert!(!gb.cpu.regs.flag(FLAG_H));
    assert!(gb.cpu.regs.flag(FLAG_N));

    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.l, 0x37);
    assert!(!gb.cpu.regs.flag(FLAG_H));
    assert!(!gb.cpu.regs.flag(FLAG_N));
}

#[test]
fn add_and_sub_carry_flags() {
    let mut gb = dmg_with_code(&[
        0x3E, 0xF8, // LD A,0xF8
        0xC6, 0x08, // ADD A,0x08
        0xD6, 0x01, // SUB 0x01
        0xFE, 0xFF, // CP 0xFF
    ]);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0x00);
    assert_eq!(gb.cpu.regs.f, FLAG_Z | FLAG_H | FLAG_C);

    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0xFF);
    assert_eq!(gb.cpu.regs.f, FLAG_N | FLAG_H | FLAG_C, "borrow out of bit 7 and 4");

    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0xFF);
    assert_eq!(gb.cpu.regs.f, FLAG_Z | FLAG_N);
}

#[test]
fn conditional_jump_charges_extra_when_taken() {
    let mut gb = dmg_with_code(&[
        0xAF, // XOR A
        0x20, 0x05, // JR NZ,+5 (not taken)
        0x3C, // INC A
        0x20, 0xFE, // JR NZ,-2 (taken, loops on itself)
    ]);
    assert_eq!(gb.step().unwrap(), 4);
    assert!(gb.cpu.regs.flag(FLAG_Z));
    assert_eq!(gb.step().unwrap(), 8, "JR not taken");
    assert_eq!(gb.cpu.regs.pc, 0x0103);
    assert_eq!(gb.step().unwrap(), 4);
    assert_eq!(gb.step().unwrap(), 12, "JR taken");
    assert_eq!(gb.cpu.regs.pc, 0x0104);
}

#[test]
fn call_and_return() {
    let rom = RomBuilder::new()
        .code(&[0xCD, 0x00, 0x02]) // CALL 0x0200
        .code_at(0x0200, &[0xC0, 0xC9]) // RET NZ; RET
        .build();
    let mut gb = machine(rom, ModelSelection::ForceDmg);

    assert_eq!(gb.step().unwrap(), 24);
    assert_eq!(gb.cpu.regs.pc, 0x0200);
    assert_eq!(gb.cpu.regs.sp, 0xFFFC);
    assert_eq!(gb.mmu.read_word(0xFFFC), 0x0103);

    // Z is set after boot, so RET NZ falls through.
    assert_eq!(gb.step().unwrap(), 8);
    assert_eq!(gb.step().unwrap(), 16);
    assert_eq!(gb.cpu.regs.pc, 0x0103);
    assert_eq!(gb.cpu.regs.sp, 0xFFFE);
}

#[test]
fn interrupts_dispatch_in_priority_order() {
    let mut gb = dmg_with_code(&[0xFB, 0x00]); // EI; NOP
    gb.mmu.ie_reg = 0x1F;
    gb.mmu.if_reg = 0x1F;

    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 24, "EI plus dispatch");
    assert_eq!(gb.cpu.regs.pc, 0x0040, "VBlank first");
    assert!(!gb.cpu.ime);
    assert_eq!(gb.mmu.if_reg & 0x1F, 0x1E);
    assert_eq!(gb.mmu.read_word(gb.cpu.regs.sp), 0x0101);

    gb.cpu.ime = true;
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.pc, 0x0048, "LCD STAT next");
    assert_eq!(gb.mmu.if_reg & 0x1F, 0x1C);
}

#[test]
fn masked_interrupts_are_not_taken() {
    let mut gb = dmg_with_code(&[0xFB, 0x00, 0x00]);
    gb.mmu.ie_reg = 0x04;
    gb.mmu.if_reg = 0x01;
    assert_eq!(gb.step().unwrap(), 4);
    assert_eq!(gb.cpu.regs.pc, 0x0101);
    assert_eq!(gb.mmu.if_reg & 0x01, 0x01);
}

#[test]
fn halt_waits_for_pending_interrupt() {
    let mut gb = dmg_with_code(&[0x76, 0x00]); // HALT; NOP
    gb.mmu.ie_reg = 0x04;

    gb.step().unwrap();
    assert!(gb.cpu.halted);
    assert_eq!(gb.step().unwrap(), 4, "halted steps cost 4 cycles");
    assert!(gb.cpu.halted);
    assert_eq!(gb.cpu.regs.pc, 0x0101);

    // IME is off: wake without dispatching.
    gb.mmu.if_reg |= 0x04;
    gb.step().unwrap();
    assert!(!gb.cpu.halted);
    assert_eq!(gb.cpu.regs.pc, 0x0101);
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.pc, 0x0102);
}

#[test]
fn daa_adjusts_after_addition() {
    let mut gb = dmg_with_code(&[
        0x3E, 0x45, // LD A,0x45
        0xC6, 0x38, // ADD A,0x38
        0x27, // DAA
        0x3E, 0x99, // LD A,0x99
        0xC6, 0x01, // ADD A,0x01
        0x27, // DAA
    ]);
    for _ in 0..3 {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.regs.a, 0x83);
    assert!(!gb.cpu.regs.flag(FLAG_C));

    for _ in 0..3 {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.regs.a, 0x00);
    assert!(gb.cpu.regs.flag(FLAG_Z));
    assert!(gb.cpu.regs.flag(FLAG_C));
}

#[test]
fn pop_af_masks_low_flag_bits() {
    let mut gb = dmg_with_code(&[
        0x01, 0xFF, 0x12, // LD BC,0x12FF
        0xC5, // PUSH BC
        0xF1, // POP AF
    ]);
    for _ in 0..3 {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.regs.a, 0x12);
    assert_eq!(gb.cpu.regs.f, 0xF0);
}

#[test]
fn ld_hl_sp_offset_sets_carries_from_low_byte() {
    let mut gb = dmg_with_code(&[0xF8, 0x02]); // LD HL,SP+2
    assert_eq!(gb.step().unwrap(), 12);
    assert_eq!(gb.cpu.regs.hl(), 0x0000);
    assert_eq!(gb.cpu.regs.f, FLAG_H | FLAG_C);
}

#[test]
fn stop_skips_operand_and_clears_divider() {
    let mut gb = dmg_with_code(&[0x10, 0x00, 0x00]);
    gb.mmu.timer.div = 0x3400;
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.pc, 0x0102);
    assert_eq!(gb.mmu.read_byte(0xFF04), 0x00);
}

#[test]
fn unknown_opcode_kills_the_cpu() {
    let mut gb = dmg_with_code(&[0xD3]);
    let expected = CoreError::UnknownOpcode {
        opcode: 0xD3,
        address: 0x0100,
    };
    assert_eq!(gb.step(), Err(expected.clone()));
    assert!(gb.cpu.is_dead());
    assert_eq!(gb.step(), Err(expected), "every later step fails the same way");
}

#[test]
fn disassembly_substitutes_operands() {
    let mut gb = dmg_with_code(&[0x3E, 0x45, 0xC3, 0x50, 0x01]);
    let first = cyclegb_core::cpu::Cpu::disassemble(&mut gb.mmu, 0x0100);
    let second = cyclegb_core::cpu::Cpu::disassemble(&mut gb.mmu, 0x0102);
    assert!(first.contains("LD A,"), "{first}");
    assert!(first.contains("45"), "{first}");
    assert!(second.contains("0150"), "{second}");
}
