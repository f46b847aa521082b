mod common;

use common::{RomBuilder, machine};
use cyclegb_core::{ModelSelection, mmu::Mmu};

fn mmu() -> Mmu {
    let mut mmu = machine(RomBuilder::new().build(), ModelSelection::ForceDmg).mmu;
    mmu.if_reg = 0;
    mmu
}

#[test]
fn div_counts_every_256_cycles() {
    let mut mmu = mmu();
    mmu.tick(252);
    assert_eq!(mmu.read_byte(0xFF04), 0);
    mmu.tick(4);
    assert_eq!(mmu.read_byte(0xFF04), 1);
    mmu.tick(256 * 9);
    assert_eq!(mmu.read_byte(0xFF04), 10);

    mmu.write_byte(0xFF04, 0x77);
    assert_eq!(mmu.read_byte(0xFF04), 0, "any write clears DIV");
}

#[test]
fn tima_rate_follows_tac() {
    for (tac, period) in [(0x04u8, 1024u32), (0x05, 16), (0x06, 64), (0x07, 256)] {
        let mut mmu = mmu();
        mmu.write_byte(0xFF07, tac);
        mmu.tick(period * 3);
        assert_eq!(mmu.read_byte(0xFF05), 3, "TAC {tac:#04X}");
    }
}

#[test]
fn stopped_timer_holds_tima() {
    let mut mmu = mmu();
    mmu.write_byte(0xFF07, 0x01);
    mmu.tick(1024);
    assert_eq!(mmu.read_byte(0xFF05), 0);
    assert_eq!(mmu.read_byte(0xFF07), 0xF9);
}

#[test]
fn overflow_reloads_tma_and_requests_interrupt() {
    let mut mmu = mmu();
    mmu.write_byte(0xFF06, 0xF0);
    mmu.write_byte(0xFF05, 0xFF);
    mmu.write_byte(0xFF07, 0x05);
    mmu.tick(12);
    assert_eq!(mmu.if_reg & 0x04, 0);
    mmu.tick(4);
    assert_eq!(mmu.read_byte(0xFF05), 0xF0);
    assert_eq!(mmu.if_reg & 0x04, 0x04);
}

#[test]
fn div_reset_restarts_tima_phase() {
    let mut mmu = mmu();
    mmu.write_byte(0xFF07, 0x05);
    mmu.tick(12);
    mmu.write_byte(0xFF04, 0);
    mmu.tick(12);
    assert_eq!(mmu.read_byte(0xFF05), 0);
    mmu.tick(4);
    assert_eq!(mmu.read_byte(0xFF05), 1);
}
