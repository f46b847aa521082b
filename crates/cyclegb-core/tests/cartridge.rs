mod common;

use common::{RomBuilder, SharedStorage, machine, machine_with_hooks};
use cyclegb_core::{
    Hooks, ModelSelection,
    cartridge::{Cartridge, ControllerKind, RamGate},
    storage::{FileStorage, SaveStorage},
};
use tempfile::tempdir;

fn switchable_bank(cart: &Cartridge) -> u16 {
    u16::from_le_bytes([cart.read(0x4000), cart.read(0x4001)])
}

#[test]
fn mbc1_bank_zero_aliases_skip_to_next_bank() {
    let rom = RomBuilder::with_banks(64).cart_type(0x01).build();
    let mut cart = Cartridge::new(rom).unwrap();
    assert_eq!(cart.kind(), ControllerKind::Mbc1);
    assert_eq!(switchable_bank(&cart), 1);

    cart.write(0x2000, 0x00);
    assert_eq!(switchable_bank(&cart), 1, "bank 0 maps bank 1");

    cart.write(0x2000, 0x05);
    assert_eq!(switchable_bank(&cart), 5);

    cart.write(0x4000, 0x01);
    cart.write(0x2000, 0x20);
    assert_eq!(switchable_bank(&cart), 0x21);
    assert_eq!(cart.rom_bank(), 0x21);

    // RAM banking mode drops the upper bits from the ROM bank.
    cart.write(0x6000, 0x01);
    assert_eq!(switchable_bank(&cart), 1);
}

#[test]
fn mbc1_bank_wraps_to_rom_size() {
    let rom = RomBuilder::with_banks(8).cart_type(0x01).build();
    let mut cart = Cartridge::new(rom).unwrap();
    cart.write(0x2000, 0x09);
    assert_eq!(switchable_bank(&cart), 1);
}

#[test]
fn mbc1_ram_banks_in_ram_mode() {
    let rom = RomBuilder::new().cart_type(0x03).ram_size(0x03).build();
    let mut cart = Cartridge::new(rom).unwrap();
    assert_eq!(cart.read(0xA000), 0xFF, "RAM disabled at power on");

    assert_eq!(cart.write(0x0000, 0x0A), Some(RamGate::Enabled));
    cart.write(0xA000, 0x11);
    cart.write(0x6000, 0x01);
    cart.write(0x4000, 0x02);
    cart.write(0xA000, 0x22);
    assert_eq!(cart.ram()[0x0000], 0x11);
    assert_eq!(cart.ram()[0x4000], 0x22);

    assert_eq!(cart.write(0x0000, 0x00), Some(RamGate::Disabled));
    assert_eq!(cart.read(0xA000), 0xFF);
    assert_eq!(cart.write(0x0000, 0x00), None, "no transition");
}

#[test]
fn mbc3_selects_ram_and_rtc() {
    let rom = RomBuilder::with_banks(128).cart_type(0x10).ram_size(0x03).build();
    let mut cart = Cartridge::new(rom).unwrap();
    cart.write(0x2000, 0x7F);
    assert_eq!(switchable_bank(&cart), 0x7F);

    cart.write(0x0000, 0x0A);
    cart.write(0x4000, 0x01);
    cart.write(0xA000, 0x5A);
    assert_eq!(cart.read(0xA000), 0x5A);
    assert_eq!(cart.ram()[0x2000], 0x5A);

    cart.write(0x4000, 0x0B);
    cart.write(0xA000, 45);
    cart.write(0x6000, 0x00);
    cart.write(0x6000, 0x01);
    assert_eq!(cart.read(0xA000), 45, "minutes latched");
    assert_eq!(cart.ram()[0x2000], 0x5A, "RTC writes leave RAM alone");
}

#[test]
fn mbc3_without_timer_reads_ff_for_rtc() {
    let rom = RomBuilder::new().cart_type(0x13).ram_size(0x03).build();
    let mut cart = Cartridge::new(rom).unwrap();
    cart.write(0x0000, 0x0A);
    cart.write(0x4000, 0x08);
    cart.write(0xA000, 10);
    assert_eq!(cart.read(0xA000), 0xFF);
}

#[test]
fn mbc5_uses_nine_bank_bits() {
    let rom = RomBuilder::with_banks(0x102).cart_type(0x19).build();
    let mut cart = Cartridge::new(rom).unwrap();
    assert_eq!(cart.kind(), ControllerKind::Mbc5);

    cart.write(0x2000, 0x00);
    assert_eq!(cart.rom_bank(), 0, "MBC5 can map bank 0");

    cart.write(0x2000, 0x01);
    cart.write(0x3000, 0x01);
    assert_eq!(switchable_bank(&cart), 0x101);

    cart.write(0x3000, 0x00);
    assert_eq!(switchable_bank(&cart), 0x001);
}

#[test]
fn mbc5_ram_banks() {
    let rom = RomBuilder::new().cart_type(0x1B).ram_size(0x03).build();
    let mut cart = Cartridge::new(rom).unwrap();
    cart.write(0x0000, 0x0A);
    cart.write(0x4000, 0x03);
    cart.write(0xBFFF, 0x77);
    assert_eq!(cart.ram()[0x7FFF], 0x77);
    cart.write(0x4000, 0x00);
    assert_eq!(cart.read(0xBFFF), 0x00);
}

#[test]
fn rom_only_ram_follows_header() {
    let plain = Cartridge::new(RomBuilder::new().build()).unwrap();
    assert_eq!(plain.read(0xA000), 0xFF);

    let rom = RomBuilder::new().cart_type(0x08).build();
    let mut with_ram = Cartridge::new(rom).unwrap();
    with_ram.write(0xA010, 0x33);
    assert_eq!(with_ram.read(0xA010), 0x33);
}

#[test]
fn load_ram_fills_prefix() {
    let rom = RomBuilder::new().cart_type(0x03).ram_size(0x02).build();
    let mut cart = Cartridge::new(rom).unwrap();
    cart.load_ram(&[1, 2, 3]);
    assert_eq!(&cart.ram()[..4], &[1, 2, 3, 0]);
    cart.load_ram(&vec![9; 0x9000]);
    assert_eq!(cart.ram().len(), 0x8000);
    assert!(cart.ram().iter().all(|&b| b == 9));
}

#[test]
fn battery_ram_round_trips_through_files() {
    let dir = tempdir().unwrap();
    let rom = RomBuilder::new()
        .title("SAVE TEST")
        .cart_type(0x03)
        .ram_size(0x03)
        .build();

    let hooks = || Hooks {
        storage: Box::new(FileStorage::new(dir.path())),
        ..Hooks::default()
    };

    let mut gb = machine_with_hooks(rom.clone(), ModelSelection::ForceDmg, hooks());
    let id = gb.mmu.cart.save_identifier();
    assert_eq!(id, "SAVETEST00");

    gb.mmu.write_byte(0x0000, 0x0A);
    gb.mmu.write_byte(0xA000, 0x42);
    gb.mmu.write_byte(0xA001, 0x43);
    gb.mmu.write_byte(0x0000, 0x00);

    let path = FileStorage::new(dir.path()).path_for(&id);
    let saved = std::fs::read(&path).unwrap();
    assert_eq!(saved.len(), 0x8000);
    assert_eq!(&saved[..2], &[0x42, 0x43]);

    let mut gb = machine_with_hooks(rom, ModelSelection::ForceDmg, hooks());
    assert_eq!(gb.mmu.read_byte(0xA000), 0xFF, "RAM still gated");
    gb.mmu.write_byte(0x0000, 0x0A);
    assert_eq!(gb.mmu.read_byte(0xA000), 0x42);
    assert_eq!(gb.mmu.read_byte(0xA001), 0x43);
}

#[test]
fn flush_only_saves_after_ram_was_enabled() {
    let storage = SharedStorage::default();
    let rom = RomBuilder::new().cart_type(0x1B).ram_size(0x03).build();
    let hooks = Hooks {
        storage: Box::new(storage.clone()),
        ..Hooks::default()
    };
    let mut gb = machine_with_hooks(rom, ModelSelection::ForceDmg, hooks);

    gb.flush_save();
    assert_eq!(*storage.saves.borrow(), 0);

    gb.mmu.write_byte(0x0000, 0x0A);
    gb.mmu.write_byte(0xA000, 0x99);
    gb.flush_save();
    assert_eq!(*storage.saves.borrow(), 1);
    let id = gb.mmu.cart.save_identifier();
    assert_eq!(storage.inner.borrow().get(&id).map(|d| d[0]), Some(0x99));
}

#[test]
fn enabling_twice_restores_once() {
    let mut storage = SharedStorage::default();
    let rom = RomBuilder::new().title("ONCE").cart_type(0x03).ram_size(0x03).build();
    storage.save("ONCE00", &[0x10, 0x20]).unwrap();

    let hooks = Hooks {
        storage: Box::new(storage.clone()),
        ..Hooks::default()
    };
    let mut gb = machine_with_hooks(rom, ModelSelection::ForceDmg, hooks);
    gb.mmu.write_byte(0x0000, 0x0A);
    assert_eq!(gb.mmu.read_byte(0xA000), 0x10);
    gb.mmu.write_byte(0xA000, 0x11);

    gb.mmu.write_byte(0x0000, 0x00);
    assert_eq!(storage.inner.borrow().get("ONCE00").map(|d| d[0]), Some(0x11));

    // Re-enabling must not reload whatever the store now holds.
    storage.inner.borrow_mut().save("ONCE00", &[0xEE]).unwrap();
    gb.mmu.write_byte(0x0000, 0x0A);
    assert_eq!(gb.mmu.read_byte(0xA000), 0x11);
}

#[test]
fn unknown_controller_runs_as_rom_only() {
    let rom = RomBuilder::with_banks(4).cart_type(0xFC).build();
    let gb = machine(rom, ModelSelection::ForceDmg);
    assert_eq!(gb.mmu.cart.kind(), ControllerKind::RomOnly);
    assert_eq!(switchable_bank(&gb.mmu.cart), 1);
}
