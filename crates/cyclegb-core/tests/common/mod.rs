#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use cyclegb_core::{
    GameBoy, Hooks, MachineConfig, ModelSelection,
    cartridge::ROM_BANK_SIZE,
    ppu::FrameSink,
    storage::{MemoryStorage, SaveStorage},
};

/// Where post-boot execution starts.
pub const ENTRY: usize = 0x0100;

/// Builds cartridge images in memory. Every switchable bank carries its
/// number in its first two bytes (little endian) so tests can tell which bank
/// is mapped.
pub struct RomBuilder {
    rom: Vec<u8>,
}

impl RomBuilder {
    pub fn new() -> Self {
        Self::with_banks(2)
    }

    pub fn with_banks(banks: usize) -> Self {
        let mut rom = vec![0u8; banks * ROM_BANK_SIZE];
        for bank in 1..banks {
            let base = bank * ROM_BANK_SIZE;
            rom[base] = bank as u8;
            rom[base + 1] = (bank >> 8) as u8;
        }
        Self { rom }
    }

    pub fn title(mut self, title: &str) -> Self {
        for (i, b) in title.bytes().take(16).enumerate() {
            self.rom[0x134 + i] = b;
        }
        self
    }

    pub fn cgb(mut self) -> Self {
        self.rom[0x143] = 0x80;
        self
    }

    pub fn cart_type(mut self, kind: u8) -> Self {
        self.rom[0x147] = kind;
        self
    }

    pub fn ram_size(mut self, code: u8) -> Self {
        self.rom[0x149] = code;
        self
    }

    /// Place `code` at the post-boot entry point.
    pub fn code(self, code: &[u8]) -> Self {
        self.code_at(ENTRY, code)
    }

    pub fn code_at(mut self, addr: usize, code: &[u8]) -> Self {
        self.rom[addr..addr + code.len()].copy_from_slice(code);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.rom
    }
}

pub fn machine(rom: Vec<u8>, model: ModelSelection) -> GameBoy {
    machine_with_hooks(rom, model, Hooks::default())
}

pub fn machine_with_hooks(rom: Vec<u8>, model: ModelSelection, hooks: Hooks) -> GameBoy {
    let config = MachineConfig {
        model,
        boot_rom: None,
    };
    GameBoy::new(rom, config, hooks).expect("test ROM should load")
}

/// Monochrome machine running `code` from 0x0100.
pub fn dmg_with_code(code: &[u8]) -> GameBoy {
    machine(RomBuilder::new().code(code).build(), ModelSelection::ForceDmg)
}

/// Save storage that stays observable after being handed to a machine.
#[derive(Clone, Default)]
pub struct SharedStorage {
    pub inner: Rc<RefCell<MemoryStorage>>,
    pub saves: Rc<RefCell<usize>>,
}

impl SaveStorage for SharedStorage {
    fn save(&mut self, id: &str, data: &[u8]) -> std::io::Result<()> {
        *self.saves.borrow_mut() += 1;
        self.inner.borrow_mut().save(id, data)
    }

    fn load(&mut self, id: &str) -> std::io::Result<Option<Vec<u8>>> {
        self.inner.borrow_mut().load(id)
    }
}

/// Frame sink that counts presented frames and keeps the last one.
#[derive(Clone, Default)]
pub struct CountingSink {
    pub presented: Rc<RefCell<usize>>,
    pub last: Rc<RefCell<Vec<u8>>>,
}

impl FrameSink for CountingSink {
    fn present(&mut self, frame: &[u8]) {
        *self.presented.borrow_mut() += 1;
        *self.last.borrow_mut() = frame.to_vec();
    }
}
