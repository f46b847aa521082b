use log::{debug, warn};

use crate::{
    apu::{AUDIO_END, AUDIO_START, AudioPort},
    cartridge::{Cartridge, RamGate},
    gameboy::Hooks,
    hardware::Model,
    input::Joypad,
    interrupt,
    ppu::{DMA, OAM_SIZE, Ppu},
    serial::Serial,
    storage::SaveStorage,
    timer::Timer,
};

const WRAM_BANK_SIZE: usize = 0x1000;
const HRAM_SIZE: usize = 0x7F;

pub const BOOT: u16 = 0xFF50;
pub const HDMA1: u16 = 0xFF51;
pub const HDMA2: u16 = 0xFF52;
pub const HDMA3: u16 = 0xFF53;
pub const HDMA4: u16 = 0xFF54;
pub const HDMA5: u16 = 0xFF55;
pub const SVBK: u16 = 0xFF70;

const HDMA_BLOCK: u16 = 0x10;

/// Reads a memory-mapped register. Receives the full address.
pub type IoRead = fn(&mut Mmu, u16) -> u8;
/// Writes a memory-mapped register.
pub type IoWrite = fn(&mut Mmu, u16, u8);

#[derive(Clone, Copy)]
struct IoHandler {
    read: IoRead,
    write: IoWrite,
}

/// Accessor table for 0xFF00-0xFFFF. Components bind the registers they own
/// when the MMU is built; unbound addresses read 0xFF and ignore writes.
pub struct IoMap {
    handlers: [Option<IoHandler>; 0x100],
}

impl IoMap {
    fn new() -> Self {
        Self {
            handlers: [None; 0x100],
        }
    }

    pub fn bind(&mut self, addr: u16, read: IoRead, write: IoWrite) {
        debug_assert!(addr >= 0xFF00, "{addr:#06X} is not an I/O register");
        self.handlers[(addr & 0xFF) as usize] = Some(IoHandler { read, write });
    }

    fn get(&self, addr: u16) -> Option<IoHandler> {
        self.handlers[(addr & 0xFF) as usize]
    }

    pub fn is_bound(&self, addr: u16) -> bool {
        addr >= 0xFF00 && self.get(addr).is_some()
    }
}

pub struct Mmu {
    model: Model,
    wram: [[u8; WRAM_BANK_SIZE]; 8],
    wram_bank: usize,
    hram: [u8; HRAM_SIZE],
    pub cart: Cartridge,
    boot_rom: Option<Vec<u8>>,
    boot_mapped: bool,
    pub if_reg: u8,
    pub ie_reg: u8,
    pub ppu: Ppu,
    pub timer: Timer,
    pub serial: Serial,
    pub joypad: Joypad,
    pub apu: Box<dyn AudioPort>,
    storage: Box<dyn SaveStorage>,
    save_id: String,
    /// Saved RAM is restored on the first RAM enable only.
    ram_restored: bool,
    io: IoMap,
}

impl Mmu {
    /// Build the address space. With `boot_rom` the overlay is mapped and
    /// everything starts from power-on state; without it the registers hold
    /// what the boot ROM would have left behind.
    pub fn new(model: Model, cart: Cartridge, boot_rom: Option<Vec<u8>>, hooks: Hooks) -> Self {
        let cgb_cart = cart.header().cgb;
        let save_id = cart.save_identifier();
        let boot_mapped = boot_rom.is_some();

        let mut mmu = Self {
            model,
            wram: [[0; WRAM_BANK_SIZE]; 8],
            wram_bank: 1,
            hram: [0; HRAM_SIZE],
            cart,
            boot_rom,
            boot_mapped,
            if_reg: 0,
            ie_reg: 0,
            ppu: Ppu::new(model, cgb_cart, hooks.frame_sink),
            timer: Timer::new(),
            serial: Serial::new(),
            joypad: Joypad::new(),
            apu: hooks.audio,
            storage: hooks.storage,
            save_id,
            ram_restored: false,
            io: IoMap::new(),
        };
        mmu.register_io();

        if !boot_mapped {
            mmu.if_reg = 0xE1;
            mmu.ppu.apply_boot_state();
        }
        mmu
    }

    fn register_io(&mut self) {
        let io = &mut self.io;
        Joypad::register_io(io);
        Serial::register_io(io);
        Timer::register_io(io);
        interrupt::register_io(io);
        Ppu::register_io(io, self.model);

        for addr in AUDIO_START..=AUDIO_END {
            io.bind(
                addr,
                |mmu, addr| mmu.apu.read(addr),
                |mmu, addr, val| mmu.apu.write(addr, val),
            );
        }

        io.bind(DMA, |mmu, _| mmu.ppu.dma, |mmu, _, val| mmu.oam_dma(val));
        io.bind(
            BOOT,
            |_, _| 0xFF,
            |mmu, _, _| {
                if mmu.boot_mapped {
                    debug!("Boot ROM unmapped");
                }
                mmu.boot_mapped = false;
            },
        );

        if self.model.is_cgb() {
            for addr in HDMA1..=HDMA5 {
                io.bind(addr, Self::read_hdma, Self::write_hdma);
            }
            io.bind(
                SVBK,
                |mmu, _| 0xF8 | mmu.wram_bank as u8,
                |mmu, _, val| mmu.wram_bank = ((val & 0x07) as usize).max(1),
            );
        }
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn boot_mapped(&self) -> bool {
        self.boot_mapped
    }

    pub fn io(&self) -> &IoMap {
        &self.io
    }

    fn boot_byte(&self, addr: u16) -> Option<u8> {
        if !self.boot_mapped {
            return None;
        }
        let overlaid = match addr {
            0x0000..=0x00FF => true,
            0x0200..=0x08FF => self.model.is_cgb(),
            _ => false,
        };
        if !overlaid {
            return None;
        }
        self.boot_rom
            .as_ref()
            .and_then(|rom| rom.get(addr as usize).copied())
    }

    fn wram_index(&self, addr: u16) -> (usize, usize) {
        // Echo RAM mirrors 0xC000-0xDDFF.
        let addr = if addr >= 0xE000 { addr - 0x2000 } else { addr };
        match addr {
            0xC000..=0xCFFF => (0, (addr - 0xC000) as usize),
            _ => (self.wram_bank, (addr - 0xD000) as usize),
        }
    }

    pub fn read_byte(&mut self, addr: u16) -> u8 {
        if let Some(b) = self.boot_byte(addr) {
            return b;
        }
        match addr {
            0xFF00..=0xFF7F | 0xFFFF => match self.io.get(addr) {
                Some(h) => (h.read)(self, addr),
                None => 0xFF,
            },
            0x8000..=0x9FFF => self.ppu.read_vram(addr),
            0xC000..=0xFDFF => {
                let (bank, i) = self.wram_index(addr);
                self.wram[bank][i]
            }
            0xFE00..=0xFE9F => self.ppu.read_oam(addr),
            0xFEA0..=0xFEFF => 0xFF,
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize],
            _ => self.cart.read(addr),
        }
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF00..=0xFF7F | 0xFFFF => {
                if let Some(h) = self.io.get(addr) {
                    (h.write)(self, addr, val);
                }
            }
            0x8000..=0x9FFF => self.ppu.write_vram(addr, val),
            0xC000..=0xFDFF => {
                let (bank, i) = self.wram_index(addr);
                self.wram[bank][i] = val;
            }
            0xFE00..=0xFE9F => self.ppu.write_oam(addr, val),
            0xFEA0..=0xFEFF => {}
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize] = val,
            _ => {
                if let Some(gate) = self.cart.write(addr, val) {
                    self.on_ram_gate(gate);
                }
            }
        }
    }

    pub fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read_byte(addr) as u16;
        let hi = self.read_byte(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    pub fn write_word(&mut self, addr: u16, val: u16) {
        self.write_byte(addr, val as u8);
        self.write_byte(addr.wrapping_add(1), (val >> 8) as u8);
    }

    fn on_ram_gate(&mut self, gate: RamGate) {
        match gate {
            RamGate::Disabled => {
                debug!("Cartridge RAM disabled, saving {}", self.save_id);
                self.persist_ram();
            }
            RamGate::Enabled => {
                debug!("Cartridge RAM enabled");
                if !self.ram_restored {
                    self.ram_restored = true;
                    self.restore_ram();
                }
            }
        }
    }

    fn persist_ram(&mut self) {
        if let Err(e) = self.storage.save(&self.save_id, self.cart.ram()) {
            warn!("Failed to save RAM for {}: {e}", self.save_id);
        }
    }

    fn restore_ram(&mut self) {
        match self.storage.load(&self.save_id) {
            Ok(Some(data)) => {
                debug!("Restored {} bytes of RAM for {}", data.len(), self.save_id);
                self.cart.load_ram(&data);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to load RAM for {}: {e}", self.save_id),
        }
    }

    /// Persist RAM now, e.g. on shutdown. Skipped until software has enabled
    /// RAM at least once so an untouched buffer never replaces a real save.
    pub fn flush_save(&mut self) {
        if self.ram_restored {
            self.persist_ram();
        }
    }

    pub fn take_serial(&mut self) -> Vec<u8> {
        self.serial.take_output()
    }

    fn oam_dma(&mut self, val: u8) {
        self.ppu.dma = val;
        let src = (val as u16) << 8;
        for i in 0..OAM_SIZE as u16 {
            let byte = self.read_byte(src.wrapping_add(i));
            self.ppu.write_oam(0xFE00 + i, byte);
        }
    }

    fn read_hdma(mmu: &mut Mmu, addr: u16) -> u8 {
        let hdma = &mmu.ppu.hdma;
        match addr {
            HDMA5 if hdma.active => ((hdma.remaining - 1) as u8) & 0x7F,
            _ => 0xFF,
        }
    }

    fn write_hdma(mmu: &mut Mmu, addr: u16, val: u8) {
        let hdma = &mut mmu.ppu.hdma;
        match addr {
            HDMA1 => hdma.source = ((val as u16) << 8) | (hdma.source & 0x00F0),
            HDMA2 => hdma.source = (hdma.source & 0xFF00) | (val & 0xF0) as u16,
            HDMA3 => {
                hdma.dest = sanitize_vram_dma_dest(((val as u16) << 8) | (hdma.dest & 0x00F0))
            }
            HDMA4 => hdma.dest = sanitize_vram_dma_dest((hdma.dest & 0x1F00) | (val & 0xF0) as u16),
            _ => mmu.start_hdma(val),
        }
    }

    fn start_hdma(&mut self, val: u8) {
        let blocks = (val & 0x7F) as u16 + 1;
        let hdma = &mut self.ppu.hdma;
        if hdma.active && val & 0x80 == 0 {
            debug!("HDMA cancelled with {} blocks left", hdma.remaining);
            hdma.active = false;
            return;
        }

        hdma.remaining = blocks;
        if val & 0x80 == 0 {
            debug!(
                "General DMA {:04X} -> {:04X}, {} blocks",
                hdma.source, hdma.dest, blocks
            );
            while self.ppu.hdma.remaining > 0 {
                self.copy_hdma_block();
            }
        } else {
            debug!(
                "HBlank DMA {:04X} -> {:04X}, {} blocks",
                hdma.source, hdma.dest, blocks
            );
            hdma.active = true;
            if !self.ppu.lcd_on() || self.ppu.in_hblank() {
                self.copy_hdma_block();
            }
        }
    }

    /// Copy one block of a running HBlank DMA. Called on every HBlank entry.
    pub fn hdma_hblank_transfer(&mut self) {
        if self.ppu.hdma.active {
            self.copy_hdma_block();
        }
    }

    fn copy_hdma_block(&mut self) {
        for _ in 0..HDMA_BLOCK {
            let byte = self.read_byte(self.ppu.hdma.source);
            self.ppu.write_vram(self.ppu.hdma.dest, byte);
            let hdma = &mut self.ppu.hdma;
            hdma.source = hdma.source.wrapping_add(1);
            hdma.dest = if hdma.dest >= 0x9FFF {
                0x8000
            } else {
                hdma.dest + 1
            };
        }
        let hdma = &mut self.ppu.hdma;
        hdma.remaining = hdma.remaining.saturating_sub(1);
        if hdma.remaining == 0 {
            hdma.active = false;
        }
    }

    /// Advance the clocked components by `cycles`: timer, PPU (with any HBlank
    /// DMA block it makes due), then the joypad lines.
    pub fn tick(&mut self, cycles: u32) {
        self.timer.tick(cycles, &mut self.if_reg);
        if self.ppu.step(cycles, &mut self.if_reg) {
            self.hdma_hblank_transfer();
        }
        self.joypad.tick(&mut self.if_reg);
    }
}

#[inline]
fn sanitize_vram_dma_dest(addr: u16) -> u16 {
    0x8000 | (addr & 0x1FF0)
}
