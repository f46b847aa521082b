use log::{info, warn};

use crate::{
    apu::{AudioPort, RegisterLatch},
    cartridge::{Cartridge, Header},
    cpu::Cpu,
    error::CoreError,
    hardware::{Model, ModelSelection},
    input::Key,
    mmu::Mmu,
    ppu::{FrameSink, NullSink},
    storage::{MemoryStorage, SaveStorage},
};

/// Host-side collaborators handed to the machine at construction.
pub struct Hooks {
    pub frame_sink: Box<dyn FrameSink>,
    pub storage: Box<dyn SaveStorage>,
    pub audio: Box<dyn AudioPort>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            frame_sink: Box::new(NullSink),
            storage: Box::new(MemoryStorage::new()),
            audio: Box::new(RegisterLatch::new()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MachineConfig {
    pub model: ModelSelection,
    /// Boot ROM image to run before the cartridge. Without one the machine
    /// starts in the post-boot state at 0x0100.
    pub boot_rom: Option<Vec<u8>>,
}

pub struct GameBoy {
    pub cpu: Cpu,
    pub mmu: Mmu,
}

impl GameBoy {
    pub fn new(rom: Vec<u8>, config: MachineConfig, hooks: Hooks) -> Result<Self, CoreError> {
        let header = Header::parse(&rom)?;
        let model = config.model.resolve(header.cgb);
        let boot_rom = config
            .boot_rom
            .map(|image| validate_boot_rom(image, model))
            .transpose()?;

        let cart = Cartridge::new(rom)?;
        info!(
            "Starting {:?} machine for \"{}\" ({})",
            model,
            header.title,
            if boot_rom.is_some() {
                "boot ROM"
            } else {
                "post-boot state"
            }
        );

        let cpu = if boot_rom.is_some() {
            Cpu::power_on()
        } else {
            Cpu::new(model)
        };
        let mmu = Mmu::new(model, cart, boot_rom, hooks);
        Ok(Self { cpu, mmu })
    }

    /// Execute one instruction. Returns the T-cycles it took, including any
    /// interrupt dispatch.
    pub fn step(&mut self) -> Result<u32, CoreError> {
        self.cpu.step(&mut self.mmu)
    }

    /// Run until the PPU finishes the next frame.
    ///
    /// With the LCD disabled no frame ever completes, so this gives up after
    /// two frames' worth of cycles.
    pub fn run_frame(&mut self) -> Result<u64, CoreError> {
        const FRAME_CYCLES: u64 = 70_224;

        let start = self.mmu.ppu.frames();
        let mut spent = 0u64;
        while self.mmu.ppu.frames() == start && spent < FRAME_CYCLES * 2 {
            spent += self.step()? as u64;
        }
        self.mmu.ppu.clear_frame_flag();
        Ok(spent)
    }

    pub fn key_pressed(&mut self, key: Key) {
        self.mmu.joypad.key_pressed(key);
    }

    pub fn key_released(&mut self, key: Key) {
        self.mmu.joypad.key_released(key);
    }

    /// RGBA8888, 160x144.
    pub fn framebuffer(&self) -> &[u8] {
        self.mmu.ppu.framebuffer()
    }

    pub fn frames(&self) -> u64 {
        self.mmu.ppu.frames()
    }

    pub fn frame_ready(&self) -> bool {
        self.mmu.ppu.frame_ready()
    }

    /// Bytes shifted out over the serial port since the last call.
    pub fn take_serial(&mut self) -> Vec<u8> {
        self.mmu.take_serial()
    }

    pub fn flush_save(&mut self) {
        self.mmu.flush_save();
    }

    pub fn model(&self) -> Model {
        self.mmu.model()
    }
}

fn validate_boot_rom(mut image: Vec<u8>, model: Model) -> Result<Vec<u8>, CoreError> {
    let expected = model.boot_rom_len();
    if image.len() < expected {
        return Err(CoreError::InvalidBootRom {
            len: image.len(),
            expected,
        });
    }
    if image.len() > expected {
        warn!(
            "Boot ROM is {:#X} bytes, ignoring everything past {:#X}",
            image.len(),
            expected
        );
        image.truncate(expected);
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom(cgb_flag: u8) -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        rom[0x143] = cgb_flag;
        rom
    }

    #[test]
    fn model_follows_header_and_override() {
        let gb = GameBoy::new(rom(0x80), MachineConfig::default(), Hooks::default()).unwrap();
        assert_eq!(gb.model(), Model::Cgb);

        let config = MachineConfig {
            model: ModelSelection::ForceDmg,
            boot_rom: None,
        };
        let gb = GameBoy::new(rom(0x80), config, Hooks::default()).unwrap();
        assert_eq!(gb.model(), Model::Dmg);
        assert_eq!(gb.cpu.regs.a, 0x01);
    }

    #[test]
    fn short_boot_rom_is_rejected() {
        let config = MachineConfig {
            model: ModelSelection::ForceDmg,
            boot_rom: Some(vec![0; 0x80]),
        };
        let err = GameBoy::new(rom(0), config, Hooks::default())
            .err()
            .expect("short boot ROM must fail");
        assert_eq!(
            err,
            CoreError::InvalidBootRom {
                len: 0x80,
                expected: 0x100
            }
        );
    }

    #[test]
    fn oversized_boot_rom_is_truncated() {
        let config = MachineConfig {
            model: ModelSelection::ForceDmg,
            boot_rom: Some(vec![0; 0x180]),
        };
        let gb = GameBoy::new(rom(0), config, Hooks::default()).unwrap();
        assert_eq!(gb.cpu.regs.pc, 0x0000);
        assert!(gb.mmu.boot_mapped());
    }

    #[test]
    fn empty_rom_is_an_error() {
        let err = GameBoy::new(Vec::new(), MachineConfig::default(), Hooks::default())
            .err()
            .expect("empty ROM must fail");
        assert_eq!(err, CoreError::EmptyRom);
    }
}
