//! Cycle-counted Game Boy / Game Boy Color emulation core.
//!
//! This crate contains the platform-agnostic machine (CPU, memory map,
//! cartridge controllers, timer, PPU). Hosts drive it through the
//! [`gameboy`] facade and plug in frame, save and audio collaborators via
//! [`gameboy::Hooks`].

/// Sound register file behind the [`apu::AudioPort`] seam.
pub mod apu;

/// Cartridge header parsing and bank controllers (MBC1/3/5, RTC).
pub mod cartridge;

/// LR35902 CPU core.
pub mod cpu;

pub mod error;

/// High-level facade that wires the CPU and MMU into a single machine.
pub mod gameboy;

/// Hardware models and model selection.
pub mod hardware;

/// Joypad input register and edge-triggered interrupt behavior.
pub mod input;

pub mod interrupt;

/// Memory map and I/O register dispatch.
pub mod mmu;

/// Opcode descriptor tables.
pub mod opcodes;

/// Pixel Processing Unit (PPU) emulation, palettes and HDMA state.
pub mod ppu;

/// Serial unit.
pub mod serial;

/// Battery RAM persistence backends.
pub mod storage;

/// Divider/timer unit.
pub mod timer;

pub use error::CoreError;
pub use gameboy::{GameBoy, Hooks, MachineConfig};
pub use hardware::{Model, ModelSelection};
