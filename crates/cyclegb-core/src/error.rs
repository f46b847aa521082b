use thiserror::Error;

/// Failures surfaced by the emulation core.
///
/// Memory faults never show up here: out-of-range reads return `0xFF` and
/// stray writes are dropped, as on hardware.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("cartridge image is empty")]
    EmptyRom,

    #[error("cartridge image is {len:#X} bytes, too short to contain a header")]
    TruncatedHeader { len: usize },

    #[error("boot ROM is {len:#X} bytes; expected {expected:#X}")]
    InvalidBootRom { len: usize, expected: usize },

    #[error("unknown opcode {opcode:#04X} at {address:#06X}")]
    UnknownOpcode { opcode: u8, address: u16 },
}
