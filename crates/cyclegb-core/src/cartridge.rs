use std::time::SystemTime;

use log::{info, warn};

use crate::error::CoreError;

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const RAM_BANK_SIZE: usize = 0x2000;
/// Cartridge RAM is always backed by four banks, whatever the header says.
pub const CART_RAM_SIZE: usize = 0x8000;

const HEADER_END: usize = 0x0150;

/// Controller families the core knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    RomOnly,
    Mbc1,
    Mbc3,
    Mbc5,
}

/// Parsed cartridge header (0x0100-0x014F).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub title: String,
    pub cgb: bool,
    pub cart_type: u8,
    pub ram_size_code: u8,
    pub header_checksum: u8,
    pub global_checksum: u16,
}

impl Header {
    pub fn parse(data: &[u8]) -> Result<Self, CoreError> {
        if data.is_empty() {
            return Err(CoreError::EmptyRom);
        }
        if data.len() < HEADER_END {
            return Err(CoreError::TruncatedHeader { len: data.len() });
        }

        let mut title = &data[0x0134..0x0143];
        if let Some(pos) = title.iter().position(|&b| b == 0) {
            title = &title[..pos];
        }

        Ok(Self {
            title: String::from_utf8_lossy(title).trim().to_string(),
            cgb: data[0x0143] & 0x80 != 0,
            cart_type: data[0x0147],
            ram_size_code: data[0x0149],
            header_checksum: data[0x014D],
            global_checksum: u16::from_be_bytes([data[0x014E], data[0x014F]]),
        })
    }

    /// `None` for controller codes the core does not implement.
    pub fn controller(&self) -> Option<ControllerKind> {
        match self.cart_type {
            0x00 | 0x08 | 0x09 => Some(ControllerKind::RomOnly),
            0x01..=0x03 => Some(ControllerKind::Mbc1),
            0x0F..=0x13 => Some(ControllerKind::Mbc3),
            0x19..=0x1E => Some(ControllerKind::Mbc5),
            _ => None,
        }
    }

    pub fn has_rtc(&self) -> bool {
        matches!(self.cart_type, 0x0F | 0x10)
    }

    pub fn declares_ram(&self) -> bool {
        self.ram_size_code != 0 || matches!(self.cart_type, 0x08 | 0x09)
    }

    /// Key under which battery RAM is persisted: title, header checksum and
    /// global checksum in decimal, with all whitespace removed.
    pub fn save_identifier(&self) -> String {
        format!(
            "{}{}{}",
            self.title, self.header_checksum, self.global_checksum
        )
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
    }
}

/// RAM gate change reported by [`Cartridge::write`] so the owner can
/// persist or restore RAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamGate {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RtcRegisters {
    seconds: u8,
    minutes: u8,
    hours: u8,
    days: u16,
    halt: bool,
    carry: bool,
}

impl RtcRegisters {
    fn control_byte(&self) -> u8 {
        let mut out = ((self.days >> 8) as u8) & 0x01;
        if self.halt {
            out |= 0x40;
        }
        if self.carry {
            out |= 0x80;
        }
        out
    }
}

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// MBC3 clock. The running registers follow wall-clock time; software only
/// ever sees the snapshot taken by the last latch.
#[derive(Debug, Clone)]
struct Mbc3Rtc {
    regs: RtcRegisters,
    latched: RtcRegisters,
    last_update: SystemTime,
    subsecond_nanos: u32,
}

impl Mbc3Rtc {
    fn new(now: SystemTime) -> Self {
        let regs = RtcRegisters::default();
        Self {
            regs,
            latched: regs,
            last_update: now,
            subsecond_nanos: 0,
        }
    }

    fn latch(&mut self, now: SystemTime) {
        self.sync_wall(now);
        self.latched = self.regs;
    }

    fn read_latched(&self, reg: u8) -> u8 {
        match reg {
            0x08 => self.latched.seconds & 0x3F,
            0x09 => self.latched.minutes & 0x3F,
            0x0A => self.latched.hours & 0x1F,
            0x0B => (self.latched.days & 0x00FF) as u8,
            0x0C => self.latched.control_byte(),
            _ => 0xFF,
        }
    }

    fn write_register(&mut self, reg: u8, value: u8, now: SystemTime) {
        // Bank elapsed time first so it is not credited to the new value.
        self.sync_wall(now);
        match reg {
            0x08 => {
                self.regs.seconds = value & 0x3F;
                self.subsecond_nanos = 0;
            }
            0x09 => self.regs.minutes = value & 0x3F,
            0x0A => self.regs.hours = value & 0x1F,
            0x0B => self.regs.days = (self.regs.days & 0x0100) | value as u16,
            0x0C => {
                self.regs.days = (self.regs.days & 0x00FF) | (((value & 0x01) as u16) << 8);
                self.regs.halt = value & 0x40 != 0;
                self.regs.carry = value & 0x80 != 0;
            }
            _ => {}
        }
        self.latched = self.regs;
    }

    fn sync_wall(&mut self, now: SystemTime) {
        let elapsed = now.duration_since(self.last_update).unwrap_or_default();
        self.last_update = now;
        if self.regs.halt {
            return;
        }

        let mut seconds = elapsed.as_secs();
        let mut sub = self.subsecond_nanos + elapsed.subsec_nanos();
        if sub >= NANOS_PER_SECOND {
            sub -= NANOS_PER_SECOND;
            seconds += 1;
        }
        self.subsecond_nanos = sub;
        self.advance_seconds(seconds);
    }

    fn advance_seconds(&mut self, mut seconds: u64) {
        while seconds > 0 {
            let until_minute_tick = self.seconds_until_minute_tick();
            if seconds < until_minute_tick {
                self.regs.seconds = ((self.regs.seconds as u64 + seconds) & 0x3F) as u8;
                return;
            }

            seconds -= until_minute_tick;
            self.regs.seconds = 0;
            self.minute_tick();
        }
    }

    // Out-of-range values written by software count up to 63 and wrap to 0
    // without carrying.
    fn seconds_until_minute_tick(&self) -> u64 {
        let sec = self.regs.seconds as u64;
        if sec <= 59 { 60 - sec } else { (64 - sec) + 60 }
    }

    fn minute_tick(&mut self) {
        if self.regs.minutes == 59 {
            self.regs.minutes = 0;
            self.hour_tick();
        } else {
            self.regs.minutes = (self.regs.minutes + 1) & 0x3F;
        }
    }

    fn hour_tick(&mut self) {
        if self.regs.hours == 23 {
            self.regs.hours = 0;
            self.day_tick();
        } else {
            self.regs.hours = (self.regs.hours + 1) & 0x1F;
        }
    }

    fn day_tick(&mut self) {
        if self.regs.days >= 0x01FF {
            self.regs.days = 0;
            self.regs.carry = true;
        } else {
            self.regs.days += 1;
        }
    }
}

#[derive(Debug)]
enum Controller {
    RomOnly,
    Mbc1 {
        rom_bank: u8,
        upper_bits: u8,
        ram_banking: bool,
        ram_enable: bool,
    },
    Mbc3 {
        rom_bank: u8,
        ram_select: u8,
        ram_enable: bool,
        rtc: Option<Mbc3Rtc>,
        latch_pending: bool,
    },
    Mbc5 {
        rom_bank: u16,
        ram_bank: u8,
        ram_enable: bool,
    },
}

impl Controller {
    fn ram_enabled(&self) -> bool {
        match self {
            Controller::RomOnly => false,
            Controller::Mbc1 { ram_enable, .. }
            | Controller::Mbc3 { ram_enable, .. }
            | Controller::Mbc5 { ram_enable, .. } => *ram_enable,
        }
    }
}

/// Cartridge ROM, battery RAM and the bank controller in front of them.
#[derive(Debug)]
pub struct Cartridge {
    rom: Vec<u8>,
    ram: Vec<u8>,
    header: Header,
    kind: ControllerKind,
    controller: Controller,
}

impl Cartridge {
    pub fn new(rom: Vec<u8>) -> Result<Self, CoreError> {
        let header = Header::parse(&rom)?;
        let kind = header.controller().unwrap_or_else(|| {
            warn!(
                "Unsupported cartridge type {:#04X}, falling back to ROM only",
                header.cart_type
            );
            ControllerKind::RomOnly
        });

        let controller = match kind {
            ControllerKind::RomOnly => Controller::RomOnly,
            ControllerKind::Mbc1 => Controller::Mbc1 {
                rom_bank: 1,
                upper_bits: 0,
                ram_banking: false,
                ram_enable: false,
            },
            ControllerKind::Mbc3 => Controller::Mbc3 {
                rom_bank: 1,
                ram_select: 0,
                ram_enable: false,
                rtc: header.has_rtc().then(|| Mbc3Rtc::new(SystemTime::now())),
                latch_pending: false,
            },
            ControllerKind::Mbc5 => Controller::Mbc5 {
                rom_bank: 1,
                ram_bank: 0,
                ram_enable: false,
            },
        };

        info!(
            "Loaded ROM: {} (controller: {:?}, CGB: {}, save id: {})",
            header.title,
            kind,
            if header.cgb { "yes" } else { "no" },
            header.save_identifier()
        );

        Ok(Self {
            rom,
            ram: vec![0; CART_RAM_SIZE],
            header,
            kind,
            controller,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    pub fn save_identifier(&self) -> String {
        self.header.save_identifier()
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// Overwrite RAM with a persisted image. Short images fill a prefix,
    /// long ones are truncated.
    pub fn load_ram(&mut self, data: &[u8]) {
        let n = data.len().min(self.ram.len());
        self.ram[..n].copy_from_slice(&data[..n]);
    }

    pub fn ram_enabled(&self) -> bool {
        self.controller.ram_enabled()
    }

    /// Bank number currently mapped at 0x4000-0x7FFF.
    pub fn rom_bank(&self) -> usize {
        let banks = self.rom_bank_count();
        match &self.controller {
            Controller::RomOnly => 1,
            Controller::Mbc1 {
                rom_bank,
                upper_bits,
                ram_banking,
                ..
            } => {
                let high = if *ram_banking { 0 } else { *upper_bits & 0x03 };
                let mut bank = ((high << 5) | (*rom_bank & 0x1F)) as usize;
                if matches!(bank, 0x00 | 0x20 | 0x40 | 0x60) {
                    bank += 1;
                }
                bank % banks
            }
            Controller::Mbc3 { rom_bank, .. } => {
                let bank = (*rom_bank & 0x7F).max(1) as usize;
                bank % banks
            }
            Controller::Mbc5 { rom_bank, .. } => (*rom_bank as usize) % banks,
        }
    }

    fn rom_bank_count(&self) -> usize {
        (self.rom.len() / ROM_BANK_SIZE).max(1)
    }

    /// Offset into `ram` for an access in 0xA000-0xBFFF, or `None` when the
    /// access does not reach RAM.
    fn ram_offset(&self, addr: u16) -> Option<usize> {
        let offset = addr as usize - 0xA000;
        let bank = match &self.controller {
            Controller::RomOnly => {
                if !self.header.declares_ram() {
                    return None;
                }
                0
            }
            Controller::Mbc1 {
                upper_bits,
                ram_banking,
                ram_enable,
                ..
            } => {
                if !*ram_enable {
                    return None;
                }
                if *ram_banking { *upper_bits & 0x03 } else { 0 }
            }
            Controller::Mbc3 {
                ram_select,
                ram_enable,
                ..
            } => {
                if !*ram_enable || *ram_select > 0x03 {
                    return None;
                }
                *ram_select
            }
            Controller::Mbc5 {
                ram_bank,
                ram_enable,
                ..
            } => {
                if !*ram_enable {
                    return None;
                }
                *ram_bank
            }
        };
        Some((bank as usize * RAM_BANK_SIZE + offset) % CART_RAM_SIZE)
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x3FFF => self.rom.get(addr as usize).copied().unwrap_or(0xFF),
            0x4000..=0x7FFF => {
                let offset = self.rom_bank() * ROM_BANK_SIZE + (addr as usize - 0x4000);
                self.rom.get(offset).copied().unwrap_or(0xFF)
            }
            0xA000..=0xBFFF => {
                if let Controller::Mbc3 {
                    ram_enable: true,
                    ram_select: reg @ 0x08..=0x0C,
                    rtc,
                    ..
                } = &self.controller
                {
                    return rtc.as_ref().map_or(0xFF, |r| r.read_latched(*reg));
                }
                self.ram_offset(addr).map_or(0xFF, |i| self.ram[i])
            }
            _ => 0xFF,
        }
    }

    /// Apply a write in the cartridge's address range. Returns the RAM gate
    /// transition it caused, if any.
    pub fn write(&mut self, addr: u16, val: u8) -> Option<RamGate> {
        if let 0xA000..=0xBFFF = addr {
            self.write_ram(addr, val);
            return None;
        }

        let before = self.controller.ram_enabled();
        match (&mut self.controller, addr) {
            (Controller::RomOnly, _) => {}
            (Controller::Mbc1 { ram_enable, .. }, 0x0000..=0x1FFF)
            | (Controller::Mbc3 { ram_enable, .. }, 0x0000..=0x1FFF)
            | (Controller::Mbc5 { ram_enable, .. }, 0x0000..=0x1FFF) => {
                *ram_enable = val & 0x0F == 0x0A;
            }
            (Controller::Mbc1 { rom_bank, .. }, 0x2000..=0x3FFF) => {
                *rom_bank = val & 0x1F;
            }
            (Controller::Mbc1 { upper_bits, .. }, 0x4000..=0x5FFF) => {
                *upper_bits = val & 0x03;
            }
            (Controller::Mbc1 { ram_banking, .. }, 0x6000..=0x7FFF) => {
                *ram_banking = val & 0x01 != 0;
            }
            (Controller::Mbc3 { rom_bank, .. }, 0x2000..=0x3FFF) => {
                *rom_bank = (val & 0x7F).max(1);
            }
            (Controller::Mbc3 { ram_select, .. }, 0x4000..=0x5FFF) => {
                *ram_select = val & 0x0F;
            }
            (
                Controller::Mbc3 {
                    latch_pending, rtc, ..
                },
                0x6000..=0x7FFF,
            ) => {
                if val == 0x01
                    && *latch_pending
                    && let Some(rtc) = rtc
                {
                    rtc.latch(SystemTime::now());
                }
                *latch_pending = val == 0x00;
            }
            (Controller::Mbc5 { rom_bank, .. }, 0x2000..=0x2FFF) => {
                *rom_bank = (*rom_bank & 0x100) | val as u16;
            }
            (Controller::Mbc5 { rom_bank, .. }, 0x3000..=0x3FFF) => {
                *rom_bank = (*rom_bank & 0xFF) | (((val & 0x01) as u16) << 8);
            }
            (Controller::Mbc5 { ram_bank, .. }, 0x4000..=0x5FFF) => {
                *ram_bank = val & 0x0F;
            }
            _ => {}
        }

        match (before, self.controller.ram_enabled()) {
            (false, true) => Some(RamGate::Enabled),
            (true, false) => Some(RamGate::Disabled),
            _ => None,
        }
    }

    fn write_ram(&mut self, addr: u16, val: u8) {
        if let Controller::Mbc3 {
            ram_enable: true,
            ram_select: reg @ 0x08..=0x0C,
            rtc,
            ..
        } = &mut self.controller
        {
            if let Some(rtc) = rtc {
                rtc.write_register(*reg, val, SystemTime::now());
            }
            return;
        }
        if let Some(i) = self.ram_offset(addr) {
            self.ram[i] = val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn rom_with(cart_type: u8, banks: usize) -> Vec<u8> {
        let mut rom = vec![0u8; banks * ROM_BANK_SIZE];
        for bank in 0..banks {
            rom[bank * ROM_BANK_SIZE] = bank as u8;
        }
        rom[0x0134..0x013A].copy_from_slice(b"CLOCK ");
        rom[0x0147] = cart_type;
        rom[0x0149] = 0x03;
        rom
    }

    #[test]
    fn header_errors_on_short_images() {
        assert_eq!(Header::parse(&[]), Err(CoreError::EmptyRom));
        assert_eq!(
            Header::parse(&[0; 0x100]),
            Err(CoreError::TruncatedHeader { len: 0x100 })
        );
    }

    #[test]
    fn save_identifier_strips_whitespace() {
        let mut rom = rom_with(0x03, 2);
        rom[0x0134..0x0144].copy_from_slice(b"POKEMON RED\0\0\0\0\0");
        rom[0x014D] = 32;
        rom[0x014E..0x0150].copy_from_slice(&37735u16.to_be_bytes());
        let header = Header::parse(&rom).unwrap();
        assert_eq!(header.title, "POKEMON RED");
        assert_eq!(header.save_identifier(), "POKEMONRED3237735");
    }

    #[test]
    fn unknown_controller_falls_back_to_rom_only() {
        let cart = Cartridge::new(rom_with(0xFC, 4)).unwrap();
        assert_eq!(cart.kind(), ControllerKind::RomOnly);
        assert_eq!(cart.read(0x4000), 1);
    }

    #[test]
    fn mbc3_rom_bank_zero_maps_to_one() {
        let mut cart = Cartridge::new(rom_with(0x13, 8)).unwrap();
        cart.write(0x2000, 0x00);
        assert_eq!(cart.read(0x4000), 1);
        cart.write(0x2000, 0x05);
        assert_eq!(cart.read(0x4000), 5);
    }

    #[test]
    fn rtc_ticks_through_invalid_values() {
        let mut rtc = Mbc3Rtc::new(SystemTime::UNIX_EPOCH);

        rtc.regs.seconds = 59;
        rtc.regs.minutes = 60;
        rtc.advance_seconds(1);
        assert_eq!(rtc.regs.seconds, 0);
        assert_eq!(rtc.regs.minutes, 61);

        rtc.regs.seconds = 63;
        rtc.regs.minutes = 5;
        rtc.advance_seconds(1);
        assert_eq!(rtc.regs.seconds, 0);
        assert_eq!(rtc.regs.minutes, 5);

        rtc.regs.seconds = 59;
        rtc.regs.minutes = 59;
        rtc.regs.hours = 24;
        rtc.advance_seconds(1);
        assert_eq!(rtc.regs.minutes, 0);
        assert_eq!(rtc.regs.hours, 25);
    }

    #[test]
    fn rtc_latch_snapshots_wall_clock() {
        let start = SystemTime::UNIX_EPOCH;
        let mut rtc = Mbc3Rtc::new(start);

        rtc.latch(start + Duration::from_secs(3_725));
        assert_eq!(rtc.read_latched(0x08), 5);
        assert_eq!(rtc.read_latched(0x09), 2);
        assert_eq!(rtc.read_latched(0x0A), 1);

        // Running clock moves on, snapshot does not.
        rtc.sync_wall(start + Duration::from_secs(3_735));
        assert_eq!(rtc.read_latched(0x08), 5);
        assert_eq!(rtc.regs.seconds, 15);
    }

    #[test]
    fn rtc_subseconds_accumulate() {
        let start = SystemTime::UNIX_EPOCH;
        let mut rtc = Mbc3Rtc::new(start);
        rtc.sync_wall(start + Duration::from_millis(600));
        assert_eq!(rtc.regs.seconds, 0);
        rtc.sync_wall(start + Duration::from_millis(1_200));
        assert_eq!(rtc.regs.seconds, 1);
    }

    #[test]
    fn rtc_halt_stops_clock() {
        let start = SystemTime::UNIX_EPOCH;
        let mut rtc = Mbc3Rtc::new(start);
        rtc.write_register(0x0C, 0x40, start);
        rtc.latch(start + Duration::from_secs(120));
        assert_eq!(rtc.read_latched(0x08), 0);
        assert_eq!(rtc.read_latched(0x0C), 0x40);

        rtc.write_register(0x0C, 0x00, start + Duration::from_secs(120));
        rtc.latch(start + Duration::from_secs(122));
        assert_eq!(rtc.read_latched(0x08), 2);
    }

    #[test]
    fn rtc_seconds_write_resets_phase() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let mut rtc = Mbc3Rtc::new(start);
        rtc.sync_wall(start + Duration::from_millis(750));

        rtc.write_register(0x09, 0x01, start + Duration::from_millis(760));
        assert_eq!(rtc.subsecond_nanos, 760_000_000);

        rtc.write_register(0x08, 0x02, start + Duration::from_millis(770));
        assert_eq!(rtc.subsecond_nanos, 0);
        assert_eq!(rtc.read_latched(0x08), 2);
        assert_eq!(rtc.read_latched(0x09), 1);
    }

    #[test]
    fn rtc_day_overflow_sets_carry() {
        let mut rtc = Mbc3Rtc::new(SystemTime::UNIX_EPOCH);
        rtc.regs.seconds = 59;
        rtc.regs.minutes = 59;
        rtc.regs.hours = 23;
        rtc.regs.days = 0x01FF;

        rtc.advance_seconds(1);
        assert_eq!(rtc.regs.days, 0);
        assert!(rtc.regs.carry);
        assert_eq!(rtc.regs.control_byte(), 0x80);
    }
}
