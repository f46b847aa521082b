#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
/// Hardware family being emulated.
///
/// Color-only registers (VRAM/WRAM banking, palette RAM, HDMA) are only
/// mapped when running as [`Model::Cgb`].
pub enum Model {
    #[default]
    Dmg,
    Cgb,
}

impl Model {
    #[inline]
    pub const fn is_cgb(self) -> bool {
        matches!(self, Model::Cgb)
    }

    /// Size of the boot ROM image this model maps at power on.
    ///
    /// The Color boot ROM is 0x900 bytes with a hole at 0x0100-0x01FF where
    /// the cartridge header shows through.
    pub const fn boot_rom_len(self) -> usize {
        match self {
            Model::Dmg => 0x100,
            Model::Cgb => 0x900,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
/// How to pick the [`Model`] for a cartridge.
pub enum ModelSelection {
    /// Color mode when the header advertises Color support (0x143 bit 7).
    #[default]
    Auto,
    ForceDmg,
    ForceCgb,
}

impl ModelSelection {
    pub fn resolve(self, header_cgb: bool) -> Model {
        match self {
            ModelSelection::Auto if header_cgb => Model::Cgb,
            ModelSelection::Auto => Model::Dmg,
            ModelSelection::ForceDmg => Model::Dmg,
            ModelSelection::ForceCgb => Model::Cgb,
        }
    }
}
