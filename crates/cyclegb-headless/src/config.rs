use std::path::{Path, PathBuf};

use cyclegb_core::{Model, ModelSelection};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmulationMode {
    #[default]
    Auto,
    ForceDmg,
    ForceCgb,
}

impl From<EmulationMode> for ModelSelection {
    fn from(mode: EmulationMode) -> Self {
        match mode {
            EmulationMode::Auto => ModelSelection::Auto,
            EmulationMode::ForceDmg => ModelSelection::ForceDmg,
            EmulationMode::ForceCgb => ModelSelection::ForceCgb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunnerConfig {
    pub dmg_bootrom_path: Option<PathBuf>,
    pub cgb_bootrom_path: Option<PathBuf>,
    /// Where `<save id>.sav` files go. Defaults to the ROM's directory.
    pub save_dir: Option<PathBuf>,
    pub emulation_mode: EmulationMode,
    /// Frames to run when `--frames` is not given.
    pub frames: Option<u64>,
}

impl RunnerConfig {
    pub fn bootrom_for(&self, model: Model) -> Option<&Path> {
        match model {
            Model::Dmg => self.dmg_bootrom_path.as_deref(),
            Model::Cgb => self.cgb_bootrom_path.as_deref(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("cyclegb").join("headless.toml");
        }
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("cyclegb").join("headless.toml");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("cyclegb")
            .join("headless.toml");
    }

    PathBuf::from("headless.toml")
}

/// A missing file yields the defaults silently; a malformed one yields the
/// defaults with a warning.
pub fn load_from_file(path: &Path) -> RunnerConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return RunnerConfig::default(),
    };

    match toml::from_str::<RunnerConfig>(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(
                "Failed to parse config {}: {e}; using defaults",
                path.display()
            );
            RunnerConfig::default()
        }
    }
}
