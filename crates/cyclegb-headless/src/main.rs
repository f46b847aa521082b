mod config;
mod frame;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cyclegb_core::{
    GameBoy, Hooks, MachineConfig, ModelSelection, cartridge::Header, storage::FileStorage,
};
use log::{debug, error, info};

use crate::config::RunnerConfig;

const DEFAULT_FRAMES: u64 = 60;

#[derive(Parser, Debug)]
#[command(version, about = "Run a Game Boy ROM without a window")]
struct Args {
    /// Path to ROM file
    rom: PathBuf,

    /// Force DMG mode
    #[arg(long, conflicts_with = "cgb")]
    dmg: bool,

    /// Force CGB mode
    #[arg(long, conflicts_with = "dmg")]
    cgb: bool,

    /// Path to boot ROM file
    #[arg(long)]
    bootrom: Option<PathBuf>,

    /// Number of frames to run
    #[arg(long)]
    frames: Option<u64>,

    /// Config file (defaults to the per-user headless.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for battery saves
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Print bytes sent over the serial port
    #[arg(long)]
    serial: bool,

    /// Write the final frame to this PNG file
    #[arg(long)]
    png: Option<PathBuf>,

    /// Enable debug logging of CPU state
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn model_selection(&self, cfg: &RunnerConfig) -> ModelSelection {
        if self.dmg {
            ModelSelection::ForceDmg
        } else if self.cgb {
            ModelSelection::ForceCgb
        } else {
            cfg.emulation_mode.into()
        }
    }

    fn save_dir(&self, cfg: &RunnerConfig) -> PathBuf {
        self.save_dir
            .clone()
            .or_else(|| cfg.save_dir.clone())
            .or_else(|| self.rom.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let cfg = config::load_from_file(&config_path);
    debug!("Config from {}: {cfg:?}", config_path.display());

    run(&args, &cfg)
}

fn print_serial(bytes: &[u8]) {
    let text: String = bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b.is_ascii_whitespace() {
                (b as char).to_string()
            } else {
                format!("\\x{b:02X}")
            }
        })
        .collect();
    print!("{text}");
}

fn run(args: &Args, cfg: &RunnerConfig) -> Result<()> {
    let rom = std::fs::read(&args.rom)
        .with_context(|| format!("reading ROM {}", args.rom.display()))?;
    let header = Header::parse(&rom).context("parsing cartridge header")?;

    let selection = args.model_selection(cfg);
    let model = selection.resolve(header.cgb);
    let boot_rom = match args.bootrom.as_deref().or_else(|| cfg.bootrom_for(model)) {
        Some(path) => Some(
            std::fs::read(path)
                .with_context(|| format!("reading boot ROM {}", path.display()))?,
        ),
        None => None,
    };

    let save_dir = args.save_dir(cfg);
    info!("Battery saves go to {}", save_dir.display());
    let hooks = Hooks {
        storage: Box::new(FileStorage::new(&save_dir)),
        ..Hooks::default()
    };
    let machine = MachineConfig {
        model: selection,
        boot_rom,
    };
    let mut gb = GameBoy::new(rom, machine, hooks).context("starting machine")?;

    let frames = args.frames.or(cfg.frames).unwrap_or(DEFAULT_FRAMES);
    let mut outcome = Ok(());
    for n in 0..frames {
        if let Err(e) = gb.run_frame() {
            error!("Stopped after {n} frames: {e}");
            outcome = Err(e);
            break;
        }
        if args.serial {
            print_serial(&gb.take_serial());
        }
        if n.is_multiple_of(60) {
            debug!("frame {n}: {}", gb.cpu.debug_state());
        }
    }
    info!(
        "Ran {} frames, {} cycles",
        gb.frames(),
        gb.cpu.cycles()
    );

    gb.flush_save();
    if let Some(path) = &args.png {
        frame::write_png(path, gb.framebuffer())?;
        info!("Wrote final frame to {}", path.display());
    }
    outcome.context("CPU fault")
}
