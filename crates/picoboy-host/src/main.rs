mod audio;
mod config;
mod panel;
mod pattern;
mod runner;
mod snapshot;

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};
use picoboy_core::audio::AudioSink;

use config::HostConfig;
use pattern::TestPattern;

#[derive(Parser)]
#[command(name = "picoboy", about = "Dual-core display and audio pipeline on a simulated panel")]
struct Args {
    /// Path to config file (defaults to the per-user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to emulate
    #[arg(long)]
    frames: Option<u64>,

    /// Write lines inline on the display core instead of through DMA
    #[arg(long)]
    sync: bool,

    /// Simulated SPI clock in Hz (0 = instantaneous transfers)
    #[arg(long)]
    bus_hz: Option<u32>,

    /// Switch the panel to 8-color idle mode at this frame
    #[arg(long)]
    idle_at_frame: Option<u64>,

    /// Volume attenuation, 0 (loudest) to 16 (silent)
    #[arg(long)]
    volume: Option<u8>,

    /// Save the final panel contents to this PNG file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Play audio through the default output device
    #[cfg(feature = "audio")]
    #[arg(long)]
    audio: bool,

    /// Write the effective configuration back to the config file and exit
    #[arg(long)]
    save_config: bool,
}

impl Args {
    fn apply(&self, cfg: &mut HostConfig) {
        if let Some(frames) = self.frames {
            cfg.frames = frames;
        }
        if self.sync {
            cfg.async_transfer = false;
        }
        if let Some(hz) = self.bus_hz {
            cfg.bus_clock_hz = hz;
        }
        if self.idle_at_frame.is_some() {
            cfg.idle_mode_frame = self.idle_at_frame;
        }
        if let Some(volume) = self.volume {
            cfg.volume = volume;
        }
        if self.snapshot.is_some() {
            cfg.snapshot = self.snapshot.clone();
        }
    }

    #[cfg(feature = "audio")]
    fn audio_sink(&self) -> Result<Box<dyn AudioSink>, Box<dyn Error>> {
        if self.audio {
            return Ok(Box::new(audio::CpalSink::open()?));
        }
        Ok(Box::new(audio::NullSink))
    }

    #[cfg(not(feature = "audio"))]
    fn audio_sink(&self) -> Result<Box<dyn AudioSink>, Box<dyn Error>> {
        Ok(Box::new(audio::NullSink))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let mut cfg = config::load_from_file(&config_path);
    args.apply(&mut cfg);

    if args.save_config {
        config::save_to_file(&config_path, &cfg)?;
        info!("Saved config to {}", config_path.display());
        return Ok(());
    }

    info!(
        "Running {} frames ({} transfers, bus {} Hz)",
        cfg.frames,
        if cfg.async_transfer { "DMA" } else { "inline" },
        cfg.bus_clock_hz
    );

    let panel = panel::shared_panel();
    let mut source = TestPattern::new();
    let report = runner::run(&cfg, &mut source, args.audio_sink()?, panel.clone())?;
    report.log();
    {
        let panel = panel::lock(&panel);
        if !panel.powered() {
            warn!("panel was never initialized");
        }
        info!(
            "panel: {} pixels written, {} outside a transfer, idle mode {}",
            panel.pixels_written(),
            panel.stray_pixels(),
            if panel.idle() { "on" } else { "off" }
        );
    }

    if let Some(path) = cfg.snapshot.as_deref() {
        snapshot::write_png(path, &panel::lock(&panel))?;
        info!("Wrote snapshot to {}", path.display());
    }
    Ok(())
}
