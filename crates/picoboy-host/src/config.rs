use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::warn;
use picoboy_core::hardware::DEFAULT_CHANNEL_CAPACITY;
use picoboy_core::palette::{DMG_GREEN, Palette};
use picoboy_core::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Palette rows as `0xRRGGBB` colors, lightest shade first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PaletteConfig {
    pub obj0: [u32; 4],
    pub obj1: [u32; 4],
    pub bg: [u32; 4],
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            obj0: DMG_GREEN,
            obj1: DMG_GREEN,
            bg: DMG_GREEN,
        }
    }
}

impl PaletteConfig {
    pub fn to_palette(&self) -> Palette {
        Palette::from_rgb888([self.obj0, self.obj1, self.bg])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HostConfig {
    pub frames: u64,
    pub async_transfer: bool,
    pub channel_capacity: usize,
    /// Simulated SPI clock; 0 makes transfers instantaneous.
    pub bus_clock_hz: u32,
    pub palette: PaletteConfig,
    pub volume: u8,
    pub idle_mode_frame: Option<u64>,
    pub snapshot: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            async_transfer: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            bus_clock_hz: 30_000_000,
            palette: PaletteConfig::default(),
            volume: 2,
            idle_mode_frame: None,
            snapshot: None,
        }
    }
}

impl HostConfig {
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            channel_capacity: self.channel_capacity.max(1),
            palette: self.palette.to_palette(),
            async_transfer: self.async_transfer,
            ..PipelineConfig::default()
        }
    }
}

const CONFIG_DIR: &str = "picoboy";
const CONFIG_FILE: &str = "host.toml";

/// `$XDG_CONFIG_HOME/picoboy/host.toml`, else `~/.config/picoboy/host.toml`.
pub fn default_config_path() -> PathBuf {
    config_path_in(std::env::var_os("XDG_CONFIG_HOME"), std::env::var_os("HOME"))
}

fn config_path_in(xdg_config_home: Option<OsString>, home: Option<OsString>) -> PathBuf {
    let base = xdg_config_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|h| PathBuf::from(h).join(".config")));
    match base {
        Some(dir) => dir.join(CONFIG_DIR).join(CONFIG_FILE),
        None => PathBuf::from(CONFIG_FILE),
    }
}

pub fn parse(text: &str) -> Result<HostConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

pub fn read(path: &Path) -> Result<HostConfig, ConfigError> {
    parse(&std::fs::read_to_string(path)?)
}

/// Loads `path`, falling back to defaults when the file is missing or bad.
pub fn load_from_file(path: &Path) -> HostConfig {
    match read(path) {
        Ok(cfg) => cfg,
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            HostConfig::default()
        }
        Err(e) => {
            warn!("Failed to load config {}: {e}; using defaults", path.display());
            HostConfig::default()
        }
    }
}

pub fn save_to_file(path: &Path, cfg: &HostConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(cfg)?;
    std::fs::write(path, text)?;
    Ok(())
}
