// Configuration management for segue
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::Result;
use dirs::{cache_dir, config_dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub playback: PlaybackConfig,
    pub audio: AudioSection,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

/// How the engine learns that a track finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceMode {
    /// Device pushes an end-of-track notification
    #[default]
    Event,
    /// Session loop watches for the `Ended` state every tick
    Poll,
}

/// What to do when the next playlist entry is missing on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTrackPolicy {
    #[default]
    Skip,
    Halt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub tick_interval_ms: u64,
    pub advance_mode: AdvanceMode,
    pub missing_track: MissingTrackPolicy,
    pub length_wait_attempts: u32,
    pub length_wait_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSection {
    pub volume: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub filter: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            advance_mode: AdvanceMode::Event,
            missing_track: MissingTrackPolicy::Skip,
            length_wait_attempts: 50,
            length_wait_interval_ms: 100,
        }
    }
}

impl Default for AudioSection {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("segue")
                .join("logs"),
            filter: "info,segue=debug".to_string(),
        }
    }
}

impl PlaybackConfig {
    pub fn tick_interval(&self) -> Duration {
        // a zero interval would spin the loop
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn length_wait_interval(&self) -> Duration {
        Duration::from_millis(self.length_wait_interval_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Read `path`, or write defaults there when it does not exist yet
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("segue");

        Ok(config_dir.join("config.toml"))
    }
}
