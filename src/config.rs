use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::app_dirs::AppDirs;

pub const MAX_MINUTES_LIMIT: u32 = 600;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Sessions stop on their own after this many minutes
    pub max_minutes: u32,
    /// How long the completion cue stays on screen
    pub alarm_flash_ms: u64,
    /// Ring the terminal bell on completion
    pub bell: bool,
    /// Length of one timer second; only shortened for testing
    pub tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_minutes: 60,
            alarm_flash_ms: 2500,
            bell: true,
            tick_ms: 1000,
        }
    }
}

/// Command-line values that take precedence over the stored config
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_minutes: Option<u32>,
    pub bell: Option<bool>,
}

impl Config {
    pub fn max_seconds(&self) -> u32 {
        self.max_minutes * 60
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.alarm_flash_ms)
    }

    /// Pull out-of-range values back into something usable
    pub fn normalized(mut self) -> Self {
        self.max_minutes = self.max_minutes.clamp(1, MAX_MINUTES_LIMIT);
        self.tick_ms = self.tick_ms.max(1);
        self
    }

    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(minutes) = overrides.max_minutes {
            self.max_minutes = minutes;
        }
        if let Some(bell) = overrides.bell {
            self.bell = bell;
        }
        self.normalized()
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("stint_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg.normalized(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
