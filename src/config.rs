//! Configuration persistence for the scheduler front end.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::DEFAULT_NEW_CARDS_PER_DAY;
use crate::stats::DEFAULT_FORECAST_DAYS;

/// Settings that persist between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cap on never-reviewed items pulled into one session.
    #[serde(default = "default_new_cards_per_day")]
    pub new_cards_per_day: usize,

    /// Horizon of the due forecast, in days.
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,

    /// Overrides the default deck directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decks_dir: Option<PathBuf>,
}

fn default_new_cards_per_day() -> usize {
    DEFAULT_NEW_CARDS_PER_DAY
}

fn default_forecast_days() -> u32 {
    DEFAULT_FORECAST_DAYS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            new_cards_per_day: default_new_cards_per_day(),
            forecast_days: default_forecast_days(),
            decks_dir: None,
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("srl")
            .join("config.toml")
    }

    /// Load config from the default location, returning defaults if it doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}
