//! Global orbit configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

static DEFAULT_DEVICE_ID: &str = "cli";

/// Global configuration at ~/.config/orbit/config.toml
///
/// Everything here is optional; the CLI runs fine pointed at a log file
/// with no config at all.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct GlobalConfig {
    /// Event log replayed when no --log argument is given.
    pub log_path: Option<PathBuf>,

    /// Device id stamped onto events emitted by reconciliation.
    pub device_id: Option<String>,
}

impl GlobalConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("orbit");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, falling back to defaults when the file does
    /// not exist.
    pub fn load() -> Result<GlobalConfig> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Result<GlobalConfig> {
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config at {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config at {}", path.display()))
    }

    pub fn device_id(&self) -> &str {
        self.device_id.as_deref().unwrap_or(DEFAULT_DEVICE_ID)
    }
}
