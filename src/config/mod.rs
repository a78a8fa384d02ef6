//! Configuration module
//!
//! Handles loading cursor-mapper configuration and virtual desktop layouts.
//! Configuration is only ever read; nothing is written back.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::screen::Rect;

/// Default interval between periodic topology checks
pub const DEFAULT_REFRESH_INTERVAL_MS: u32 = 30_000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Topology refresh settings
    #[serde(default)]
    pub topology: TopologyConfig,
}

/// General configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
}

/// Topology refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Periodic re-enumeration interval (ms)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u32,
    /// Re-enumerate on display and setting change notifications
    #[serde(default = "default_true")]
    pub refresh_on_display_change: bool,
}

fn default_refresh_interval() -> u32 {
    DEFAULT_REFRESH_INTERVAL_MS
}

fn default_true() -> bool {
    true
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval(),
            refresh_on_display_change: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location
    pub fn load_default() -> ConfigResult<Self> {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("cursor-mapper/config.toml")),
            Some(PathBuf::from("./cursor-mapper.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                tracing::debug!("Loading configuration from {}", path.display());
                return Self::load(path);
            }
        }

        // Return default config if no file found
        Ok(Self::default())
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.topology.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "topology.refresh_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config() -> ConfigResult<String> {
    let config = Config {
        general: GeneralConfig { verbose: true },
        topology: TopologyConfig {
            refresh_interval_ms: 10_000,
            refresh_on_display_change: true,
        },
    };

    Ok(toml::to_string_pretty(&config)?)
}

/// A display arrangement used by the simulator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesktopLayout {
    #[serde(rename = "display", default)]
    pub displays: Vec<DisplayConfig>,
}

/// One display in a [`DesktopLayout`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub name: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub primary: bool,
}

impl DisplayConfig {
    pub fn rect(&self) -> Rect {
        Rect::from_origin(self.left, self.top, self.width, self.height)
    }
}

impl DesktopLayout {
    /// Load a layout file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let layout: DesktopLayout = toml::from_str(&contents)?;
        layout.validate()?;
        Ok(layout)
    }

    fn validate(&self) -> ConfigResult<()> {
        for d in &self.displays {
            if d.width <= 0 || d.height <= 0 {
                return Err(ConfigError::Invalid(format!(
                    "display '{}' has non-positive size {}x{}",
                    d.name, d.width, d.height
                )));
            }
            if d.left.checked_add(d.width).is_none() || d.top.checked_add(d.height).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "display '{}' extends past the coordinate range",
                    d.name
                )));
            }
        }
        Ok(())
    }
}
