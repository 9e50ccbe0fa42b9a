//! Configuration file handling
//!
//! The configuration lives in `~/.config/joykeys/config.toml`. A missing file
//! is replaced by the defaults on first start; missing sections or fields fall
//! back to their defaults, so a partial file is fine.

use crate::input::Thresholds;
use crate::transport::serial::{SerialSettings, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn, Level};

const CONFIG_DIR: &str = ".config/joykeys";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub thresholds: Thresholds,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SerialConfig {
    /// Port to open when none is given on the command line
    pub port: Option<String>,
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Default location below the home directory
    pub fn default_path() -> PathBuf {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub async fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| eyre!("Failed to parse config: {}", e))?;
        if !config.thresholds.is_valid() {
            return Err(eyre!(
                "Threshold low ({}) must be below high ({})",
                config.thresholds.low,
                config.thresholds.high
            ));
        }
        // A zero read timeout turns the read loop into a busy spin
        if config.serial.timeout_ms == 0 {
            return Err(eyre!("serial.timeout_ms must be greater than 0"));
        }
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;
        Ok(())
    }

    /// Writes the defaults to `path` unless a file already exists there
    pub async fn ensure_default(path: &Path) -> Result<()> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?;

        if !exists {
            info!("No config found, writing defaults to {}", path.display());
            AppConfig::default().save(path).await?;
        }
        Ok(())
    }

    /// Loads `path`, creating it with defaults first if needed
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        Self::ensure_default(path).await?;
        Self::load(path).await
    }

    /// Serial settings for `port`, or for the configured port if `None`
    pub fn serial_settings(&self, port: Option<&str>) -> Option<SerialSettings> {
        let port = port.or(self.serial.port.as_deref())?;
        Some(
            SerialSettings::new(port)
                .with_baud_rate(self.serial.baud_rate)
                .with_timeout(Duration::from_millis(self.serial.timeout_ms)),
        )
    }

    /// Configured log level, `None` if the name is not a level
    pub fn log_level(&self) -> Option<Level> {
        self.logging.level.parse().ok()
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}
