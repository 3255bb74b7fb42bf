//! Configuration loading for smart-horses.
//!
//! Configuration is loaded from a TOML file (default: `smart-horses.toml` in
//! the platform config directory). Every field has a default.

use serde::Deserialize;
use smart_horses_client::{EngineConfig, DEFAULT_SERVER_URL};
use smart_horses_types::{Difficulty, Side};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "smart-horses.toml";

/// Root configuration for smart-horses.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClientConfig {
    /// Game server connection.
    #[serde(default)]
    pub server: ServerConfig,
    /// Move and highlight timings.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Game preferences.
    #[serde(default)]
    pub game: GameConfig,
}

/// Game server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the game server.
    #[serde(default = "default_server_url")]
    pub url: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Timing configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimingConfig {
    /// Minimum time a local move stays on screen before reconciliation (default: 1000).
    #[serde(default = "default_min_move_display_ms")]
    pub min_move_display_ms: u64,
    /// Delay before the opponent's move is highlighted (default: 400).
    #[serde(default = "default_highlight_delay_ms")]
    pub highlight_delay_ms: u64,
    /// How long the opponent's move stays highlighted (default: 1000).
    #[serde(default = "default_highlight_hold_ms")]
    pub highlight_hold_ms: u64,
}

/// Game preferences.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Difficulty used when `play` is run without `--difficulty`.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Side the local player controls (default: black).
    #[serde(default = "default_local_side")]
    pub local_side: Side,
}

// Default value functions
fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_move_display_ms() -> u64 {
    1000
}

fn default_highlight_delay_ms() -> u64 {
    400
}

fn default_highlight_hold_ms() -> u64 {
    1000
}

fn default_local_side() -> Side {
    Side::Black
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_move_display_ms: default_min_move_display_ms(),
            highlight_delay_ms: default_highlight_delay_ms(),
            highlight_hold_ms: default_highlight_hold_ms(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            local_side: default_local_side(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load the explicit file if given, else the platform file if it exists,
    /// else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new()
            .with_min_move_display(Duration::from_millis(self.timing.min_move_display_ms))
            .with_highlight_delay(Duration::from_millis(self.timing.highlight_delay_ms))
            .with_highlight_hold(Duration::from_millis(self.timing.highlight_hold_ms))
            .with_local_side(self.game.local_side)
    }
}

/// Platform location of the config file.
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "smart-horses", "smart-horses")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
