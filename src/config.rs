//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/barblocks/config.json`.
//! Every section is optional and unknown keys are ignored, so a minimal `{}`
//! file is valid.
//!
//! # Example
//!
//! ```json
//! {
//!   "popup": { "width": 320, "bar_height": 20 },
//!   "mpc": { "host": "media.local", "port": 6600 },
//!   "music": { "tick_secs": 1, "volume_step": 5 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Size and placement of popup windows.
    #[serde(default)]
    pub popup: PopupConfig,

    /// How to reach the music player daemon.
    #[serde(default)]
    pub mpc: MpcConfig,

    /// Music popup behaviour.
    #[serde(default)]
    pub music: MusicConfig,
}

/// Popup window size and placement, in pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    pub width: i32,
    pub height: i32,
    /// Padding between the window edge and its content.
    pub border_width: i32,
    /// Height of the status bar, used when no bar height is passed on the
    /// command line.
    pub bar_height: i32,
    /// Gap left between the bar and the popup.
    pub bar_gap: i32,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 100,
            border_width: 10,
            bar_height: 15,
            bar_gap: 5,
        }
    }
}

/// `mpc` invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpcConfig {
    /// Program to run, looked up in `$PATH`.
    pub program: String,
    /// Passed as `--host`; `mpc` falls back to `$MPD_HOST` when unset.
    pub host: Option<String>,
    /// Passed as `--port`.
    pub port: Option<u16>,
}

impl Default for MpcConfig {
    fn default() -> Self {
        Self {
            program: "mpc".into(),
            host: None,
            port: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    /// Interval of the song clock tick (seconds).
    pub tick_secs: u32,
    /// Volume change per scroll step (percent).
    pub volume_step: i32,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            tick_secs: 1,
            volume_step: 5,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/barblocks`).
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("barblocks")
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
