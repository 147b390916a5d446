//! TOML-based configuration for the host.
//!
//! ```toml
//! [host]
//! frame_rate = 30
//! log_level = "info"
//!
//! [device]
//! width = 1080
//! height = 2340
//! rotation = 0          # clockwise quarter turns, 0..=3
//!
//! [control]
//! touch_down_code = 0
//! touch_move_code = 2
//! touch_up_code = 1
//! key_tap_ms = 50
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "...")]`, so a missing file, a
//! missing section, or a missing key all fall back to the values above.  The
//! `[control]` defaults are what existing peers expect; change them only to
//! interoperate with a backend that uses different codes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cast_core::{ControlConstants, Rotation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    #[serde(default)]
    pub host: HostSection,
    #[serde(default)]
    pub device: DeviceSection,
    #[serde(default)]
    pub control: ControlSection,
}

/// Broadcast settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostSection {
    /// Capture frame rate in frames per second.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Geometry of the device commands are injected into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceSection {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Clockwise quarter turns.  Values outside `0..=3` are treated as `0`.
    #[serde(default)]
    pub rotation: i64,
}

/// Injection protocol constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlSection {
    #[serde(default = "default_touch_down_code")]
    pub touch_down_code: i32,
    #[serde(default = "default_touch_move_code")]
    pub touch_move_code: i32,
    #[serde(default = "default_touch_up_code")]
    pub touch_up_code: i32,
    #[serde(default = "default_key_tap_ms")]
    pub key_tap_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_frame_rate() -> u32 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_width() -> u32 {
    1080
}
fn default_height() -> u32 {
    2340
}
fn default_touch_down_code() -> i32 {
    ControlConstants::default().touch_down_code
}
fn default_touch_move_code() -> i32 {
    ControlConstants::default().touch_move_code
}
fn default_touch_up_code() -> i32 {
    ControlConstants::default().touch_up_code
}
fn default_key_tap_ms() -> u64 {
    ControlConstants::default().key_tap.as_millis() as u64
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            rotation: 0,
        }
    }
}

impl Default for ControlSection {
    fn default() -> Self {
        Self {
            touch_down_code: default_touch_down_code(),
            touch_move_code: default_touch_move_code(),
            touch_up_code: default_touch_up_code(),
            key_tap_ms: default_key_tap_ms(),
        }
    }
}

impl DeviceSection {
    pub fn rotation(&self) -> Rotation {
        Rotation::from_quarter_turns(self.rotation)
    }
}

impl ControlSection {
    pub fn to_constants(&self) -> ControlConstants {
        ControlConstants {
            touch_down_code: self.touch_down_code,
            touch_move_code: self.touch_move_code,
            touch_up_code: self.touch_up_code,
            key_tap: Duration::from_millis(self.key_tap_ms),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads a `HostConfig` from `path`, returning `HostConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &HostConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
