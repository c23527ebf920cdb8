//! Idle detection configuration.
//!
//! Handles:
//! - Defaults and timeout clamping
//! - Partial updates pushed by the host settings panel
//! - Loading `~/.idle-watch/config.toml`

use crate::error::{IdleError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 5_000;
pub const MIN_IDLE_TIMEOUT_MS: u64 = 1_000;
pub const MAX_IDLE_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_CONTINUATION_FOLDER: &str = ".continue";

const CONFIG_DIR_NAME: &str = ".idle-watch";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Which detection sources feed the arbiter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// Both sources, first to report wins.
    #[default]
    Auto,
    /// UI affordance visibility only.
    #[serde(alias = "button")]
    Presence,
    /// Task lifecycle events only.
    #[serde(alias = "events")]
    Event,
    /// Both sources, explicitly selected.
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdleConfig {
    pub enabled: bool,
    pub detection_method: DetectionMethod,
    pub idle_timeout_ms: u64,
    pub enable_notifications: bool,
    /// Absolute, or relative to the workspace root.
    pub continuation_folder: PathBuf,
    pub show_status_indicator: bool,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detection_method: DetectionMethod::default(),
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            enable_notifications: true,
            continuation_folder: PathBuf::from(DEFAULT_CONTINUATION_FOLDER),
            show_status_indicator: true,
        }
    }
}

/// Partial configuration; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigUpdate {
    pub enabled: Option<bool>,
    pub detection_method: Option<DetectionMethod>,
    pub idle_timeout_ms: Option<u64>,
    pub enable_notifications: Option<bool>,
    pub continuation_folder: Option<PathBuf>,
    pub show_status_indicator: Option<bool>,
}

impl IdleConfig {
    /// Returns a copy with the timeout clamped into the accepted range.
    pub fn normalized(mut self) -> Self {
        self.idle_timeout_ms = clamp_timeout(self.idle_timeout_ms);
        self
    }

    /// Applies a partial update and re-clamps.
    pub fn merge(&self, update: &ConfigUpdate) -> Self {
        let mut next = self.clone();
        if let Some(enabled) = update.enabled {
            next.enabled = enabled;
        }
        if let Some(method) = update.detection_method {
            next.detection_method = method;
        }
        if let Some(timeout) = update.idle_timeout_ms {
            next.idle_timeout_ms = timeout;
        }
        if let Some(notify) = update.enable_notifications {
            next.enable_notifications = notify;
        }
        if let Some(folder) = &update.continuation_folder {
            next.continuation_folder = folder.clone();
        }
        if let Some(show) = update.show_status_indicator {
            next.show_status_indicator = show;
        }
        next.normalized()
    }

    pub fn idle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.idle_timeout_ms)
    }
}

fn clamp_timeout(requested: u64) -> u64 {
    let clamped = requested.clamp(MIN_IDLE_TIMEOUT_MS, MAX_IDLE_TIMEOUT_MS);
    if clamped != requested {
        tracing::warn!(
            requested_ms = requested,
            clamped_ms = clamped,
            "Idle timeout out of range; clamped"
        );
    }
    clamped
}

/// Returns the path to the default configuration file (~/.idle-watch/config.toml).
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(IdleError::HomeDirNotFound)?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Loads configuration from TOML, returning defaults if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<IdleConfig> {
    if !path.exists() {
        return Ok(IdleConfig::default());
    }

    let content = fs_err::read_to_string(path).map_err(|source| IdleError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: IdleConfig =
        toml::from_str(&content).map_err(|err| IdleError::ConfigMalformed {
            path: path.to_path_buf(),
            details: err.to_string(),
        })?;
    Ok(config.normalized())
}
