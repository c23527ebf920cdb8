//! Types shared between the state machine, the service and its clients.

use crate::config::IdleConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Canonical session status. Exactly one value at a time, owned by the arbiter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Work in progress.
    #[default]
    Active,
    /// Work finished, countdown running.
    Waiting,
    /// Countdown elapsed with no activity.
    Idle,
    /// Automatic effects suspended by the user.
    Paused,
}

impl Status {
    /// Short text for a status-bar indicator.
    pub fn label(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Waiting => "waiting",
            Status::Idle => "idle",
            Status::Paused => "paused",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Point-in-time view of the arbiter for diagnostics and status queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdleSnapshot {
    pub status: Status,
    /// Status that `resume` would restore, when paused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_from: Option<Status>,
    pub timer_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_remaining_ms: Option<u64>,
    pub idle_cycle: u64,
    pub config: IdleConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,
}
