//! Line protocol between the host and `idle-watch`.
//!
//! One JSON object per line in each direction. Inbound objects are tagged by
//! `cmd`, outbound by `event`.

use chrono::{DateTime, Utc};
use idle_core::{ConfigUpdate, IdleSnapshot, Status};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    AffordanceVisible,
    AffordanceHidden,
    TaskStarted,
    #[serde(alias = "message_sent")]
    TaskCompleted,
    UserActivity,
    Pause,
    Resume,
    UpdateConfig { config: ConfigUpdate },
    SetWorkspace { path: PathBuf },
    Status,
    Shutdown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    StatusChanged {
        status: Status,
    },
    Idle {
        cycle: u64,
    },
    Active,
    ContinuationReady {
        prompt: String,
        sources: Vec<String>,
        cycle: u64,
    },
    Notification {
        message: String,
        cycle: u64,
        at: DateTime<Utc>,
    },
    Snapshot {
        snapshot: IdleSnapshot,
    },
    Error {
        message: String,
    },
}

/// Parses one inbound line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    if line.len() > MAX_LINE_BYTES {
        return Err(format!("command exceeds {} bytes", MAX_LINE_BYTES));
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|err| format!("invalid command: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use idle_core::DetectionMethod;

    #[test]
    fn parses_unit_commands() {
        assert_eq!(
            parse_command(r#"{"cmd":"affordance_visible"}"#),
            Ok(Some(Command::AffordanceVisible))
        );
        assert_eq!(
            parse_command(r#"{"cmd":"message_sent"}"#),
            Ok(Some(Command::TaskCompleted))
        );
    }

    #[test]
    fn parses_config_update() {
        let parsed = parse_command(
            r#"{"cmd":"update_config","config":{"idleTimeoutMs":20000,"detectionMethod":"events"}}"#,
        )
        .expect("parse")
        .expect("command");
        match parsed {
            Command::UpdateConfig { config } => {
                assert_eq!(config.idle_timeout_ms, Some(20_000));
                assert_eq!(config.detection_method, Some(DetectionMethod::Event));
                assert_eq!(config.enabled, None);
            }
            other => panic!("expected update_config, got {:?}", other),
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_command("   \n"), Ok(None));
    }

    #[test]
    fn unknown_command_is_an_error() {
        let err = parse_command(r#"{"cmd":"dance"}"#).expect_err("unknown");
        assert!(err.starts_with("invalid command"));
    }

    #[test]
    fn oversized_line_is_rejected() {
        let line = "x".repeat(MAX_LINE_BYTES + 1);
        assert!(parse_command(&line).is_err());
    }

    #[test]
    fn events_are_tagged() {
        let json = serde_json::to_value(Event::StatusChanged {
            status: Status::Idle,
        })
        .expect("serialize");
        assert_eq!(json["event"], "status_changed");
        assert_eq!(json["status"], "idle");

        let json = serde_json::to_value(Event::Active).expect("serialize");
        assert_eq!(json, serde_json::json!({"event": "active"}));
    }
}
