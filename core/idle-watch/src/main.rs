//! idle-watch: line-protocol driver for idle detection.
//!
//! The host (editor extension, terminal wrapper, session runner) writes JSON
//! commands to stdin as the assistant session changes state; idle-watch
//! answers with JSON events on stdout, including `continuation_ready` once the
//! session has been idle for the configured timeout and instructions are
//! queued in the continuation folder.
//!
//! ## Commands
//!
//! - `affordance_visible` / `affordance_hidden`: presence signals
//! - `task_started` / `task_completed` (alias `message_sent`): lifecycle signals
//! - `user_activity`, `pause`, `resume`, `status`, `shutdown`
//! - `update_config {config}`, `set_workspace {path}`

mod driver;
mod logging;
mod protocol;
mod sink;

use clap::Parser;
use idle_core::{
    default_config_path, load_config, DetectionArbiter, DetectionMethod, IdleConfig, IdleService,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "idle-watch")]
#[command(about = "Idle detection and continuation driver for assistant sessions")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.idle-watch/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Workspace root used to resolve a relative continuation folder (default: cwd)
    #[arg(long, value_name = "PATH")]
    workspace: Option<PathBuf>,

    /// Override idle timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Override detection method (auto, presence, event, hybrid)
    #[arg(long, value_name = "METHOD", value_parser = parse_method)]
    method: Option<DetectionMethod>,
}

fn parse_method(value: &str) -> Result<DetectionMethod, String> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| format!("unknown detection method: {}", value))
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    let config = resolve_config(&cli);
    let workspace = cli
        .workspace
        .clone()
        .or_else(|| std::env::current_dir().ok());

    let sink = sink::EventSink::stdout(config.show_status_indicator);
    let mut arbiter = DetectionArbiter::new(config);
    if let Some(root) = workspace {
        arbiter = arbiter.with_workspace_root(root);
    }
    arbiter.add_listener(Box::new(sink.clone()));
    arbiter.set_notifier(Box::new(sink.clone()));

    let service = match IdleService::spawn(arbiter) {
        Ok(service) => service,
        Err(err) => {
            tracing::error!(error = %err, "Failed to start idle service");
            std::process::exit(1);
        }
    };

    let stdin = std::io::stdin();
    match driver::run(stdin.lock(), &service.handle(), &sink) {
        Ok(exit) => tracing::info!(exit = ?exit, "Command loop finished"),
        Err(err) => tracing::error!(error = %err, "Command loop aborted"),
    }

    service.shutdown();
}

/// Config problems never stop startup: log and fall back to defaults.
fn resolve_config(cli: &Cli) -> IdleConfig {
    let path = match cli.config.clone().map(Ok).unwrap_or_else(default_config_path) {
        Ok(path) => Some(path),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to resolve config path; using defaults");
            None
        }
    };

    let mut config = match path {
        Some(path) => match load_config(&path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Config loaded");
                config
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load config; using defaults");
                IdleConfig::default()
            }
        },
        None => IdleConfig::default(),
    };

    if let Some(timeout) = cli.timeout_ms {
        config.idle_timeout_ms = timeout;
    }
    if let Some(method) = cli.method {
        config.detection_method = method;
    }
    config.normalized()
}
