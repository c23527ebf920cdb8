//! Error types for idle-core operations.
//!
//! Nothing here is fatal to a session. The arbiter is the catch boundary:
//! ingestion and notification errors are logged there and never reach the
//! caller that delivered the triggering signal.

use std::path::PathBuf;

/// All errors that can occur in idle-core operations.
#[derive(Debug, thiserror::Error)]
pub enum IdleError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file unreadable: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Home directory not found")]
    HomeDirNotFound,

    // ─────────────────────────────────────────────────────────────────────
    // Ingestion Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("No workspace root to resolve continuation folder {0}")]
    NoWorkspaceRoot(PathBuf),

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Delivery Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Notification delivery failed: {0}")]
    NotificationFailed(String),

    #[error("Idle service has stopped")]
    ServiceStopped,
}

/// Convenience type alias for Results using IdleError.
pub type Result<T> = std::result::Result<T, IdleError>;
