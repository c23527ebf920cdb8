//! # idle-core
//!
//! Detects when a long-running assistant session has stopped working and, once
//! it has stayed quiet for the configured timeout, feeds queued instruction
//! files back to the session driver as one continuation prompt.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. [`IdleService`] runs the arbiter on one
//!   worker thread; everything else is plain method calls.
//! - **Single owner**: One [`DetectionArbiter`] per session, constructed and
//!   handed around explicitly. No globals.
//! - **Explicit time**: State-machine entry points take `Instant` so tests drive
//!   the clock.
//! - **Graceful degradation**: Ingestion and notification failures are logged;
//!   the worst outcome is no automatic continuation for that cycle.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use idle_core::{DetectionArbiter, IdleConfig, IdleService};
//!
//! let arbiter = DetectionArbiter::new(IdleConfig::default()).with_workspace_root("/work");
//! let service = IdleService::spawn(arbiter)?;
//! let handle = service.handle();
//! handle.notify_affordance_visible()?;
//! ```

pub mod arbiter;
pub mod config;
pub mod continuation;
pub mod detection;
pub mod error;
pub mod listener;
pub mod pause;
pub mod service;
pub mod timer;
pub mod types;

pub use arbiter::DetectionArbiter;
pub use config::{
    default_config_path, load_config, ConfigUpdate, DetectionMethod, IdleConfig,
    MAX_IDLE_TIMEOUT_MS, MIN_IDLE_TIMEOUT_MS,
};
pub use continuation::{ComposedPrompt, ContinuationIngester, ContinuationResource, IngestOutcome};
pub use detection::{
    DetectionSignal, DetectionSource, LifecycleEvent, PresenceChange, SignalKind,
};
pub use error::{IdleError, Result};
pub use listener::{IdleListener, IdleNotification, IdleNotifier, LogNotifier};
pub use pause::{PauseController, PausedSnapshot};
pub use service::{IdleHandle, IdleService};
pub use timer::{TimerScheduler, TimerToken};
pub use types::{IdleSnapshot, Status};
