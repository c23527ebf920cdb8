//! Outbound seams: status observers and the idle notifier.
//!
//! Implementors should:
//! - Return quickly; callbacks run on the arbiter's loop
//! - Never panic; log and drop on failure

use crate::continuation::ComposedPrompt;
use crate::error::Result;
use crate::types::Status;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Receives arbiter events. Every method defaults to a no-op.
pub trait IdleListener: Send {
    /// Fired on every actual status change, including into and out of Paused.
    fn on_status_changed(&self, _status: Status) {}

    /// Fired on entering Idle (and when a resume restores Idle).
    fn on_idle(&self, _cycle: u64) {}

    /// Fired when work resumes after Idle.
    fn on_active(&self) {}

    /// Fired once per ingestion pass that composed a non-empty prompt.
    fn on_continuation_ready(&self, _prompt: &ComposedPrompt) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdleNotification {
    pub message: String,
    pub cycle: u64,
    pub at: DateTime<Utc>,
}

impl IdleNotification {
    pub fn idle(cycle: u64, timeout_ms: u64) -> Self {
        Self {
            message: format!(
                "Session idle: no activity for {}s",
                (timeout_ms as f64 / 1000.0).round() as u64
            ),
            cycle,
            at: Utc::now(),
        }
    }
}

/// Optional side effect on Idle entry, gated by `enableNotifications`.
pub trait IdleNotifier: Send {
    fn notify(&self, notification: &IdleNotification) -> Result<()>;
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl IdleNotifier for LogNotifier {
    fn notify(&self, notification: &IdleNotification) -> Result<()> {
        tracing::info!(cycle = notification.cycle, "{}", notification.message);
        Ok(())
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::error::IdleError;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Recorded {
        Status(Status),
        Idle(u64),
        Active,
        Continuation(String),
        Notified(u64),
    }

    /// Listener + notifier that records everything into a shared log.
    #[derive(Debug, Clone, Default)]
    pub struct Recorder {
        pub events: Arc<Mutex<Vec<Recorded>>>,
        pub fail_notify: bool,
    }

    impl Recorder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail_notify: true,
                ..Self::default()
            }
        }

        pub fn take(&self) -> Vec<Recorded> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }

        pub fn count(&self, wanted: &Recorded) -> usize {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| *e == wanted)
                .count()
        }

        fn push(&self, event: Recorded) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl IdleListener for Recorder {
        fn on_status_changed(&self, status: Status) {
            self.push(Recorded::Status(status));
        }

        fn on_idle(&self, cycle: u64) {
            self.push(Recorded::Idle(cycle));
        }

        fn on_active(&self) {
            self.push(Recorded::Active);
        }

        fn on_continuation_ready(&self, prompt: &ComposedPrompt) {
            self.push(Recorded::Continuation(prompt.text.clone()));
        }
    }

    impl IdleNotifier for Recorder {
        fn notify(&self, notification: &IdleNotification) -> Result<()> {
            if self.fail_notify {
                return Err(IdleError::NotificationFailed("sink offline".to_string()));
            }
            self.push(Recorded::Notified(notification.cycle));
            Ok(())
        }
    }
}
