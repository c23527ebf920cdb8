//! Pause snapshots.
//!
//! Pausing records the two activity flags the arbiter runs on; resuming hands
//! them back. The snapshot is the only thing that survives a pause, so a
//! pause/resume pair with nothing in between lands on the exact prior status.

use crate::types::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PausedSnapshot {
    pub prior_is_idle: bool,
    pub prior_is_task_active: bool,
}

impl PausedSnapshot {
    /// Status implied by the captured flags.
    pub fn restored_status(self) -> Status {
        if self.prior_is_idle {
            Status::Idle
        } else if self.prior_is_task_active {
            Status::Active
        } else {
            Status::Waiting
        }
    }
}

#[derive(Debug, Default)]
pub struct PauseController {
    snapshot: Option<PausedSnapshot>,
}

impl PauseController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Stores a snapshot. Returns false (and keeps the original) if already paused.
    pub fn capture(&mut self, snapshot: PausedSnapshot) -> bool {
        if self.snapshot.is_some() {
            return false;
        }
        self.snapshot = Some(snapshot);
        true
    }

    /// Consumes the snapshot. `None` when not paused.
    pub fn release(&mut self) -> Option<PausedSnapshot> {
        self.snapshot.take()
    }

    /// User activity while paused: the session is no longer idle, so resume
    /// must land on Active instead of replaying idle effects.
    pub fn record_activity(&mut self) -> bool {
        match self.snapshot.as_mut() {
            Some(snapshot) => {
                snapshot.prior_is_idle = false;
                snapshot.prior_is_task_active = true;
                true
            }
            None => false,
        }
    }

    pub fn peek(&self) -> Option<PausedSnapshot> {
        self.snapshot
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restored_status_from_flags() {
        let idle = PausedSnapshot {
            prior_is_idle: true,
            prior_is_task_active: false,
        };
        let active = PausedSnapshot {
            prior_is_idle: false,
            prior_is_task_active: true,
        };
        let waiting = PausedSnapshot {
            prior_is_idle: false,
            prior_is_task_active: false,
        };
        assert_eq!(idle.restored_status(), Status::Idle);
        assert_eq!(active.restored_status(), Status::Active);
        assert_eq!(waiting.restored_status(), Status::Waiting);
    }

    #[test]
    fn second_capture_keeps_first_snapshot() {
        let mut controller = PauseController::new();
        let first = PausedSnapshot {
            prior_is_idle: true,
            prior_is_task_active: false,
        };
        assert!(controller.capture(first));
        assert!(!controller.capture(PausedSnapshot {
            prior_is_idle: false,
            prior_is_task_active: true,
        }));
        assert_eq!(controller.release(), Some(first));
        assert_eq!(controller.release(), None);
    }

    #[test]
    fn activity_while_paused_rewrites_snapshot() {
        let mut controller = PauseController::new();
        assert!(!controller.record_activity());

        controller.capture(PausedSnapshot {
            prior_is_idle: true,
            prior_is_task_active: false,
        });
        assert!(controller.record_activity());
        assert_eq!(
            controller.peek().map(PausedSnapshot::restored_status),
            Some(Status::Active)
        );
    }
}
