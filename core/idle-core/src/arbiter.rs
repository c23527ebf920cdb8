//! The idle-detection state machine.
//!
//! # Status model
//!
//! ```text
//!            finished                 countdown elapsed
//!   Active ───────────▶ Waiting ──────────────────────▶ Idle
//!     ▲                   │  ▲                           │
//!     │      resumed      │  │ finished (restart)        │
//!     └───────────────────┘  └───────────────────────────┘
//!     ▲                         resumed
//!     └──────────────────────────────────────────────────┘
//!
//!   any of the above ── pause ──▶ Paused ── resume ──▶ restored status
//! ```
//!
//! Two flags drive everything: `is_idle` and `is_task_active`. Status is
//! derived from them except while paused, where the pause snapshot holds
//! them instead.
//!
//! # Arbitration
//!
//! Both detection sources may be live at once. A `finished` restarts the
//! countdown, except when it only confirms a countdown (or idle period) the
//! other source already started: that duplicate is absorbed so the first
//! report sets the deadline. The first `resumed` cancels; later ones find the
//! arbiter already Active and do nothing.
//!
//! # Time
//!
//! Every entry point that can start a countdown takes `now`. The owner polls
//! [`DetectionArbiter::poll_timer`] at or after [`DetectionArbiter::next_deadline`].

use crate::config::{ConfigUpdate, IdleConfig};
use crate::continuation::{ContinuationIngester, IngestOutcome};
use crate::detection::{
    source_enabled, DetectionSignal, DetectionSource, LifecycleEvent, PresenceChange, SignalKind,
};
use crate::listener::{IdleListener, IdleNotification, IdleNotifier};
use crate::pause::{PauseController, PausedSnapshot};
use crate::timer::TimerScheduler;
use crate::types::{IdleSnapshot, Status};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct DetectionArbiter {
    config: IdleConfig,
    workspace_root: Option<PathBuf>,
    status: Status,
    is_idle: bool,
    is_task_active: bool,
    /// Source whose `finished` opened the current Waiting/Idle period.
    finished_by: Option<DetectionSource>,
    idle_cycle: u64,
    timer: TimerScheduler,
    pause: PauseController,
    ingester: ContinuationIngester,
    listeners: Vec<Box<dyn IdleListener>>,
    notifier: Option<Box<dyn IdleNotifier>>,
}

impl DetectionArbiter {
    pub fn new(config: IdleConfig) -> Self {
        Self {
            config: config.normalized(),
            workspace_root: None,
            status: Status::Active,
            is_idle: false,
            is_task_active: true,
            finished_by: None,
            idle_cycle: 0,
            timer: TimerScheduler::new(),
            pause: PauseController::new(),
            ingester: ContinuationIngester::new(),
            listeners: Vec::new(),
            notifier: None,
        }
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub fn add_listener(&mut self, listener: Box<dyn IdleListener>) {
        self.listeners.push(listener);
    }

    pub fn set_notifier(&mut self, notifier: Box<dyn IdleNotifier>) {
        self.notifier = Some(notifier);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn config(&self) -> &IdleConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn idle_cycle(&self) -> u64 {
        self.idle_cycle
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn snapshot(&self, now: Instant) -> IdleSnapshot {
        IdleSnapshot {
            status: self.status,
            paused_from: self.pause.peek().map(PausedSnapshot::restored_status),
            timer_pending: self.timer.is_pending(),
            timer_remaining_ms: self
                .timer
                .remaining(now)
                .map(|remaining| remaining.as_millis() as u64),
            idle_cycle: self.idle_cycle,
            config: self.config.clone(),
            workspace_root: self.workspace_root.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inbound: detection adapters
    // ─────────────────────────────────────────────────────────────────────

    pub fn notify_affordance_visible(&mut self, now: Instant) -> bool {
        self.handle_signal(PresenceChange::Visible.signal(), now)
    }

    pub fn notify_affordance_hidden(&mut self, now: Instant) -> bool {
        self.handle_signal(PresenceChange::Hidden.signal(), now)
    }

    pub fn notify_task_started(&mut self, now: Instant) -> bool {
        self.handle_signal(LifecycleEvent::TaskStarted.signal(), now)
    }

    pub fn notify_task_completed_or_message_sent(&mut self, now: Instant) -> bool {
        self.handle_signal(LifecycleEvent::TaskCompleted.signal(), now)
    }

    /// Applies a detection signal. Returns whether it changed anything.
    pub fn handle_signal(&mut self, signal: DetectionSignal, now: Instant) -> bool {
        if !source_enabled(&self.config, signal.source) {
            tracing::debug!(
                source = ?signal.source,
                kind = ?signal.kind,
                method = ?self.config.detection_method,
                enabled = self.config.enabled,
                "Signal from inactive source dropped"
            );
            return false;
        }
        if self.pause.is_paused() {
            tracing::debug!(source = ?signal.source, kind = ?signal.kind, "Signal ignored while paused");
            return false;
        }

        match signal.kind {
            SignalKind::Finished => self.work_finished(signal.source, now),
            SignalKind::Resumed => self.work_resumed(signal.source),
        }
    }

    fn work_finished(&mut self, source: DetectionSource, now: Instant) -> bool {
        let confirming_other_source = !self.is_task_active
            && self
                .finished_by
                .map(|first| first != source)
                .unwrap_or(false);
        if confirming_other_source {
            tracing::debug!(
                source = ?source,
                first = ?self.finished_by,
                status = %self.status,
                "Finished already reported by other source"
            );
            return false;
        }

        let token = self.timer.schedule(now, self.config.idle_timeout());
        self.is_task_active = false;
        self.is_idle = false;
        self.finished_by = Some(source);
        tracing::debug!(
            source = ?source,
            token = token.id(),
            timeout_ms = self.config.idle_timeout_ms,
            "Countdown started"
        );
        self.set_status(Status::Waiting);
        true
    }

    fn work_resumed(&mut self, source: DetectionSource) -> bool {
        if self.status == Status::Active && self.is_task_active {
            tracing::debug!(source = ?source, "Already active");
            return false;
        }
        tracing::debug!(source = ?source, "Work resumed");
        self.become_active();
        true
    }

    /// Unconditional reset from direct user input, independent of adapters.
    pub fn notify_user_activity(&mut self) {
        if self.pause.record_activity() {
            tracing::debug!("User activity while paused; resume will restore active");
            return;
        }
        self.become_active();
    }

    fn become_active(&mut self) {
        self.timer.cancel();
        let was_idle = self.is_idle;
        self.is_idle = false;
        self.is_task_active = true;
        self.finished_by = None;
        self.set_status(Status::Active);
        if was_idle {
            for listener in &self.listeners {
                listener.on_active();
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Timer
    // ─────────────────────────────────────────────────────────────────────

    /// Fires the countdown if due. Returns whether the arbiter entered Idle.
    pub fn poll_timer(&mut self, now: Instant) -> bool {
        let Some(token) = self.timer.fire_due(now) else {
            return false;
        };

        // Re-check live flags: a resume may have raced the deadline.
        if self.pause.is_paused() || self.is_task_active || self.status != Status::Waiting {
            tracing::warn!(
                token = token.id(),
                status = %self.status,
                task_active = self.is_task_active,
                paused = self.pause.is_paused(),
                "Countdown fired while not waiting; dropped"
            );
            return false;
        }

        self.is_idle = true;
        self.set_status(Status::Idle);
        self.run_idle_effects();
        true
    }

    /// Idle notification, listener fan-out and ingestion. Nothing here fails
    /// outward; errors are logged.
    fn run_idle_effects(&mut self) {
        self.idle_cycle += 1;
        let cycle = self.idle_cycle;

        for listener in &self.listeners {
            listener.on_idle(cycle);
        }

        if self.config.enable_notifications {
            if let Some(notifier) = &self.notifier {
                let notification = IdleNotification::idle(cycle, self.config.idle_timeout_ms);
                if let Err(err) = notifier.notify(&notification) {
                    tracing::warn!(error = %err, cycle, "Idle notification failed");
                }
            }
        }

        let outcome = self.ingester.ingest(
            &self.config.continuation_folder,
            self.workspace_root.as_deref(),
            cycle,
        );
        match outcome {
            Ok(IngestOutcome::Composed(prompt)) => {
                for listener in &self.listeners {
                    listener.on_continuation_ready(&prompt);
                }
            }
            Ok(IngestOutcome::Bootstrapped { folder }) => {
                tracing::info!(folder = %folder.display(), cycle, "Continuation folder bootstrapped; nothing to send");
            }
            Ok(IngestOutcome::Empty) => {}
            Err(err) => {
                tracing::warn!(error = %err, cycle, "Continuation ingestion failed");
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Pause / resume
    // ─────────────────────────────────────────────────────────────────────

    /// Suspends automatic effects. No-op when already paused or disabled.
    pub fn pause(&mut self) -> bool {
        if !self.config.enabled {
            tracing::debug!("Pause ignored while detection is disabled");
            return false;
        }
        let snapshot = PausedSnapshot {
            prior_is_idle: self.is_idle,
            prior_is_task_active: self.is_task_active,
        };
        if !self.pause.capture(snapshot) {
            return false;
        }
        self.timer.cancel();
        tracing::info!(prior = %snapshot.restored_status(), "Paused");
        self.set_status(Status::Paused);
        true
    }

    /// Restores the pre-pause status. A restored Waiting restarts the full
    /// countdown; a restored Idle replays the idle effects. No-op when not paused.
    pub fn resume(&mut self, now: Instant) -> bool {
        let Some(snapshot) = self.pause.release() else {
            return false;
        };
        self.is_idle = snapshot.prior_is_idle;
        self.is_task_active = snapshot.prior_is_task_active;
        let restored = snapshot.restored_status();
        tracing::info!(restored = %restored, "Resumed");

        match restored {
            Status::Waiting => {
                self.timer.schedule(now, self.config.idle_timeout());
                self.set_status(Status::Waiting);
            }
            Status::Idle => {
                self.set_status(Status::Idle);
                self.run_idle_effects();
            }
            _ => {
                self.finished_by = None;
                self.set_status(Status::Active);
            }
        }
        true
    }

    // ─────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────

    /// Merges a partial update. Disabling forces Active from any status.
    pub fn update_config(&mut self, update: &ConfigUpdate) {
        let was_enabled = self.config.enabled;
        self.config = self.config.merge(update);
        tracing::info!(
            enabled = self.config.enabled,
            method = ?self.config.detection_method,
            timeout_ms = self.config.idle_timeout_ms,
            "Configuration updated"
        );

        if !self.config.enabled {
            if was_enabled || self.status != Status::Active {
                self.pause.clear();
                self.become_active();
            }
            return;
        }

        // A source that was just deselected cannot keep holding the first report.
        if let Some(source) = self.finished_by {
            if !source_enabled(&self.config, source) {
                self.finished_by = None;
            }
        }
    }

    pub fn update_workspace_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::info!(path = %path.display(), "Workspace root updated");
        self.workspace_root = Some(path);
    }

    fn set_status(&mut self, next: Status) {
        if self.status == next {
            return;
        }
        tracing::info!(from = %self.status, to = %next, "Status changed");
        self.status = next;
        for listener in &self.listeners {
            listener.on_status_changed(next);
        }
    }
}
