//! Single-slot countdown.
//!
//! The scheduler never runs anything itself. It records one deadline and hands
//! back a token when polled past it; the owner reacts to the token. Time is
//! always passed in so callers (and tests) control the clock.

use std::time::{Duration, Instant};

/// Identifies one scheduled countdown. A newer schedule always gets a new token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    token: TimerToken,
    deadline: Instant,
}

/// At most one pending countdown at any time.
#[derive(Debug, Default)]
pub struct TimerScheduler {
    pending: Option<PendingTimer>,
    issued: u64,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a countdown, discarding whatever was pending.
    pub fn schedule(&mut self, now: Instant, delay: Duration) -> TimerToken {
        self.issued += 1;
        let token = TimerToken(self.issued);
        if let Some(previous) = self.pending.take() {
            tracing::debug!(
                replaced = previous.token.id(),
                token = token.id(),
                "Countdown replaced"
            );
        }
        self.pending = Some(PendingTimer {
            token,
            deadline: now + delay,
        });
        token
    }

    /// Drops the pending countdown. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.deadline)
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Consumes the pending countdown if its deadline has been reached.
    /// A given token is returned at most once.
    pub fn fire_due(&mut self, now: Instant) -> Option<TimerToken> {
        match self.pending {
            Some(pending) if pending.deadline <= now => {
                self.pending = None;
                Some(pending.token)
            }
            _ => None,
        }
    }
}
