//! Maps host notifications to detection signals and gates them by configuration.
//!
//! Two independent producers report "work finished" / "work resumed":
//!
//! ```text
//! affordance visible          -> presence / finished
//! affordance hidden           -> presence / resumed
//! task started                -> event    / resumed
//! task completed              -> event    / finished
//! message sent                -> event    / finished
//! ```
//!
//! Neither adapter holds state; the arbiter owns every decision after gating.

use crate::config::{DetectionMethod, IdleConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    Presence,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Resumed,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSignal {
    pub source: DetectionSource,
    pub kind: SignalKind,
}

impl DetectionSignal {
    pub fn finished(source: DetectionSource) -> Self {
        Self {
            source,
            kind: SignalKind::Finished,
        }
    }

    pub fn resumed(source: DetectionSource) -> Self {
        Self {
            source,
            kind: SignalKind::Resumed,
        }
    }
}

impl DetectionMethod {
    /// Eligibility table: which sources participate under this method.
    pub fn includes(self, source: DetectionSource) -> bool {
        match (self, source) {
            (DetectionMethod::Auto | DetectionMethod::Hybrid, _) => true,
            (DetectionMethod::Presence, DetectionSource::Presence) => true,
            (DetectionMethod::Event, DetectionSource::Event) => true,
            _ => false,
        }
    }
}

/// Whether a signal from `source` should reach the state machine at all.
pub fn source_enabled(config: &IdleConfig, source: DetectionSource) -> bool {
    config.enabled && config.detection_method.includes(source)
}

/// Visibility changes of the "ready for new work" UI affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceChange {
    Visible,
    Hidden,
}

impl PresenceChange {
    pub fn signal(self) -> DetectionSignal {
        match self {
            PresenceChange::Visible => DetectionSignal::finished(DetectionSource::Presence),
            PresenceChange::Hidden => DetectionSignal::resumed(DetectionSource::Presence),
        }
    }
}

/// Task lifecycle events reported by the session driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    TaskStarted,
    TaskCompleted,
    MessageSent,
}

impl LifecycleEvent {
    pub fn signal(self) -> DetectionSignal {
        match self {
            LifecycleEvent::TaskStarted => DetectionSignal::resumed(DetectionSource::Event),
            LifecycleEvent::TaskCompleted | LifecycleEvent::MessageSent => {
                DetectionSignal::finished(DetectionSource::Event)
            }
        }
    }
}
