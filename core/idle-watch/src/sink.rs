//! Writes arbiter events to the host as JSON lines.

use crate::protocol::Event;
use idle_core::{
    ComposedPrompt, IdleError, IdleListener, IdleNotification, IdleNotifier, Status,
};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Cloneable event writer shared by the arbiter thread and the command loop.
#[derive(Clone)]
pub struct EventSink {
    writer: SharedWriter,
    show_status: Arc<AtomicBool>,
}

impl EventSink {
    pub fn new(writer: Box<dyn Write + Send>, show_status: bool) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            show_status: Arc::new(AtomicBool::new(show_status)),
        }
    }

    pub fn stdout(show_status: bool) -> Self {
        Self::new(Box::new(std::io::stdout()), show_status)
    }

    pub fn set_show_status(&self, show: bool) {
        self.show_status.store(show, Ordering::SeqCst);
    }

    pub fn emit(&self, event: &Event) -> std::io::Result<()> {
        let line = serde_json::to_string(event)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "event writer poisoned"))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    fn emit_logged(&self, event: &Event) {
        if let Err(err) = self.emit(event) {
            tracing::warn!(error = %err, "Failed to write event");
        }
    }
}

impl IdleListener for EventSink {
    fn on_status_changed(&self, status: Status) {
        if self.show_status.load(Ordering::SeqCst) {
            self.emit_logged(&Event::StatusChanged { status });
        }
    }

    fn on_idle(&self, cycle: u64) {
        self.emit_logged(&Event::Idle { cycle });
    }

    fn on_active(&self) {
        self.emit_logged(&Event::Active);
    }

    fn on_continuation_ready(&self, prompt: &ComposedPrompt) {
        self.emit_logged(&Event::ContinuationReady {
            prompt: prompt.text.clone(),
            sources: prompt.sources.clone(),
            cycle: prompt.cycle,
        });
    }
}

impl IdleNotifier for EventSink {
    fn notify(&self, notification: &IdleNotification) -> idle_core::Result<()> {
        self.emit(&Event::Notification {
            message: notification.message.clone(),
            cycle: notification.cycle,
            at: notification.at,
        })
        .map_err(|err| IdleError::NotificationFailed(err.to_string()))
    }
}
