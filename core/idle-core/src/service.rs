//! Threaded driver for the arbiter.
//!
//! One worker thread owns the [`DetectionArbiter`] and drains a command
//! channel. Between commands it sleeps no longer than the pending countdown,
//! so timer fires and signals are applied strictly one at a time:
//!
//! ```text
//! IdleHandle ──mpsc──▶ worker loop ──▶ DetectionArbiter ──▶ listeners
//!   (any thread)        recv_timeout(deadline)
//! ```
//!
//! Ingestion runs inline on the worker, so a `resumed` sent mid-read waits in
//! the channel until the composed prompt has been emitted.

use crate::arbiter::DetectionArbiter;
use crate::config::ConfigUpdate;
use crate::error::{IdleError, Result};
use crate::types::IdleSnapshot;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

const WORKER_THREAD_NAME: &str = "idle-arbiter";

#[derive(Debug)]
enum Command {
    AffordanceVisible,
    AffordanceHidden,
    TaskStarted,
    TaskCompleted,
    UserActivity,
    Pause,
    Resume,
    UpdateConfig(ConfigUpdate),
    UpdateWorkspace(PathBuf),
    Snapshot(Sender<IdleSnapshot>),
    Shutdown,
}

/// Cloneable sender for every inbound operation.
#[derive(Debug, Clone)]
pub struct IdleHandle {
    sender: Sender<Command>,
}

impl IdleHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.sender
            .send(command)
            .map_err(|_| IdleError::ServiceStopped)
    }

    pub fn notify_affordance_visible(&self) -> Result<()> {
        self.send(Command::AffordanceVisible)
    }

    pub fn notify_affordance_hidden(&self) -> Result<()> {
        self.send(Command::AffordanceHidden)
    }

    pub fn notify_task_started(&self) -> Result<()> {
        self.send(Command::TaskStarted)
    }

    pub fn notify_task_completed_or_message_sent(&self) -> Result<()> {
        self.send(Command::TaskCompleted)
    }

    pub fn notify_user_activity(&self) -> Result<()> {
        self.send(Command::UserActivity)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(Command::Resume)
    }

    pub fn update_config(&self, update: ConfigUpdate) -> Result<()> {
        self.send(Command::UpdateConfig(update))
    }

    pub fn update_workspace_path(&self, path: impl Into<PathBuf>) -> Result<()> {
        self.send(Command::UpdateWorkspace(path.into()))
    }

    /// Round-trips through the worker, so the snapshot reflects every
    /// command sent before it.
    pub fn snapshot(&self) -> Result<IdleSnapshot> {
        let (reply, response) = mpsc::channel();
        self.send(Command::Snapshot(reply))?;
        response.recv().map_err(|_| IdleError::ServiceStopped)
    }
}

pub struct IdleService {
    handle: IdleHandle,
    worker: Option<JoinHandle<DetectionArbiter>>,
}

impl IdleService {
    /// Moves the arbiter onto its worker thread.
    pub fn spawn(arbiter: DetectionArbiter) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_loop(arbiter, receiver))
            .map_err(|source| IdleError::Io {
                context: "spawning idle arbiter thread".to_string(),
                source,
            })?;

        Ok(Self {
            handle: IdleHandle { sender },
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> IdleHandle {
        self.handle.clone()
    }

    /// Stops the worker and hands the arbiter back.
    pub fn shutdown(mut self) -> Option<DetectionArbiter> {
        let _ = self.handle.send(Command::Shutdown);
        let worker = self.worker.take()?;
        match worker.join() {
            Ok(arbiter) => Some(arbiter),
            Err(_) => {
                tracing::error!("Idle arbiter thread panicked");
                None
            }
        }
    }
}

impl Drop for IdleService {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.handle.send(Command::Shutdown);
            let _ = worker.join();
        }
    }
}

fn run_loop(mut arbiter: DetectionArbiter, receiver: Receiver<Command>) -> DetectionArbiter {
    tracing::info!(status = %arbiter.status(), "Idle arbiter started");
    loop {
        let now = Instant::now();
        arbiter.poll_timer(now);

        let command = match arbiter.next_deadline() {
            Some(deadline) => match receiver.recv_timeout(deadline.saturating_duration_since(now)) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match receiver.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };

        if !apply(&mut arbiter, command) {
            break;
        }
    }
    tracing::info!(status = %arbiter.status(), "Idle arbiter stopped");
    arbiter
}

/// Returns false when the loop should stop.
fn apply(arbiter: &mut DetectionArbiter, command: Command) -> bool {
    let now = Instant::now();
    match command {
        Command::AffordanceVisible => {
            arbiter.notify_affordance_visible(now);
        }
        Command::AffordanceHidden => {
            arbiter.notify_affordance_hidden(now);
        }
        Command::TaskStarted => {
            arbiter.notify_task_started(now);
        }
        Command::TaskCompleted => {
            arbiter.notify_task_completed_or_message_sent(now);
        }
        Command::UserActivity => arbiter.notify_user_activity(),
        Command::Pause => {
            arbiter.pause();
        }
        Command::Resume => {
            arbiter.resume(now);
        }
        Command::UpdateConfig(update) => arbiter.update_config(&update),
        Command::UpdateWorkspace(path) => arbiter.update_workspace_path(path),
        Command::Snapshot(reply) => {
            let _ = reply.send(arbiter.snapshot(now));
        }
        Command::Shutdown => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdleConfig;
    use crate::listener::IdleListener;
    use crate::types::Status;
    use std::time::Duration;

    struct ChannelListener(Sender<Status>);

    impl IdleListener for ChannelListener {
        fn on_status_changed(&self, status: Status) {
            let _ = self.0.send(status);
        }
    }

    fn spawn_with_listener(config: IdleConfig) -> (IdleService, Receiver<Status>, tempfile::TempDir) {
        let temp = tempfile::tempdir().expect("temp dir");
        let (tx, rx) = mpsc::channel();
        let mut arbiter = DetectionArbiter::new(config).with_workspace_root(temp.path());
        arbiter.add_listener(Box::new(ChannelListener(tx)));
        let service = IdleService::spawn(arbiter).expect("spawn service");
        (service, rx, temp)
    }

    #[test]
    fn countdown_fires_on_worker_thread() {
        let (service, statuses, _temp) = spawn_with_listener(IdleConfig {
            idle_timeout_ms: 1_000,
            ..IdleConfig::default()
        });
        let handle = service.handle();

        handle.notify_affordance_visible().expect("send");
        assert_eq!(
            statuses.recv_timeout(Duration::from_secs(1)),
            Ok(Status::Waiting)
        );
        assert_eq!(
            statuses.recv_timeout(Duration::from_secs(5)),
            Ok(Status::Idle)
        );

        let arbiter = service.shutdown().expect("arbiter back");
        assert_eq!(arbiter.status(), Status::Idle);
        assert_eq!(arbiter.idle_cycle(), 1);
    }

    #[test]
    fn snapshot_sees_prior_commands() {
        let (service, _statuses, _temp) = spawn_with_listener(IdleConfig::default());
        let handle = service.handle();

        handle.notify_task_completed_or_message_sent().expect("send");
        handle.pause().expect("send");
        let snapshot = handle.snapshot().expect("snapshot");

        assert_eq!(snapshot.status, Status::Paused);
        assert_eq!(snapshot.paused_from, Some(Status::Waiting));
    }

    #[test]
    fn handle_errors_after_shutdown() {
        let (service, _statuses, _temp) = spawn_with_listener(IdleConfig::default());
        let handle = service.handle();
        service.shutdown();

        assert!(matches!(
            handle.notify_user_activity(),
            Err(IdleError::ServiceStopped)
        ));
        assert!(matches!(handle.snapshot(), Err(IdleError::ServiceStopped)));
    }
}
