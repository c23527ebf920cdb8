//! End-to-end idle scenarios driven through the public API with a fake clock.

use idle_core::{
    ComposedPrompt, ConfigUpdate, DetectionArbiter, DetectionMethod, IdleConfig, IdleListener,
    Status,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Seen {
    Status(Status),
    Idle,
    Active,
    Prompt(String),
}

#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<Seen>>>);

impl Log {
    fn all(&self) -> Vec<Seen> {
        self.0.lock().unwrap().clone()
    }

    fn prompts(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|seen| match seen {
                Seen::Prompt(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn idle_count(&self) -> usize {
        self.all().iter().filter(|seen| **seen == Seen::Idle).count()
    }
}

impl IdleListener for Log {
    fn on_status_changed(&self, status: Status) {
        self.0.lock().unwrap().push(Seen::Status(status));
    }

    fn on_idle(&self, _cycle: u64) {
        self.0.lock().unwrap().push(Seen::Idle);
    }

    fn on_active(&self) {
        self.0.lock().unwrap().push(Seen::Active);
    }

    fn on_continuation_ready(&self, prompt: &ComposedPrompt) {
        self.0.lock().unwrap().push(Seen::Prompt(prompt.text.clone()));
    }
}

fn setup(method: DetectionMethod, workspace: &Path) -> (DetectionArbiter, Log) {
    let log = Log::default();
    let mut arbiter = DetectionArbiter::new(IdleConfig {
        detection_method: method,
        idle_timeout_ms: 1_000,
        continuation_folder: "queue".into(),
        ..IdleConfig::default()
    })
    .with_workspace_root(workspace);
    arbiter.add_listener(Box::new(log.clone()));
    (arbiter, log)
}

fn at(start: Instant, ms: u64) -> Instant {
    start + Duration::from_millis(ms)
}

#[test]
fn presence_finished_composes_single_resource_prompt() {
    let workspace = tempdir().expect("temp dir");
    let queue = workspace.path().join("queue");
    std::fs::create_dir_all(&queue).expect("queue dir");
    std::fs::write(queue.join("a.txt"), "hello").expect("a.txt");

    let (mut arbiter, log) = setup(DetectionMethod::Presence, workspace.path());
    let t0 = Instant::now();

    arbiter.notify_affordance_visible(t0);
    arbiter.poll_timer(at(t0, 1_000));

    assert_eq!(arbiter.status(), Status::Idle);
    assert_eq!(log.prompts(), vec!["## a.txt\nhello".to_string()]);
    assert_eq!(log.idle_count(), 1);
}

#[test]
fn hybrid_second_source_does_not_push_deadline() {
    let workspace = tempdir().expect("temp dir");
    let (mut arbiter, log) = setup(DetectionMethod::Hybrid, workspace.path());
    let t0 = Instant::now();

    arbiter.notify_affordance_visible(t0);
    arbiter.notify_task_completed_or_message_sent(at(t0, 500));

    assert_eq!(arbiter.next_deadline(), Some(at(t0, 1_000)));
    assert!(arbiter.poll_timer(at(t0, 1_000)));
    assert!(!arbiter.poll_timer(at(t0, 1_500)));
    assert_eq!(log.idle_count(), 1);
}

#[test]
fn first_run_bootstraps_then_second_cycle_fires() {
    let workspace = tempdir().expect("temp dir");
    let (mut arbiter, log) = setup(DetectionMethod::Auto, workspace.path());
    let queue = workspace.path().join("queue");
    let t0 = Instant::now();

    arbiter.notify_affordance_visible(t0);
    arbiter.poll_timer(at(t0, 1_000));
    assert!(queue.is_dir());
    let created: Vec<_> = std::fs::read_dir(&queue)
        .expect("list queue")
        .map(|entry| entry.expect("entry").file_name())
        .collect();
    assert_eq!(created.len(), 1);
    assert!(log.prompts().is_empty());

    std::fs::write(queue.join("next.txt"), "write the changelog").expect("next.txt");
    arbiter.notify_affordance_hidden(at(t0, 2_000));
    arbiter.notify_affordance_visible(at(t0, 3_000));
    arbiter.poll_timer(at(t0, 4_000));

    assert_eq!(
        log.prompts(),
        vec!["## next.txt\nwrite the changelog".to_string()]
    );
}

#[test]
fn resume_before_deadline_never_idles() {
    let workspace = tempdir().expect("temp dir");
    let (mut arbiter, log) = setup(DetectionMethod::Event, workspace.path());
    let t0 = Instant::now();

    for offset in [0, 2_000, 4_000] {
        arbiter.notify_task_completed_or_message_sent(at(t0, offset));
        arbiter.poll_timer(at(t0, offset + 999));
        arbiter.notify_task_started(at(t0, offset + 999));
        arbiter.poll_timer(at(t0, offset + 1_500));
    }

    assert_eq!(log.idle_count(), 0);
    assert_eq!(arbiter.status(), Status::Active);
}

#[test]
fn pause_resume_restores_exact_status_without_extra_idle() {
    let workspace = tempdir().expect("temp dir");
    let (mut arbiter, log) = setup(DetectionMethod::Auto, workspace.path());
    let t0 = Instant::now();

    arbiter.notify_affordance_visible(t0);
    arbiter.pause();
    arbiter.resume(at(t0, 100));

    assert_eq!(arbiter.status(), Status::Waiting);
    assert_eq!(
        log.all(),
        vec![
            Seen::Status(Status::Waiting),
            Seen::Status(Status::Paused),
            Seen::Status(Status::Waiting),
        ]
    );
}

#[test]
fn disabling_mid_countdown_forces_active() {
    let workspace = tempdir().expect("temp dir");
    let (mut arbiter, log) = setup(DetectionMethod::Auto, workspace.path());
    let t0 = Instant::now();

    arbiter.notify_affordance_visible(t0);
    arbiter.update_config(&ConfigUpdate {
        enabled: Some(false),
        ..ConfigUpdate::default()
    });

    assert_eq!(arbiter.status(), Status::Active);
    assert!(arbiter.next_deadline().is_none());
    assert!(!arbiter.poll_timer(at(t0, 5_000)));
    assert_eq!(log.idle_count(), 0);
}

#[test]
fn workspace_change_redirects_ingestion() {
    let first = tempdir().expect("first workspace");
    let second = tempdir().expect("second workspace");
    let queue = second.path().join("queue");
    std::fs::create_dir_all(&queue).expect("queue dir");
    std::fs::write(queue.join("only.txt"), "from second").expect("only.txt");

    let (mut arbiter, log) = setup(DetectionMethod::Auto, first.path());
    arbiter.update_workspace_path(second.path());
    let t0 = Instant::now();

    arbiter.notify_task_completed_or_message_sent(t0);
    arbiter.poll_timer(at(t0, 1_000));

    assert_eq!(log.prompts(), vec!["## only.txt\nfrom second".to_string()]);
    assert!(!first.path().join("queue").exists());
}
