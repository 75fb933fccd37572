use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use central_api::events::{OutcomeEvent, OutcomeKind};
use central_api::requests::InstanceInput;
use central_core::*;

const START_DELAY: Duration = Duration::from_millis(100);
const REDEPLOY_DELAY: Duration = Duration::from_millis(250);

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<OutcomeEvent>>,
}

impl RecordingSink {
    fn kinds(&self) -> Vec<OutcomeKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    fn count(&self, kind: OutcomeKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

impl NotificationSink for RecordingSink {
    fn on_outcome(&self, event: &OutcomeEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

struct StaticLogs;

#[async_trait]
impl LogSource for StaticLogs {
    async fn logs(&self, id: InstanceId) -> Vec<String> {
        vec![
            format!("[INFO] Instance {id} booted"),
            "[WARN] High memory usage detected (85%)".to_string(),
        ]
    }
}

fn test_config() -> LifecycleConfig {
    LifecycleConfig {
        start_delay_ms: 100,
        redeploy_delay_ms: 250,
        ..LifecycleConfig::default()
    }
}

fn spawn_console() -> (Console, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let console = Console::spawn(test_config(), sink.clone(), Arc::new(StaticLogs)).unwrap();
    (console, sink)
}

async fn add_stopped(console: &Console, name: &str) -> Instance {
    console
        .add(InstanceInput::new(name, "Stopped", "10.0.0.10"))
        .await
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_start_deploys_then_runs() {
    let (console, sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    let handle = console.start(instance.id).await.unwrap();
    assert_eq!(
        console.get(instance.id).await.unwrap().status,
        InstanceStatus::Deploying
    );

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome.kind, OutcomeKind::Started);
    assert_eq!(outcome.instance_id, instance.id.get());

    let running = console.get(instance.id).await.unwrap();
    assert_eq!(running.status, InstanceStatus::Running);
    assert!(running.last_status_change >= instance.last_status_change);
    assert_eq!(sink.kinds(), vec![OutcomeKind::Started]);

    console.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_second_start_is_busy() {
    let (console, sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    let first = console.start(instance.id).await.unwrap();
    let second = console.start(instance.id).await.unwrap_err();
    assert_eq!(second, CoreError::Busy(instance.id));
    assert!(console.is_in_flight(instance.id).await.unwrap());

    first.wait().await.unwrap();
    tokio::time::sleep(REDEPLOY_DELAY * 2).await;

    assert_eq!(sink.count(OutcomeKind::Started), 1);
    assert_eq!(sink.count(OutcomeKind::Busy), 1);
    assert!(!console.is_in_flight(instance.id).await.unwrap());
    assert_eq!(
        console.get(instance.id).await.unwrap().status,
        InstanceStatus::Running
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_admit_one() {
    let (console, sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    let (a, b) = tokio::join!(console.start(instance.id), console.start(instance.id));
    let (handle, rejected) = match (a, b) {
        (Ok(handle), Err(err)) | (Err(err), Ok(handle)) => (handle, err),
        other => panic!("expected one admitted start, got {other:?}"),
    };
    assert_eq!(rejected, CoreError::Busy(instance.id));

    assert_eq!(handle.wait().await.unwrap().kind, OutcomeKind::Started);
    assert_eq!(sink.count(OutcomeKind::Started), 1);
    assert_eq!(sink.count(OutcomeKind::Busy), 1);
    assert_eq!(
        console.get(instance.id).await.unwrap().status,
        InstanceStatus::Running
    );

    console.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_twice_is_idempotent() {
    let (console, sink) = spawn_console();
    let instance = console
        .add(InstanceInput::new("Client A", "Running", "10.0.0.10"))
        .await
        .unwrap();

    for _ in 0..2 {
        let mut handle = console.stop(instance.id).await.unwrap();
        let outcome = handle.try_outcome().unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Stopped);
        assert_eq!(
            console.get(instance.id).await.unwrap().status,
            InstanceStatus::Stopped
        );
    }

    assert_eq!(sink.kinds(), vec![OutcomeKind::Stopped, OutcomeKind::Stopped]);
}

#[tokio::test(start_paused = true)]
async fn test_start_when_running_short_circuits() {
    let (console, sink) = spawn_console();
    let instance = console
        .add(InstanceInput::new("Client A", "Running", "10.0.0.10"))
        .await
        .unwrap();

    let mut handle = console.start(instance.id).await.unwrap();
    let outcome = handle.try_outcome().unwrap();
    assert_eq!(outcome.kind, OutcomeKind::AlreadyRunning);
    assert!(!console.is_in_flight(instance.id).await.unwrap());
    assert_eq!(console.get(instance.id).await.unwrap(), instance);
    assert_eq!(sink.kinds(), vec![OutcomeKind::AlreadyRunning]);
}

#[tokio::test(start_paused = true)]
async fn test_redeploy_takes_longer_than_start() {
    let (console, _sink) = spawn_console();
    let a = add_stopped(&console, "Client A").await;
    let b = console
        .add(InstanceInput::new("Client B", "Running", "10.0.0.15"))
        .await
        .unwrap();

    let _start = console.start(a.id).await.unwrap();
    let redeploy = console.redeploy(b.id).await.unwrap();
    assert_eq!(
        console.get(b.id).await.unwrap().status,
        InstanceStatus::Deploying
    );

    tokio::time::sleep(START_DELAY + Duration::from_millis(1)).await;
    assert_eq!(console.get(a.id).await.unwrap().status, InstanceStatus::Running);
    assert_eq!(
        console.get(b.id).await.unwrap().status,
        InstanceStatus::Deploying
    );

    let outcome = redeploy.wait().await.unwrap();
    assert_eq!(outcome.kind, OutcomeKind::Redeployed);
    assert_eq!(console.get(b.id).await.unwrap().status, InstanceStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_deploying_is_busy() {
    let (console, _sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    let handle = console.start(instance.id).await.unwrap();
    assert_eq!(
        console.stop(instance.id).await.unwrap_err(),
        CoreError::Busy(instance.id)
    );
    assert_eq!(
        console.redeploy(instance.id).await.unwrap_err(),
        CoreError::Busy(instance.id)
    );

    assert_eq!(handle.wait().await.unwrap().kind, OutcomeKind::Started);
}

#[tokio::test(start_paused = true)]
async fn test_delete_during_flight_fails_transition() {
    let (console, sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    let handle = console.start(instance.id).await.unwrap();
    console.delete(instance.id).await.unwrap();

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome.kind, OutcomeKind::TransitionFailed);
    assert_eq!(
        console.get(instance.id).await.unwrap_err(),
        CoreError::NotFound(instance.id)
    );
    assert!(console.list_all().await.unwrap().is_empty());
    assert_eq!(sink.kinds(), vec![OutcomeKind::TransitionFailed]);
}

#[tokio::test(start_paused = true)]
async fn test_edit_during_flight_wins() {
    let (console, _sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    let handle = console.start(instance.id).await.unwrap();
    console
        .update(
            instance.id,
            InstanceInput::new("Client A", "Stopped", "10.0.0.99"),
        )
        .await
        .unwrap();

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome.kind, OutcomeKind::TransitionFailed);

    let current = console.get(instance.id).await.unwrap();
    assert_eq!(current.status, InstanceStatus::Stopped);
    assert_eq!(current.address, "10.0.0.99");
}

#[tokio::test(start_paused = true)]
async fn test_edit_keeping_status_lets_start_finish() {
    let (console, sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    let handle = console.start(instance.id).await.unwrap();
    console
        .update(
            instance.id,
            InstanceInput::new("Client A renamed", "Deploying", "10.0.0.10"),
        )
        .await
        .unwrap();

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome.kind, OutcomeKind::Started);

    let current = console.get(instance.id).await.unwrap();
    assert_eq!(current.status, InstanceStatus::Running);
    assert_eq!(current.name, "Client A renamed");
    assert!(!console.is_in_flight(instance.id).await.unwrap());
    assert_eq!(sink.kinds(), vec![OutcomeKind::Started]);
}

#[tokio::test(start_paused = true)]
async fn test_deleted_instance_is_not_found_while_flight_pending() {
    let (console, sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    let handle = console.start(instance.id).await.unwrap();
    console.delete(instance.id).await.unwrap();
    assert!(console.is_in_flight(instance.id).await.unwrap());

    assert_eq!(
        console.start(instance.id).await.unwrap_err(),
        CoreError::NotFound(instance.id)
    );
    assert_eq!(
        console.stop(instance.id).await.unwrap_err(),
        CoreError::NotFound(instance.id)
    );
    assert_eq!(
        console.redeploy(instance.id).await.unwrap_err(),
        CoreError::NotFound(instance.id)
    );

    assert_eq!(
        handle.wait().await.unwrap().kind,
        OutcomeKind::TransitionFailed
    );
    assert_eq!(sink.count(OutcomeKind::TransitionFailed), 4);
    assert_eq!(sink.count(OutcomeKind::Busy), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_leaves_instance_stopped() {
    let (console, sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    let handle = console.redeploy(instance.id).await.unwrap();
    console.cancel(instance.id).await.unwrap();

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome.kind, OutcomeKind::Cancelled);

    tokio::time::sleep(REDEPLOY_DELAY * 2).await;
    assert_eq!(
        console.get(instance.id).await.unwrap().status,
        InstanceStatus::Stopped
    );
    assert_eq!(sink.kinds(), vec![OutcomeKind::Cancelled]);

    // A fresh start after cancelling runs normally
    let handle = console.start(instance.id).await.unwrap();
    assert_eq!(handle.wait().await.unwrap().kind, OutcomeKind::Started);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_without_flight() {
    let (console, sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    assert_eq!(
        console.cancel(instance.id).await.unwrap_err(),
        CoreError::NotInFlight(instance.id)
    );
    assert!(sink.kinds().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_instance() {
    let (console, sink) = spawn_console();
    let id = InstanceId::new(99);

    assert_eq!(console.start(id).await.unwrap_err(), CoreError::NotFound(id));
    assert_eq!(console.delete(id).await.unwrap_err(), CoreError::NotFound(id));
    assert_eq!(console.logs(id).await.unwrap_err(), CoreError::NotFound(id));
    assert_eq!(sink.kinds(), vec![OutcomeKind::TransitionFailed]);
}

#[tokio::test(start_paused = true)]
async fn test_validation_errors_persist_nothing() {
    let (console, _sink) = spawn_console();

    let err = console
        .add(InstanceInput::new("", "Running", "10.0.0.10"))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some(Field::Name));

    let err = console
        .add(InstanceInput::new("X", "Running", "999.1.1.1"))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some(Field::Address));

    assert!(console.list_all().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_search_over_live_store() {
    let (console, _sink) = spawn_console();
    console
        .seed(&[
            InstanceInput::new("Client A", "Running", "10.0.0.10"),
            InstanceInput::new("Client B", "Stopped", "10.0.0.15"),
            InstanceInput::new("Client C", "Deploying", "10.0.0.22"),
        ])
        .await
        .unwrap();

    let found = console
        .search_and_filter("Client A", "Running".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Client A");

    let stopped = console.filter(InstanceStatus::Stopped.into()).await.unwrap();
    assert_eq!(stopped.len(), 1);
    assert_eq!(stopped[0].name, "Client B");

    let (visible, summary) = console
        .query(&InstanceQuery::new().keyword("client"))
        .await
        .unwrap();
    assert_eq!(visible.len(), 3);
    assert_eq!(summary.to_string(), "Showing 3 of 3 instances");
}

#[tokio::test(start_paused = true)]
async fn test_logs_pass_through() {
    let (console, _sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    let lines = console.logs(instance.id).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(LogLevel::classify(&lines[1]), LogLevel::Warn);
}

#[tokio::test(start_paused = true)]
async fn test_broadcast_sink_receives_outcomes() {
    let (tx, mut rx) = broadcast::channel(16);
    let console = Console::spawn(test_config(), Arc::new(tx), Arc::new(StaticLogs)).unwrap();
    let instance = add_stopped(&console, "Client A").await;

    console.start(instance.id).await.unwrap();
    let event = rx.recv().await.unwrap();
    assert_eq!(event.kind, OutcomeKind::Started);
    assert_eq!(event.instance_id, instance.id.get());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_fails_pending_transition() {
    let (console, sink) = spawn_console();
    let instance = add_stopped(&console, "Client A").await;

    let handle = console.start(instance.id).await.unwrap();
    console.shutdown().await;

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome.kind, OutcomeKind::TransitionFailed);
    assert_eq!(sink.kinds(), vec![OutcomeKind::TransitionFailed]);
}
