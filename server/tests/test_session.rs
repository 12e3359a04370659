//! Relay session integration tests

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use common::{workflow_run, zip_archive, FakeForge};
use stackpilot::models::event::StreamEvent;
use stackpilot::models::run::{RunConclusion, RunStatus};
use stackpilot::stream::session::{self, Options};

const LOGS: Option<&str> = Some("https://forge.example/runs/1/logs");

fn fast_options() -> Options {
    Options {
        poll_interval: Duration::from_millis(1),
        ..Default::default()
    }
}

/// Drive a session to completion and collect every emitted event
async fn run_session(forge: Arc<FakeForge>, options: Options) -> Vec<StreamEvent> {
    let (tx, mut rx) = mpsc::channel(32);
    let collector = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    });

    session::run(&options, forge, 1, tx).await;
    collector.await.expect("collector task")
}

fn terminal_count(events: &[StreamEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, StreamEvent::Done { .. } | StreamEvent::Error { .. }))
        .count()
}

#[tokio::test]
async fn test_status_transitions_are_deduplicated() {
    let forge = Arc::new(FakeForge::new());
    forge.push_run_details(Ok(workflow_run(1, RunStatus::Queued, None, None, None)));
    forge.push_run_details(Ok(workflow_run(1, RunStatus::Queued, None, None, None)));
    forge.push_run_details(Ok(workflow_run(1, RunStatus::InProgress, None, None, None)));
    forge.push_run_details(Ok(workflow_run(
        1,
        RunStatus::Completed,
        Some(RunConclusion::Success),
        None,
        None,
    )));

    let events = run_session(forge, fast_options()).await;

    assert_eq!(
        events[0],
        StreamEvent::RunFound {
            run_id: 1,
            initial_status: RunStatus::Queued
        }
    );

    let statuses: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, StreamEvent::StatusChanged { .. }))
        .collect();
    assert_eq!(statuses.len(), 2);
    assert_eq!(
        statuses[0],
        &StreamEvent::StatusChanged {
            status: RunStatus::InProgress,
            conclusion: None
        }
    );

    match events.last().unwrap() {
        StreamEvent::Done { success, .. } => assert!(*success),
        other => panic!("expected done, got {:?}", other),
    }
    assert_eq!(terminal_count(&events), 1);
}

#[tokio::test]
async fn test_log_deltas_stream_incrementally() {
    let forge = Arc::new(FakeForge::new());
    forge.push_run_details(Ok(workflow_run(1, RunStatus::InProgress, None, LOGS, None)));
    forge.push_run_details(Ok(workflow_run(1, RunStatus::InProgress, None, LOGS, None)));
    forge.push_run_details(Ok(workflow_run(1, RunStatus::InProgress, None, LOGS, None)));
    forge.push_run_details(Ok(workflow_run(
        1,
        RunStatus::Completed,
        Some(RunConclusion::Success),
        LOGS,
        None,
    )));
    forge.push_archive(Ok(zip_archive(&[(
        "1_setup.txt",
        "2024-01-01T00:00:00.000Z hello\n",
    )])));
    forge.push_archive(Ok(zip_archive(&[(
        "1_setup.txt",
        "2024-01-01T00:00:00.000Z hello\n2024-01-01T00:00:01.000Z world\n",
    )])));

    let events = run_session(forge, fast_options()).await;

    let logs: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::LogDelta { lines, replace } => Some((lines.clone(), *replace)),
            _ => None,
        })
        .collect();

    assert_eq!(logs[0], ("hello\n".to_string(), None));
    assert_eq!(logs[1], ("world\n".to_string(), None));
    assert_eq!(logs.len(), 2);

    assert!(matches!(
        events.last().unwrap(),
        StreamEvent::Done { success: true, .. }
    ));
}

#[tokio::test]
async fn test_rewritten_logs_emit_replacement() {
    let forge = Arc::new(FakeForge::new());
    forge.push_run_details(Ok(workflow_run(1, RunStatus::InProgress, None, LOGS, None)));
    forge.push_run_details(Ok(workflow_run(1, RunStatus::InProgress, None, LOGS, None)));
    forge.push_run_details(Ok(workflow_run(1, RunStatus::InProgress, None, LOGS, None)));
    forge.push_run_details(Ok(workflow_run(
        1,
        RunStatus::Completed,
        Some(RunConclusion::Failure),
        None,
        None,
    )));
    forge.push_archive(Ok(zip_archive(&[("1_setup.txt", "first\n")])));
    forge.push_archive(Ok(zip_archive(&[("1_setup.txt", "rewritten\n")])));

    let events = run_session(forge, fast_options()).await;

    let logs: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::LogDelta { lines, replace } => Some((lines.clone(), *replace)),
            _ => None,
        })
        .collect();

    assert_eq!(logs[0], ("first\n".to_string(), None));
    assert_eq!(logs[1], ("rewritten\n".to_string(), Some(true)));

    assert!(matches!(
        events.last().unwrap(),
        StreamEvent::Done { success: false, .. }
    ));
}

#[tokio::test]
async fn test_poll_failure_ends_session_with_error() {
    let forge = Arc::new(FakeForge::new());
    forge.push_run_details(Ok(workflow_run(1, RunStatus::Queued, None, None, None)));
    forge.push_run_details(Err("500: status unavailable"));

    let events = run_session(forge, fast_options()).await;

    assert!(matches!(events[0], StreamEvent::RunFound { .. }));
    assert!(matches!(events.last().unwrap(), StreamEvent::Error { .. }));
    assert_eq!(terminal_count(&events), 1);
}

#[tokio::test]
async fn test_initial_poll_failure_emits_only_error() {
    let forge = Arc::new(FakeForge::new());
    forge.push_run_details(Err("404: no such run"));

    let events = run_session(forge, fast_options()).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], StreamEvent::Error { .. }));
}

#[tokio::test]
async fn test_attempt_ceiling_emits_timeout_error() {
    let forge = Arc::new(FakeForge::new());
    forge.push_run_details(Ok(workflow_run(1, RunStatus::Queued, None, None, None)));

    let options = Options {
        max_attempts: 3,
        ..fast_options()
    };
    let events = run_session(forge.clone(), options).await;

    // One initial poll plus exactly max_attempts streaming polls
    assert_eq!(forge.details_calls.load(Ordering::SeqCst), 4);
    assert!(matches!(events[0], StreamEvent::RunFound { .. }));
    match events.last().unwrap() {
        StreamEvent::Error { message } => assert_eq!(message, "polling timeout reached"),
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(terminal_count(&events), 1);
}

#[tokio::test]
async fn test_client_disconnect_stops_session() {
    let forge = Arc::new(FakeForge::new());
    forge.push_run_details(Ok(workflow_run(1, RunStatus::Queued, None, None, None)));

    let (tx, mut rx) = mpsc::channel(32);
    let session_forge = forge.clone();
    let handle = tokio::spawn(async move {
        let options = Options {
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        };
        session::run(&options, session_forge, 1, tx).await;
    });

    let first = rx.recv().await.expect("run_found event");
    assert!(matches!(first, StreamEvent::RunFound { .. }));
    drop(rx);

    // The session notices the closed channel and returns well before the
    // 580-attempt ceiling
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("session should stop after disconnect")
        .expect("session task");
}
