//! Streaming relay session
//!
//! One session owns one client-facing event stream for one run. The session
//! moves through Starting -> Streaming -> Terminal: an initial poll locates
//! the run, then a fixed-interval loop polls status, diffs the log archive
//! and emits events until the run completes, a poll fails, the attempt
//! ceiling is hit, or the client disconnects. Exactly one `Done` or `Error`
//! event ends every stream that got past Starting's `RunFound`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::forge::api::ForgeApi;
use crate::models::event::StreamEvent;
use crate::models::run::RunStatus;
use crate::stream::differ::{ArchiveDiffer, LogState};
use crate::stream::poller::RunPoller;
use crate::utils::truncate_for_log;

/// Relay session options
#[derive(Debug, Clone)]
pub struct Options {
    /// Fixed interval between streaming iterations
    pub poll_interval: Duration,

    /// Hard ceiling on streaming iterations. The default bounds a session
    /// at roughly 38 minutes.
    pub max_attempts: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(4),
            max_attempts: 580,
        }
    }
}

/// Run a relay session, emitting events until terminal.
///
/// The receiver half of `tx` is the single client; when it goes away the
/// session stops issuing forge calls and returns. All per-session state is
/// dropped on return.
pub async fn run(
    options: &Options,
    forge: Arc<dyn ForgeApi>,
    run_id: u64,
    tx: mpsc::Sender<StreamEvent>,
) {
    info!(run_id, "Log relay session starting...");

    let poller = RunPoller::new(forge.clone());
    let differ = ArchiveDiffer::new(forge);
    let mut log_state = LogState::default();

    // Starting: locate the run with one initial poll
    let initial = match poller.poll(run_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(run_id, "Initial status fetch failed: {}", e);
            let _ = tx
                .send(StreamEvent::Error {
                    message: e.to_string(),
                })
                .await;
            return;
        }
    };

    if tx
        .send(StreamEvent::RunFound {
            run_id,
            initial_status: initial.status,
        })
        .await
        .is_err()
    {
        debug!(run_id, "Client disconnected before streaming began");
        return;
    }

    let mut last_emitted = (initial.status, initial.conclusion);

    // Streaming: fixed-interval loop under a hard attempt ceiling
    for _attempt in 0..options.max_attempts {
        // Observe cancellation before issuing any further forge calls
        tokio::select! {
            _ = tx.closed() => {
                debug!(run_id, "Client disconnected, ending session");
                return;
            }
            _ = tokio::time::sleep(options.poll_interval) => {}
        }

        let snapshot = match poller.poll(run_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(run_id, "Status poll failed: {}", e);
                let _ = tx
                    .send(StreamEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                return;
            }
        };

        if (snapshot.status, snapshot.conclusion) != last_emitted {
            last_emitted = (snapshot.status, snapshot.conclusion);
            let event = StreamEvent::StatusChanged {
                status: snapshot.status,
                conclusion: snapshot.conclusion,
            };
            if tx.send(event).await.is_err() {
                return;
            }
        }

        if let Some(url) = snapshot.logs_url.as_deref() {
            if let Some(delta) = differ.fetch_delta(&mut log_state, url).await {
                debug!(run_id, "Log delta: {}", truncate_for_log(&delta.text, 120));
                let event = StreamEvent::LogDelta {
                    lines: delta.text,
                    replace: delta.replacement.then_some(true),
                };
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        }

        if snapshot.status == RunStatus::Completed {
            info!(run_id, conclusion = ?snapshot.conclusion, "Run completed");
            let _ = tx.send(StreamEvent::done(snapshot.conclusion)).await;
            return;
        }
    }

    warn!(run_id, "Polling attempt ceiling reached");
    let _ = tx
        .send(StreamEvent::Error {
            message: "polling timeout reached".to_string(),
        })
        .await;
}
