//! Events streamed to the portal over SSE

use axum::response::sse::Event;
use serde::Serialize;

use crate::models::run::{RunConclusion, RunStatus};

/// A single event within a log relay session.
///
/// Events are totally ordered within one session; exactly one `Done` or
/// `Error` is emitted, always last.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// The run was located and the session entered streaming
    #[serde(rename_all = "camelCase")]
    RunFound {
        run_id: u64,
        initial_status: RunStatus,
    },

    /// The `(status, conclusion)` pair changed since the last emission
    StatusChanged {
        status: RunStatus,
        conclusion: Option<RunConclusion>,
    },

    /// New log output since the previous fetch. When `replace` is set the
    /// consumer must discard its accumulated view instead of appending.
    LogDelta {
        lines: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        replace: Option<bool>,
    },

    /// The run reached its terminal state
    Done {
        success: bool,
        conclusion: Option<RunConclusion>,
        message: String,
    },

    /// The session failed; the deployment must be treated as failed
    Error { message: String },
}

impl StreamEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::RunFound { .. } => "run_found",
            StreamEvent::StatusChanged { .. } => "status",
            StreamEvent::LogDelta { .. } => "log",
            StreamEvent::Done { .. } => "done",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Build the terminal event for a completed run
    pub fn done(conclusion: Option<RunConclusion>) -> Self {
        let message = match conclusion {
            Some(c) => format!("Workflow {}.", c),
            None => "Workflow finished.".to_string(),
        };
        StreamEvent::Done {
            success: conclusion == Some(RunConclusion::Success),
            conclusion,
            message,
        }
    }

    /// Encode as a named SSE event with a JSON payload
    pub fn to_sse_event(&self) -> Event {
        Event::default()
            .event(self.name())
            .json_data(self)
            .unwrap_or_else(|_| {
                Event::default()
                    .event("error")
                    .data(r#"{"message":"event serialization failed"}"#)
            })
    }
}
