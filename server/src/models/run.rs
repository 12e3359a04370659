//! Workflow run models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier correlating a dispatched workflow with its run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunHandle {
    pub run_id: u64,
}

/// Run execution status as reported by the forge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Terminal conclusion of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    Success,
    Failure,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for RunConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunConclusion::Success => "success",
            RunConclusion::Failure => "failure",
            RunConclusion::Other => "other",
        };
        f.write_str(s)
    }
}

/// A workflow run as returned by the forge run endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Run identifier
    pub id: u64,

    /// Current status
    pub status: RunStatus,

    /// Conclusion, present once the run completed
    #[serde(default)]
    pub conclusion: Option<RunConclusion>,

    /// URL of the run's log archive
    #[serde(default)]
    pub logs_url: Option<String>,

    /// When the run started executing
    #[serde(default)]
    pub run_started_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of a run, produced fresh on each poll
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    /// Current status
    pub status: RunStatus,

    /// Conclusion, present once the run completed
    pub conclusion: Option<RunConclusion>,

    /// URL of the run's log archive, when one exists
    pub logs_url: Option<String>,
}

impl From<WorkflowRun> for RunSnapshot {
    fn from(run: WorkflowRun) -> Self {
        Self {
            status: run.status,
            conclusion: run.conclusion,
            logs_url: run.logs_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserializes_known_values() {
        let run: WorkflowRun = serde_json::from_str(
            r#"{"id": 7, "status": "in_progress", "conclusion": null}"#,
        )
        .unwrap();
        assert_eq!(run.status, RunStatus::InProgress);
        assert!(run.conclusion.is_none());
    }

    #[test]
    fn test_status_falls_back_to_unknown() {
        let run: WorkflowRun =
            serde_json::from_str(r#"{"id": 7, "status": "requested"}"#).unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
    }

    #[test]
    fn test_conclusion_other_values() {
        let run: WorkflowRun = serde_json::from_str(
            r#"{"id": 7, "status": "completed", "conclusion": "cancelled"}"#,
        )
        .unwrap();
        assert_eq!(run.conclusion, Some(RunConclusion::Other));
    }
}
