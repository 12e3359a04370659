//! Forge API interface
//!
//! The narrow surface the core consumes from the remote CI forge. The
//! dispatcher, poller and differencer all go through this trait so they can
//! be exercised against fakes without network access.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::RelayError;
use crate::models::run::WorkflowRun;

/// Remote CI forge operations
#[async_trait]
pub trait ForgeApi: Send + Sync {
    /// Trigger a workflow run on the given ref with scalar named inputs.
    ///
    /// The forge acknowledges the dispatch without returning the run it
    /// created; callers discover the run id separately.
    async fn dispatch_workflow(
        &self,
        git_ref: &str,
        inputs: &BTreeMap<String, String>,
    ) -> Result<(), RelayError>;

    /// List the most recent runs of the provisioning workflow, newest first
    async fn list_recent_runs(&self, limit: usize) -> Result<Vec<WorkflowRun>, RelayError>;

    /// Fetch the current details of one run
    async fn run_details(&self, run_id: u64) -> Result<WorkflowRun, RelayError>;

    /// Fetch a run's log archive as raw bytes
    async fn fetch_log_archive(&self, archive_url: &str) -> Result<Vec<u8>, RelayError>;
}
