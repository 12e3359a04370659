//! Job dispatcher
//!
//! Triggers the provisioning workflow and resolves the run it caused. The
//! dispatch endpoint is fire-and-forget, so the run id has to be discovered
//! by listing recent runs and picking the earliest one started after the
//! dispatch timestamp. The race stays contained here; callers only ever see
//! a [`RunHandle`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::errors::RelayError;
use crate::forge::api::ForgeApi;
use crate::models::deployment::DeploymentRequest;
use crate::models::run::RunHandle;

/// Dispatcher options
#[derive(Debug, Clone)]
pub struct Options {
    /// Git ref the workflow is dispatched on
    pub git_ref: String,

    /// Maximum listing attempts while looking for the new run
    pub discovery_attempts: u32,

    /// Fixed spacing between listing attempts. No backoff: the goal is
    /// minimal latency finding a just-created run, not riding out sustained
    /// unavailability.
    pub discovery_interval: Duration,

    /// How many recent runs each listing attempt inspects
    pub list_window: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            git_ref: "main".to_string(),
            discovery_attempts: 10,
            discovery_interval: Duration::from_secs(2),
            list_window: 5,
        }
    }
}

/// Dispatches provisioning workflows and resolves their run handles
pub struct Dispatcher {
    forge: Arc<dyn ForgeApi>,
    options: Options,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new(forge: Arc<dyn ForgeApi>, options: Options) -> Self {
        Self { forge, options }
    }

    /// Trigger the provisioning workflow for a request and resolve the run
    /// it created.
    ///
    /// Fails with [`RelayError::DispatchError`] when the trigger call fails
    /// (no retry; the forge may have partially accepted it), with
    /// [`RelayError::DiscoveryError`] when a listing call fails, and with
    /// [`RelayError::DiscoveryTimeout`] when no caused run shows up within
    /// the attempt budget.
    pub async fn dispatch(&self, request: &DeploymentRequest) -> Result<RunHandle, RelayError> {
        let inputs = request.to_workflow_inputs();
        let dispatch_time = Utc::now();

        info!(user_id = %request.user_id, "Dispatching provisioning workflow...");
        self.forge
            .dispatch_workflow(&self.options.git_ref, &inputs)
            .await
            .map_err(|e| RelayError::DispatchError(e.to_string()))?;

        for attempt in 1..=self.options.discovery_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.options.discovery_interval).await;
            }

            debug!("Run discovery attempt {}...", attempt);
            let runs = self
                .forge
                .list_recent_runs(self.options.list_window)
                .await
                .map_err(|e| RelayError::DiscoveryError(e.to_string()))?;

            // Earliest run started strictly after the dispatch timestamp
            let found = runs
                .iter()
                .filter(|run| run.run_started_at.is_some_and(|t| t > dispatch_time))
                .min_by_key(|run| run.run_started_at);

            if let Some(run) = found {
                info!(run_id = run.id, "Workflow run discovered");
                return Ok(RunHandle { run_id: run.id });
            }
        }

        warn!(
            "No workflow run discovered after {} attempts",
            self.options.discovery_attempts
        );
        Err(RelayError::DiscoveryTimeout)
    }
}
