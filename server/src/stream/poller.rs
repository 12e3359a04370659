//! Run status poller

use std::sync::Arc;

use tracing::debug;

use crate::errors::RelayError;
use crate::forge::api::ForgeApi;
use crate::models::run::RunSnapshot;

/// Polls the forge for the current state of one run.
///
/// Stateless: every call is a single run-details request returning a fresh
/// snapshot. Transition detection and retry policy belong to the relay
/// session driving the poller, not here. A poll failure is fatal to the
/// owning session since status is the only terminal-detection signal.
pub struct RunPoller {
    forge: Arc<dyn ForgeApi>,
}

impl RunPoller {
    /// Create a new poller
    pub fn new(forge: Arc<dyn ForgeApi>) -> Self {
        Self { forge }
    }

    /// Fetch the current snapshot of a run
    pub async fn poll(&self, run_id: u64) -> Result<RunSnapshot, RelayError> {
        let run = self
            .forge
            .run_details(run_id)
            .await
            .map_err(|e| RelayError::PollError(e.to_string()))?;

        debug!(run_id, status = %run.status, "Run polled");
        Ok(run.into())
    }
}
