//! Forge HTTP client implementation

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::errors::RelayError;
use crate::forge::api::ForgeApi;
use crate::models::run::WorkflowRun;
use crate::settings::ForgeSettings;

/// Accept header for the forge REST API
const API_ACCEPT: &str = "application/vnd.github.v3+json";

/// HTTP client for the remote CI forge
pub struct ForgeClient {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    workflow_file: String,
    token: SecretString,
}

impl ForgeClient {
    /// Create a new forge client from settings
    pub fn new(settings: &ForgeSettings) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let token = settings
            .token
            .clone()
            .ok_or_else(|| RelayError::ConfigError("forge token not configured".to_string()))?;

        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            owner: settings.owner.clone(),
            repo: settings.repo.clone(),
            workflow_file: settings.workflow_file.clone(),
            token,
        })
    }

    fn workflow_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/actions/workflows/{}/{}",
            self.api_base, self.owner, self.repo, self.workflow_file, suffix
        )
    }

    /// Make a GET request against the forge API
    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, RelayError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header(header::ACCEPT, API_ACCEPT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Forge GET failed: {} - {}", status, body);
            return Err(RelayError::ForgeError(format!("{}: {}", status, body)));
        }

        let body = response.json().await?;
        Ok(body)
    }
}

/// Response wrapper for the run listing endpoint
#[derive(Debug, Clone, serde::Deserialize)]
struct WorkflowRunsResponse {
    workflow_runs: Vec<WorkflowRun>,
}

#[async_trait]
impl ForgeApi for ForgeClient {
    async fn dispatch_workflow(
        &self,
        git_ref: &str,
        inputs: &BTreeMap<String, String>,
    ) -> Result<(), RelayError> {
        let url = self.workflow_url("dispatches");
        debug!("POST {} (workflow dispatch)", url);

        let body = serde_json::json!({
            "ref": git_ref,
            "inputs": inputs,
        });

        let response = self
            .client
            .post(&url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header(header::ACCEPT, API_ACCEPT)
            .json(&body)
            .send()
            .await?;

        // The dispatch endpoint acknowledges with 204 and no body
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Workflow dispatch failed: {} - {}", status, body);
            return Err(RelayError::ForgeError(format!("{}: {}", status, body)));
        }

        Ok(())
    }

    async fn list_recent_runs(&self, limit: usize) -> Result<Vec<WorkflowRun>, RelayError> {
        let url = format!("{}?per_page={}", self.workflow_url("runs"), limit);
        let response: WorkflowRunsResponse = self.get(&url).await?;
        Ok(response.workflow_runs)
    }

    async fn run_details(&self, run_id: u64) -> Result<WorkflowRun, RelayError> {
        let url = format!(
            "{}/repos/{}/{}/actions/runs/{}",
            self.api_base, self.owner, self.repo, run_id
        );
        self.get(&url).await
    }

    async fn fetch_log_archive(&self, archive_url: &str) -> Result<Vec<u8>, RelayError> {
        debug!("GET {} (log archive)", archive_url);

        let response = self
            .client
            .get(archive_url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            debug!("Log archive fetch returned {}", status);
            return Err(RelayError::ForgeError(format!(
                "log archive fetch failed: {}",
                status
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
