//! Settings file management

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::RelayError;
use crate::logs::LogLevel;

/// Environment variable holding the forge API token
pub const FORGE_TOKEN_ENV: &str = "FORGE_TOKEN";

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Forge (remote CI) configuration
    #[serde(default)]
    pub forge: ForgeSettings,

    /// Log relay configuration
    #[serde(default)]
    pub relay: RelaySettings,

    /// Run discovery configuration
    #[serde(default)]
    pub discovery: DiscoverySettings,
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults when the
    /// file does not exist. The forge token is overridden from the
    /// environment when `FORGE_TOKEN` is set.
    pub async fn load(path: &str) -> Result<Self, RelayError> {
        let mut settings = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice::<Settings>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => return Err(e.into()),
        };

        if let Ok(token) = std::env::var(FORGE_TOKEN_ENV) {
            settings.forge.token = Some(SecretString::from(token));
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), RelayError> {
        Url::parse(&self.forge.api_base)
            .map_err(|e| RelayError::ConfigError(format!("invalid forge api_base: {}", e)))?;

        if self.forge.token.is_none() {
            return Err(RelayError::ConfigError(format!(
                "forge token not configured (set {} or forge.token)",
                FORGE_TOKEN_ENV
            )));
        }

        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Forge API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeSettings {
    /// Base URL for the forge REST API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Repository owner
    #[serde(default)]
    pub owner: String,

    /// Repository name
    #[serde(default)]
    pub repo: String,

    /// Workflow file that provisions resources
    #[serde(default = "default_workflow_file")]
    pub workflow_file: String,

    /// Git ref the workflow is dispatched on
    #[serde(default = "default_git_ref")]
    pub git_ref: String,

    /// API token. Normally supplied via the `FORGE_TOKEN` environment
    /// variable; never serialized back out.
    #[serde(default, skip_serializing)]
    pub token: Option<SecretString>,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_workflow_file() -> String {
    "deploy.yml".to_string()
}

fn default_git_ref() -> String {
    "main".to_string()
}

impl Default for ForgeSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            owner: String::new(),
            repo: String::new(),
            workflow_file: default_workflow_file(),
            git_ref: default_git_ref(),
            token: None,
        }
    }
}

/// Log relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Seconds between status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Hard ceiling on polling attempts per session
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_poll_interval() -> u64 {
    4
}

fn default_max_attempts() -> u32 {
    580
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Run discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySettings {
    /// Maximum listing attempts while looking for the dispatched run
    #[serde(default = "default_discovery_attempts")]
    pub attempts: u32,

    /// Seconds between listing attempts
    #[serde(default = "default_discovery_interval")]
    pub interval_secs: u64,

    /// How many recent runs each listing attempt inspects
    #[serde(default = "default_list_window")]
    pub list_window: usize,
}

fn default_discovery_attempts() -> u32 {
    10
}

fn default_discovery_interval() -> u64 {
    2
}

fn default_list_window() -> usize {
    5
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            attempts: default_discovery_attempts(),
            interval_secs: default_discovery_interval(),
            list_window: default_list_window(),
        }
    }
}
