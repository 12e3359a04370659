//! Application configuration options

use std::time::Duration;

use crate::dispatch::dispatcher;
use crate::settings::{ForgeSettings, Settings};
use crate::stream::session;

/// Main application options
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// HTTP server configuration
    pub server: ServerOptions,

    /// Forge API configuration
    pub forge: ForgeSettings,

    /// Dispatcher options
    pub dispatcher: dispatcher::Options,

    /// Relay session options
    pub relay: session::Options,
}

impl AppOptions {
    /// Build application options from loaded settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            forge: settings.forge.clone(),
            dispatcher: dispatcher::Options {
                git_ref: settings.forge.git_ref.clone(),
                discovery_attempts: settings.discovery.attempts,
                discovery_interval: Duration::from_secs(settings.discovery.interval_secs),
                list_window: settings.discovery.list_window,
            },
            relay: session::Options {
                poll_interval: Duration::from_secs(settings.relay.poll_interval_secs),
                max_attempts: settings.relay.max_attempts,
            },
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
