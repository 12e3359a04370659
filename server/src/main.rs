//! StackPilot Server - Entry Point
//!
//! Backend core of the self-service provisioning portal. Dispatches
//! infrastructure workflow runs on the remote CI forge and relays their
//! live logs to the portal over SSE.

use std::collections::HashMap;
use std::env;

use stackpilot::app::options::AppOptions;
use stackpilot::app::run::run;
use stackpilot::logs::{init_logging, LogOptions};
use stackpilot::settings::Settings;
use stackpilot::utils::version_info;

use tracing::{error, info};

/// Default settings file path
const DEFAULT_SETTINGS_PATH: &str = "stackpilot.json";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    // Retrieve the settings file
    let settings_path = cli_args
        .get("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_SETTINGS_PATH);
    let settings = match Settings::load(settings_path).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to load settings from {}: {}", settings_path, e);
            return;
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    // Run the server
    let options = AppOptions::from_settings(&settings);
    info!("Running StackPilot server v{}", version.version);
    let result = run(options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the server: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
