//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::dispatch::dispatcher::Dispatcher;
use crate::errors::RelayError;
use crate::forge::client::ForgeClient;
use crate::server::serve::serve;
use crate::server::state::ServerState;

/// Run the StackPilot server
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), RelayError> {
    info!("Initializing StackPilot server...");

    let forge = Arc::new(ForgeClient::new(&options.forge)?);
    let dispatcher = Dispatcher::new(forge.clone(), options.dispatcher.clone());
    let state = Arc::new(ServerState::new(
        forge,
        dispatcher,
        options.relay.clone(),
    ));

    let handle = serve(&options.server, state, shutdown_signal).await?;
    handle
        .await
        .map_err(|e| RelayError::ServerError(e.to_string()))??;

    info!("Shutdown complete");
    Ok(())
}
