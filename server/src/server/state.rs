//! Server state

use std::sync::Arc;

use crate::dispatch::dispatcher::Dispatcher;
use crate::forge::api::ForgeApi;
use crate::stream::session;

/// Server state shared across handlers
pub struct ServerState {
    pub forge: Arc<dyn ForgeApi>,
    pub dispatcher: Dispatcher,
    pub relay_options: session::Options,
}

impl ServerState {
    pub fn new(
        forge: Arc<dyn ForgeApi>,
        dispatcher: Dispatcher,
        relay_options: session::Options,
    ) -> Self {
        Self {
            forge,
            dispatcher,
            relay_options,
        }
    }
}
