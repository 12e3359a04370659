//! HTTP request handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;
use uuid::Uuid;

use crate::errors::RelayError;
use crate::models::deployment::DeploymentRequest;
use crate::server::state::ServerState;
use crate::stream::session;
use crate::utils::version_info;

/// JSON error body returned by failing handlers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// API-facing error wrapper mapping [`RelayError`] onto status codes
pub struct ApiError(RelayError);

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            RelayError::ValidationError(_) => StatusCode::BAD_REQUEST,
            RelayError::DispatchError(_) | RelayError::DiscoveryError(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "stackpilot".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Deploy response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub message: String,
    pub run_id: u64,
}

/// Deploy handler: trigger the provisioning workflow and resolve its run id
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DeploymentRequest>,
) -> Result<Json<DeployResponse>, ApiError> {
    if request.user_id.is_empty() {
        return Err(RelayError::ValidationError("userId is required".to_string()).into());
    }

    let handle = state.dispatcher.dispatch(&request).await?;

    Ok(Json(DeployResponse {
        message: "Deployment triggered".to_string(),
        run_id: handle.run_id,
    }))
}

/// Query parameters for the log stream endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStreamQuery {
    pub run_id: u64,
}

/// Log stream handler: open an SSE session relaying one run's events
pub async fn logs_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<LogStreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4();
    info!(%session_id, run_id = query.run_id, "Opening log stream");

    let (tx, rx) = mpsc::channel(32);
    let forge = state.forge.clone();
    let options = state.relay_options.clone();
    tokio::spawn(async move {
        session::run(&options, forge, query.run_id, tx).await;
    });

    let stream = ReceiverStream::new(rx).map(|event| Ok(event.to_sse_event()));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
