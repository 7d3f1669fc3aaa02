use crate::state::AppState;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use pylon_core::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0
            .downcast_ref::<PublishError>()
            .map(|publish_err| match publish_err {
                PublishError::InvalidConfig(_) => (StatusCode::BAD_REQUEST, publish_err.to_string()),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, publish_err.to_string()),
            })
            .unwrap_or_else(|| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal Server Error: {}", self.0),
                )
            })
            .into_response()
    }
}

#[derive(Serialize)]
pub struct StaticPrefix {
    pub ready: bool,
    pub prefix: String,
}

/// GET /static-prefix
///
/// What asset links should be prefixed with. Empty means "serve from origin".
pub async fn static_prefix(State(state): State<AppState>) -> Json<StaticPrefix> {
    let current = state.publisher.state();
    Json(StaticPrefix {
        ready: current.is_ready(),
        prefix: current.static_prefix().to_string(),
    })
}

/// GET /status
pub async fn status(State(state): State<AppState>) -> Json<PublishState> {
    Json(state.publisher.state().as_ref().clone())
}

#[derive(Serialize)]
pub struct Scheduled {
    pub ticket: u64,
}

/// PUT /config
///
/// Replaces the configuration and schedules a pass. Does not wait for it.
pub async fn update_config(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if !state.accept_config {
        warn!("Rejected configuration update, updates are disabled");
        return Ok((StatusCode::FORBIDDEN, "Configuration updates are disabled").into_response());
    }

    let config = PublishConfig::from_json(&body)?;
    info!(bucket = %config.bucket_name, prefix = %config.object_key_prefix, "Configuration received");
    let ticket = state.publisher.update_config(config);

    Ok((StatusCode::ACCEPTED, Json(Scheduled { ticket })).into_response())
}
