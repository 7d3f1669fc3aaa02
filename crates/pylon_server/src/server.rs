use crate::{api, state::AppState};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, put},
};
use pylon_publisher::publisher::PublisherHandle;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Configuration documents are a handful of fields.
const CONFIG_BODY_LIMIT: usize = 64 * 1024;

/// The builder for the pylon admin server.
#[derive(Clone, Debug, Default)]
pub struct PylonServer {
    config: PylonServerConfig,
}

impl PylonServer {
    pub fn new(config: PylonServerConfig) -> Self {
        Self { config }
    }
}

#[derive(Clone, Debug)]
pub struct PylonServerConfig {
    /// Whether `PUT /config` may replace the publisher configuration.
    ///
    /// Defaults to `true`.
    pub accept_config: bool,
}

impl Default for PylonServerConfig {
    fn default() -> Self {
        Self {
            accept_config: true,
        }
    }
}

impl PylonServer {
    pub fn build(self, publisher: PublisherHandle) -> Router {
        let PylonServerConfig { accept_config } = self.config;
        if !accept_config {
            warn!("Configuration updates disabled, PUT /config will be refused");
        }
        let state = AppState {
            publisher,
            accept_config,
        };

        Router::new()
            .route("/health", get(|| async { "OK" }))
            .route("/static-prefix", get(api::static_prefix))
            .route("/status", get(api::status))
            .route("/config", put(api::update_config))
            .layer(DefaultBodyLimit::max(CONFIG_BODY_LIMIT))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
