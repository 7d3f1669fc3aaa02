use pylon_core::prelude::*;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Upper bound for a single read-back request.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client used for read-back requests.
pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!("Cannot build HTTP client with timeout, using defaults: {e}");
            Client::new()
        })
}

/// Reads a freshly uploaded object back through the public CDN URL.
#[derive(Clone, Debug)]
pub struct AvailabilityVerifier {
    client: Client,
    visit_url_prefix: String,
}

impl AvailabilityVerifier {
    pub fn new(client: Client, visit_url_prefix: impl Into<String>) -> Self {
        Self {
            client,
            visit_url_prefix: visit_url_prefix.into(),
        }
    }

    pub fn url(&self, key: &str) -> String {
        format!("{}{key}", self.visit_url_prefix)
    }

    /// One unauthenticated GET. Only `200 OK` counts, there is no retry.
    pub async fn verify(&self, key: &str) -> Result<(), PublishError> {
        let url = self.url(key);

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(%url, "CDN check failed: {e}");
            PublishError::Verification {
                url: url.clone(),
                status: None,
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(%url, %status, "CDN check failed");
            return Err(PublishError::Verification {
                url,
                status: Some(status.as_u16()),
                reason: format!("failed to get object, {status}"),
            });
        }

        debug!(%url, "Object is available");
        Ok(())
    }
}
