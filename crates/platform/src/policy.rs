//! Policy validation client.
//!
//! Before any upload, the proposed transaction metadata is posted to the
//! policy service, which answers `{"success": true}` when the records are
//! acceptable. A rejection fails the upload before anything is sent.

use std::time::Duration;

use serde_json::Value;

use crate::config::PlatformConfig;
use crate::PlatformError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin client for the policy validation endpoint.
pub struct PolicyClient {
    client: reqwest::Client,
    config: PlatformConfig,
}

impl PolicyClient {
    pub fn new(config: PlatformConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, config }
    }

    /// Validate transaction metadata records.
    ///
    /// Returns `Ok(())` only when the service answers 2xx with
    /// `"success": true`; any other outcome is an error.
    pub async fn validate(&self, metadata: &[Value]) -> Result<(), PlatformError> {
        let url = format!("{}/ingest", self.config.policy_url);

        let response = self
            .config
            .auth
            .apply(self.client.post(&url).json(metadata))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PlatformError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let reply: Value = response.json().await?;
        if reply.get("success").and_then(Value::as_bool) != Some(true) {
            let message = reply
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no reason given")
                .to_string();
            return Err(PlatformError::PolicyRejected(message));
        }

        Ok(())
    }
}
