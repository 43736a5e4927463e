//! Subscription registration with the notification service.
//!
//! A subscription is an external record matching events against a
//! predicate and forwarding matches to a target endpoint; the service
//! owns it, this client only registers it.

use std::time::Duration;

use dispatchd_core::predicate::Predicate;
use serde_json::{json, Value};

use crate::config::PlatformConfig;
use crate::PlatformError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin client for the event-match subscription endpoint.
pub struct SubscriptionClient {
    client: reqwest::Client,
    config: PlatformConfig,
}

impl SubscriptionClient {
    pub fn new(config: PlatformConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, config }
    }

    /// Register a subscription forwarding matching events to `target_url`.
    ///
    /// The predicate is compiled locally first so a malformed expression
    /// is rejected before any network call. Returns the service-assigned
    /// subscription id.
    pub async fn register(
        &self,
        predicate_src: &str,
        target_url: &str,
    ) -> Result<String, PlatformError> {
        let predicate = Predicate::compile(predicate_src)?;

        let url = format!("{}/eventmatch", self.config.subscription_url);
        let body = json!({
            "jsonpath": predicate.source(),
            "target_url": target_url,
        });

        let response = self
            .config
            .auth
            .apply(self.client.post(&url).json(&body))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PlatformError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let reply: Value = response.json().await?;
        let uuid = reply
            .get("uuid")
            .and_then(Value::as_str)
            .ok_or_else(|| PlatformError::InvalidResponse {
                url,
                detail: "missing `uuid`".into(),
            })?
            .to_string();

        tracing::info!(subscription = %uuid, target_url, "Registered event subscription");
        Ok(uuid)
    }
}
