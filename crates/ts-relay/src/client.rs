use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::de::DeserializeOwned;
use tracing::debug;
use ts_core::config::RelayConfig;
use ts_core::types::{Payload, Status};

use crate::error::RelayError;
use crate::reply::Reply;

const STATUS_PATH: &str = "/status";
const PAYLOAD_PATH: &str = "/payload";
const HEARTBEAT_PATH: &str = "/ext-heartbeat";
const CLEAR_PATH: &str = "/clear";

// ---------------------------------------------------------------------------
// Relay trait
// ---------------------------------------------------------------------------

/// The four relay operations the agent depends on.
///
/// Implementations must never fail: every error is folded into the
/// returned [`Reply`].
#[async_trait]
pub trait Relay: Send + Sync {
    /// Current signal; a failed fetch reads as "no signal".
    async fn fetch_status(&self) -> Reply<Status>;

    /// Battery telemetry; a failed fetch reads as all-unknown.
    async fn fetch_payload(&self) -> Reply<Payload>;

    /// Versioned liveness ping. The response is not consulted.
    async fn send_heartbeat(&self, version: &str) -> Reply<()>;

    /// Tell the relay a prompt was shown so it stops asserting the signal.
    async fn send_clear(&self) -> Reply<()>;
}

// ---------------------------------------------------------------------------
// RelayClient
// ---------------------------------------------------------------------------

/// HTTP implementation of [`Relay`] against a fixed local origin.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    /// Create a client with reqwest's default transport settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize(base_url.into()),
        }
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: normalize(base_url.into()),
        })
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        Self::with_timeout(config.base_url.clone(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET` a JSON document, bypassing any intermediate cache.
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, RelayError> {
        let resp = self
            .client
            .get(self.url(endpoint))
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(RelayError::Status {
                endpoint,
                status: resp.status().as_u16(),
            });
        }

        resp.json::<T>().await.map_err(|e| RelayError::Parse {
            endpoint,
            message: e.to_string(),
        })
    }

    /// `POST`, optionally with a JSON body. Only the status line is read.
    async fn post(
        &self,
        endpoint: &'static str,
        body: Option<serde_json::Value>,
    ) -> Result<(), RelayError> {
        let mut req = self.client.post(self.url(endpoint));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(RelayError::Status {
                endpoint,
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}

fn normalize(base_url: String) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

#[async_trait]
impl Relay for RelayClient {
    async fn fetch_status(&self) -> Reply<Status> {
        let reply = Reply::from_result(self.get_json::<Status>(STATUS_PATH).await);
        if let Some(e) = reply.error() {
            debug!(error = %e, "relay status unavailable, treating as no signal");
        }
        reply
    }

    async fn fetch_payload(&self) -> Reply<Payload> {
        let reply = Reply::from_result(self.get_json::<Payload>(PAYLOAD_PATH).await);
        if let Some(e) = reply.error() {
            debug!(error = %e, "relay payload unavailable, rendering unknown readings");
        }
        reply
    }

    async fn send_heartbeat(&self, version: &str) -> Reply<()> {
        let body = serde_json::json!({ "version": version });
        let reply = Reply::from_result(self.post(HEARTBEAT_PATH, Some(body)).await);
        if let Some(e) = reply.error() {
            debug!(error = %e, "heartbeat not delivered");
        }
        reply
    }

    async fn send_clear(&self) -> Reply<()> {
        let reply = Reply::from_result(self.post(CLEAR_PATH, None).await);
        if let Some(e) = reply.error() {
            debug!(error = %e, "relay clear not delivered");
        }
        reply
    }
}
