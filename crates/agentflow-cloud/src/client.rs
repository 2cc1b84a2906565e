//! Authenticated HTTP transport
//!
//! The client is deliberately dumb: one request in, status and body out.
//! Retries and status-code interpretation belong to the resource managers.
//! Timeouts are treated exactly like any other transport failure.

use crate::error::{CloudError, Result};
use agentflow_core::Settings;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub use reqwest::Method;

/// Raw response from the resource API.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body as text, for error surfaces.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Generic authenticated transport against a resource's REST endpoint.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn send(&self, method: Method, endpoint: &str, body: Option<Value>)
    -> Result<ApiResponse>;
}

/// reqwest-backed client with bearer-token auth and a bounded per-request
/// timeout.
pub struct HttpResourceClient {
    client: reqwest::Client,
    access_token: String,
}

impl HttpResourceClient {
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CloudError::Configuration(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            client,
            access_token: access_token.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.access_token.clone(), settings.api_timeout)
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        let mut request = self
            .client
            .request(method, endpoint)
            .bearer_auth(&self.access_token);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| CloudError::Transport {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CloudError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(%status, endpoint, "resource API call");
        Ok(ApiResponse {
            status,
            body: bytes.to_vec(),
        })
    }
}
