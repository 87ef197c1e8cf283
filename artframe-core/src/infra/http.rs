use std::{fmt, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::error::{AssetError, Result};

const USER_AGENT: &str = concat!("artframe/", env!("CARGO_PKG_VERSION"));

/// Network-level failure (DNS, TLS, connect, timeout, truncated body).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// A fully buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
    /// Full response body.
    pub body: Vec<u8>,
}

impl FetchedResponse {
    /// Any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound GET port used for both the catalog document and image bytes.
#[async_trait]
pub trait HttpFetcher: Send + Sync + fmt::Debug {
    /// GET `url` with the given `Accept` header and buffer the body.
    ///
    /// Non-2xx statuses are returned as responses; only transport failures
    /// are errors.
    async fn get(
        &self,
        url: &str,
        accept: &str,
    ) -> std::result::Result<FetchedResponse, TransportError>;
}

/// [`HttpFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Builds a client with a per-request `timeout` and the crate user agent.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                AssetError::Internal(format!(
                    "Failed to create HTTP client: {e}"
                ))
            })?;
        Ok(Self { client })
    }

    /// Wraps an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(
        &self,
        url: &str,
        accept: &str,
    ) -> std::result::Result<FetchedResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(e.to_string()))?
            .to_vec();

        debug!(
            "GET {} -> status={}, content_type={:?}, bytes={}",
            url,
            status,
            content_type,
            body.len()
        );

        Ok(FetchedResponse {
            status,
            content_type,
            body,
        })
    }
}
