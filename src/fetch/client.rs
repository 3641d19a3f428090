//! HTTP fetcher for hosted attachment bytes.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, instrument};

use super::error::DownloadError;
use crate::config::DEFAULT_CONNECT_TIMEOUT_SECS;

/// User-Agent sent with every attachment request.
pub const USER_AGENT: &str = concat!("dfid-transition/", env!("CARGO_PKG_VERSION"));

/// Source of attachment bytes.
///
/// The production implementation is [`HttpFetcher`]; tests substitute
/// in-memory fetchers.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    /// Fetches the full body at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// HTTP client for downloading attachments into memory.
///
/// This client is designed to be created once and shared across documents,
/// taking advantage of connection pooling.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_connect_timeout(DEFAULT_CONNECT_TIMEOUT_SECS)
    }

    /// Creates a fetcher with an explicit connect timeout.
    ///
    /// There is deliberately no overall request timeout: callers that need
    /// bounded latency wrap the fetch in `tokio::time::timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the HTTP client cannot be built.
    pub fn with_connect_timeout(connect_timeout_secs: u64) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|source| DownloadError::Client { source })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AttachmentFetcher for HttpFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let capacity = response
            .content_length()
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or_default();
        let mut body = Vec::with_capacity(capacity);
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;
            body.extend_from_slice(&chunk);
        }

        debug!(bytes = body.len(), "attachment downloaded");
        Ok(body)
    }
}
