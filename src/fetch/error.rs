//! Error types for attachment downloads.

use thiserror::Error;

/// Errors that can occur while fetching attachment bytes.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The background fetch task panicked or was cancelled.
    #[error("fetch task for {url} did not complete: {reason}")]
    TaskFailed {
        /// The URL the task was fetching.
        url: String,
        /// Join error description.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a task failure error from a join error.
    pub fn task_failed(url: impl Into<String>, join_error: &tokio::task::JoinError) -> Self {
        Self::TaskFailed {
            url: url.into(),
            reason: join_error.to_string(),
        }
    }

    /// True for failures a caller may reasonably retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::TaskFailed { .. } | Self::Client { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message() {
        let err = DownloadError::http_status("http://r4d.dfid.gov.uk/a.pdf", 404);
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("http://r4d.dfid.gov.uk/a.pdf"));
    }

    #[test]
    fn test_timeout_message() {
        let err = DownloadError::timeout("http://r4d.dfid.gov.uk/a.pdf");
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_is_transient() {
        assert!(DownloadError::timeout("u").is_transient());
        assert!(DownloadError::http_status("u", 503).is_transient());
        assert!(DownloadError::http_status("u", 429).is_transient());
        assert!(!DownloadError::http_status("u", 404).is_transient());
    }
}
