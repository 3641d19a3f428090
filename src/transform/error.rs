//! Error types for document and attachment transformation.

use thiserror::Error;

use crate::assets::AssetError;
use crate::fetch::DownloadError;

/// Maximum attachment URL length to accept.
pub const MAX_URL_LENGTH: usize = 2000;

/// Errors raised by [`crate::transform::Attachment`].
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// URL is malformed or uses unsupported scheme
    #[error("invalid attachment URL '{url}': {reason}\n  Suggestion: {suggestion}")]
    InvalidUrl {
        /// The URL that failed validation
        url: String,
        /// Why the URL is invalid
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// Fetching or serializing an attachment that lives off the authoritative host.
    #[error("attachment {url} is externally hosted, cannot be downloaded")]
    ExternalLink {
        /// Original URL of the attachment.
        url: String,
    },

    /// Reading the stored asset before the save step.
    #[error("attachment {url} has no stored asset: save step has not been run")]
    NotSaved {
        /// Original URL of the attachment.
        url: String,
    },

    /// Download of the attachment bytes failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The asset store refused or failed the upload.
    #[error(transparent)]
    Store(#[from] AssetError),
}

impl AttachmentError {
    /// Creates an `InvalidUrl` error for a non-web URL scheme.
    #[must_use]
    pub fn unsupported_scheme(url: &str, scheme: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: format!("scheme '{scheme}' is not supported"),
            suggestion: "Attachments must be http:// or https:// URLs".to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for a malformed URL.
    #[must_use]
    pub fn malformed(url: &str, parse_error: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: parse_error.to_string(),
            suggestion: "Check the uris field of the source record".to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for a URL without a host.
    #[must_use]
    pub fn no_host(url: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no host".to_string(),
            suggestion: "Ensure the URL includes a domain (e.g., r4d.dfid.gov.uk)".to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for URLs exceeding [`MAX_URL_LENGTH`].
    #[must_use]
    pub fn too_long(url: &str) -> Self {
        let preview: String = url.chars().take(50).collect();
        Self::InvalidUrl {
            url: format!("{preview}..."),
            reason: format!("URL too long ({} chars, max {MAX_URL_LENGTH})", url.len()),
            suggestion: "Check for extraneous content in the uris field".to_string(),
        }
    }
}

/// Errors raised while assembling a [`crate::transform::Document`].
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A field every research output must carry is unbound.
    #[error("source record has no '{field}' field")]
    MissingField {
        /// Name of the missing variable.
        field: &'static str,
    },

    /// The date field is not an ISO 8601 timestamp.
    #[error("invalid date '{value}': {reason}")]
    InvalidDate {
        /// The raw date value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The output URI cannot be parsed.
    #[error("invalid output URL '{url}': {reason}")]
    InvalidOutputUrl {
        /// The raw output URI.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// An attachment failed to classify, fetch, or serialize.
    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    /// The details hash could not be converted to JSON.
    #[error("failed to serialize document details: {0}")]
    Serialize(#[from] serde_json::Error),
}
