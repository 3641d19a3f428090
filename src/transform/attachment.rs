//! Attachments referenced by a research output.
//!
//! An attachment is either hosted on the authoritative R4D host, in which case
//! its bytes are downloaded and re-hosted by the asset store, or external, in
//! which case it is only ever linked to.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use super::error::{AttachmentError, MAX_URL_LENGTH};
use super::filename::{content_type_for_filename, filename_from_url};
use super::hosts::url_on_host;
use crate::assets::{AssetResponse, AssetStore};
use crate::fetch::{AttachmentFetcher, FetchTask};

/// Where an attachment lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// On the authoritative host; downloadable and inlined in the body.
    Hosted,
    /// Anywhere else; rendered as a plain link.
    External,
}

/// Whether the asset store has accepted the file yet.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AssetState {
    Unsaved,
    Saved {
        file_url: String,
        saved_at: DateTime<Utc>,
    },
}

/// One URL from a record's `uris` field.
#[derive(Debug, Clone)]
pub struct Attachment {
    content_id: Uuid,
    original_url: String,
    url: Url,
    filename: String,
    classification: Classification,
    state: AssetState,
}

/// Serialized form of a hosted, saved attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentJson {
    /// URL assigned by the asset store.
    pub url: String,
    /// The attachment's filename.
    pub title: String,
    /// MIME type guessed from the filename, if known.
    pub content_type: Option<&'static str>,
    /// RFC 3339 timestamp of the save.
    pub updated_at: String,
    /// RFC 3339 timestamp of the save.
    pub created_at: String,
    /// Stable attachment identifier.
    pub content_id: Uuid,
}

impl Attachment {
    /// Validates `raw` and classifies it against `authoritative_host`.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::InvalidUrl`] for overlong, unparseable,
    /// non-HTTP(S) or host-less URLs.
    pub fn new(raw: &str, authoritative_host: &str) -> Result<Self, AttachmentError> {
        let raw = raw.trim();
        if raw.len() > MAX_URL_LENGTH {
            return Err(AttachmentError::too_long(raw));
        }

        let url = Url::parse(raw).map_err(|e| AttachmentError::malformed(raw, &e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(AttachmentError::unsupported_scheme(raw, scheme)),
        }

        if url.host().is_none() {
            return Err(AttachmentError::no_host(raw));
        }

        let classification = if url_on_host(&url, authoritative_host) {
            Classification::Hosted
        } else {
            Classification::External
        };

        Ok(Self {
            content_id: Uuid::new_v4(),
            original_url: raw.to_string(),
            filename: filename_from_url(&url),
            url,
            classification,
            state: AssetState::Unsaved,
        })
    }

    /// Stable identifier, generated at construction.
    #[must_use]
    pub fn content_id(&self) -> Uuid {
        self.content_id
    }

    /// The URL as it appeared in the source record.
    #[must_use]
    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    /// The parsed URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Last path segment of the URL.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn classification(&self) -> Classification {
        self.classification
    }

    #[must_use]
    pub fn is_hosted(&self) -> bool {
        self.classification == Classification::Hosted
    }

    /// Markdown for this attachment inside a list of links.
    #[must_use]
    pub fn snippet(&self) -> String {
        match self.classification {
            Classification::Hosted => format!("[InlineAttachment:{}]", self.filename),
            Classification::External => format!("[{}]({})", self.filename, self.original_url),
        }
    }

    /// Starts downloading the attachment in the background.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::ExternalLink`] for external attachments.
    pub fn start_fetch(
        &self,
        fetcher: Arc<dyn AttachmentFetcher>,
    ) -> Result<FetchTask, AttachmentError> {
        if !self.is_hosted() {
            return Err(AttachmentError::ExternalLink {
                url: self.original_url.clone(),
            });
        }
        Ok(FetchTask::spawn(fetcher, self.url.as_str()))
    }

    /// Downloads the attachment and uploads it to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::ExternalLink`] for external attachments, or
    /// the download or store failure.
    pub async fn save_to(
        &mut self,
        fetcher: Arc<dyn AttachmentFetcher>,
        store: &dyn AssetStore,
    ) -> Result<(), AttachmentError> {
        let bytes = self.start_fetch(fetcher)?.bytes().await?;
        self.store_bytes(bytes, store).await
    }

    /// Uploads already-fetched bytes to `store` and records the result.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::Store`] if the store fails.
    #[instrument(skip(self, bytes, store), fields(filename = %self.filename, bytes = bytes.len()))]
    pub async fn store_bytes(
        &mut self,
        bytes: Vec<u8>,
        store: &dyn AssetStore,
    ) -> Result<(), AttachmentError> {
        let response = store.store(&self.filename, bytes).await?;
        self.mark_saved(response);
        Ok(())
    }

    /// Records the asset store's response. Saving again overwrites it.
    pub fn mark_saved(&mut self, response: AssetResponse) {
        debug!(url = %self.original_url, file_url = %response.file_url, "attachment saved");
        self.state = AssetState::Saved {
            file_url: response.file_url,
            saved_at: Utc::now(),
        };
    }

    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self.state, AssetState::Saved { .. })
    }

    /// URL assigned by the asset store.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::NotSaved`] before the save step.
    pub fn asset_url(&self) -> Result<&str, AttachmentError> {
        match &self.state {
            AssetState::Saved { file_url, .. } => Ok(file_url),
            AssetState::Unsaved => Err(AttachmentError::NotSaved {
                url: self.original_url.clone(),
            }),
        }
    }

    /// Markdown link to the stored asset.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::NotSaved`] before the save step.
    pub fn link_to_asset(&self) -> Result<String, AttachmentError> {
        Ok(format!("[{}]({})", self.filename, self.asset_url()?))
    }

    /// Attachment entry for the publishing payload.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::ExternalLink`] for external attachments and
    /// [`AttachmentError::NotSaved`] for hosted ones not yet saved.
    pub fn to_json(&self) -> Result<AttachmentJson, AttachmentError> {
        if !self.is_hosted() {
            return Err(AttachmentError::ExternalLink {
                url: self.original_url.clone(),
            });
        }
        let AssetState::Saved { file_url, saved_at } = &self.state else {
            return Err(AttachmentError::NotSaved {
                url: self.original_url.clone(),
            });
        };

        let timestamp = saved_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        Ok(AttachmentJson {
            url: file_url.clone(),
            title: self.filename.clone(),
            content_type: content_type_for_filename(&self.filename),
            updated_at: timestamp.clone(),
            created_at: timestamp,
            content_id: self.content_id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const R4D: &str = "r4d.dfid.gov.uk";

    fn saved(url: &str) -> AssetResponse {
        AssetResponse {
            file_url: url.to_string(),
        }
    }

    #[test]
    fn test_new_classifies_by_host() {
        let hosted = Attachment::new("http://r4d.dfid.gov.uk/pdfs/some.pdf", R4D).unwrap();
        let external = Attachment::new("http://example.com/offsite.pdf", R4D).unwrap();
        assert_eq!(hosted.classification(), Classification::Hosted);
        assert_eq!(external.classification(), Classification::External);
        assert_eq!(hosted.filename(), "some.pdf");
    }

    #[test]
    fn test_new_rejects_non_http_urls() {
        let err = Attachment::new("ftp://r4d.dfid.gov.uk/some.pdf", R4D).unwrap_err();
        assert!(matches!(err, AttachmentError::InvalidUrl { .. }));
        let err = Attachment::new("some.pdf", R4D).unwrap_err();
        assert!(matches!(err, AttachmentError::InvalidUrl { .. }));
    }

    #[test]
    fn test_content_id_is_stable() {
        let attachment = Attachment::new("http://r4d.dfid.gov.uk/a.pdf", R4D).unwrap();
        assert_eq!(attachment.content_id(), attachment.content_id());
    }

    #[test]
    fn test_snippet() {
        let hosted = Attachment::new("http://r4d.dfid.gov.uk/pdfs/some.pdf", R4D).unwrap();
        let external = Attachment::new("http://example.com/offsite.pdf", R4D).unwrap();
        assert_eq!(hosted.snippet(), "[InlineAttachment:some.pdf]");
        assert_eq!(
            external.snippet(),
            "[offsite.pdf](http://example.com/offsite.pdf)"
        );
    }

    #[test]
    fn test_asset_url_before_save_is_an_error() {
        let attachment = Attachment::new("http://r4d.dfid.gov.uk/a.pdf", R4D).unwrap();
        assert!(matches!(
            attachment.asset_url(),
            Err(AttachmentError::NotSaved { .. })
        ));
        assert!(attachment.link_to_asset().is_err());
    }

    #[test]
    fn test_mark_saved_twice_overwrites() {
        let mut attachment = Attachment::new("http://r4d.dfid.gov.uk/a.pdf", R4D).unwrap();
        attachment.mark_saved(saved("http://asset.one"));
        attachment.mark_saved(saved("http://asset.two"));
        assert_eq!(attachment.asset_url().unwrap(), "http://asset.two");
        assert_eq!(attachment.link_to_asset().unwrap(), "[a.pdf](http://asset.two)");
    }

    #[test]
    fn test_to_json_for_saved_hosted_attachment() {
        let mut attachment = Attachment::new("http://r4d.dfid.gov.uk/pdfs/some.pdf", R4D).unwrap();
        attachment.mark_saved(saved("http://asset.url"));

        let json = attachment.to_json().unwrap();
        assert_eq!(json.url, "http://asset.url");
        assert_eq!(json.title, "some.pdf");
        assert_eq!(json.content_type, Some("application/pdf"));
        assert_eq!(json.content_id, attachment.content_id());
        assert!(json.created_at.ends_with('Z'));
    }

    #[test]
    fn test_to_json_for_external_attachment_is_an_error() {
        let attachment = Attachment::new("http://example.com/offsite.pdf", R4D).unwrap();
        assert!(matches!(
            attachment.to_json(),
            Err(AttachmentError::ExternalLink { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_fetch_for_external_attachment_is_an_error() {
        struct Unreachable;

        #[async_trait::async_trait]
        impl AttachmentFetcher for Unreachable {
            async fn fetch(&self, url: &str) -> Result<Vec<u8>, crate::fetch::DownloadError> {
                Err(crate::fetch::DownloadError::timeout(url))
            }
        }

        let attachment = Attachment::new("http://example.com/offsite.pdf", R4D).unwrap();
        let err = attachment.start_fetch(Arc::new(Unreachable)).unwrap_err();
        assert!(matches!(err, AttachmentError::ExternalLink { .. }));
    }
}
