//! Research output assembly.
//!
//! A [`Document`] is built once from a query solution and then read many
//! times: body, outline, metadata, and the publishing payload are all derived
//! from the fields captured at construction.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use super::attachment::{Attachment, AttachmentJson};
use super::classifier::{classify, render_attachments};
use super::error::{AttachmentError, DocumentError};
use super::headers::{Header, extract_headers};
use super::hosts::{LegacyTarget, legacy_target, url_on_host};
use super::html::{collapse_whitespace, normalize_with, strip_tags, unescape_three_times};
use super::links::LinkRewriter;
use super::slug::slugify;
use super::source::FieldSource;
use crate::assets::AssetStore;
use crate::config::MigrationConfig;
use crate::fetch::AttachmentFetcher;

/// Document type of every migrated research output.
pub const DOCUMENT_TYPE: &str = "dfid_research_output";

/// Note attached to the single change-history entry.
pub const FIRST_PUBLISHED_NOTE: &str = "First published.";

/// Whether the output went through peer review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    PeerReviewed,
    NotPeerReviewed,
}

/// Facet values specific to research outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatSpecificMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dfid_document_type: Option<String>,
    pub dfid_theme: Vec<String>,
    pub country: Vec<String>,
    pub dfid_authors: Vec<String>,
    pub dfid_review_status: ReviewStatus,
    pub first_published_at: String,
    pub bulk_published: bool,
}

/// Format-specific metadata plus the document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub document_type: &'static str,
    #[serde(flatten)]
    pub format_specific: FormatSpecificMetadata,
}

/// An entry in the document's change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeNote {
    pub public_timestamp: String,
    pub note: &'static str,
}

/// A typed block of body content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyPart {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub content: String,
}

/// The `details` hash of the publishing payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Details {
    pub metadata: Metadata,
    pub change_history: Vec<ChangeNote>,
    pub attachments: Vec<AttachmentJson>,
    pub body: Vec<BodyPart>,
}

/// A summary of a document that needs no saved attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub content_id: Uuid,
    pub base_path: String,
    pub title: String,
    pub metadata: Metadata,
    pub body: String,
    pub headers: Vec<Header>,
}

/// A research output transformed for publishing.
#[derive(Debug, Clone)]
pub struct Document {
    content_id: Uuid,
    original_url: String,
    original_id: String,
    title: String,
    slug: String,
    disambiguated: bool,
    document_type: Option<String>,
    themes: Vec<String>,
    countries: Vec<String>,
    creators: Vec<String>,
    citation: String,
    peer_reviewed: bool,
    public_updated_at: String,
    first_published_at: String,
    abstract_markdown: String,
    attachments: Vec<Attachment>,
    base_path_prefix: String,
    organisations: Vec<String>,
}

impl Document {
    /// Assembles a document from a query solution.
    ///
    /// `output`, `title` and `date` are required; every other field is
    /// optional and defaults to empty.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] for missing required fields, an unparseable
    /// output URI or date, or a malformed attachment URL.
    #[instrument(skip(source, config))]
    pub fn from_source<S>(source: &S, config: &MigrationConfig) -> Result<Self, DocumentError>
    where
        S: FieldSource + ?Sized,
    {
        let output = required(source, "output")?;
        let (original_url, original_id) = canonical_output(&output, config)?;

        let title = collapse_whitespace(&unescape_three_times(&required(source, "title")?));
        let slug = slugify(&title);

        let raw_date = required(source, "date")?;
        let timestamp = parse_timestamp(&raw_date)?;

        let rewriter = LinkRewriter::new(config);
        let abstract_markdown = normalize_with(&optional(source, "abstract"), |html| {
            rewriter.rewrite(html).into_owned()
        });

        let attachments = classify(&optional(source, "uris"), config)?;

        let document = Self {
            content_id: Uuid::new_v4(),
            original_url,
            original_id,
            title,
            slug,
            disambiguated: false,
            document_type: source
                .get("type")
                .and_then(|value| value.as_str().map(code_from_uri))
                .filter(|code| !code.is_empty()),
            themes: optional(source, "themes")
                .split_whitespace()
                .map(code_from_uri)
                .filter(|code| !code.is_empty())
                .collect(),
            countries: optional(source, "countryCodes")
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            creators: optional(source, "creators")
                .split('|')
                .map(str::trim)
                .filter(|creator| !creator.is_empty())
                .map(str::to_string)
                .collect(),
            citation: strip_tags(&unescape_three_times(&optional(source, "citation"))),
            peer_reviewed: source
                .get("peerReviewed")
                .and_then(|value| value.as_bool())
                .unwrap_or(false),
            public_updated_at: timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            first_published_at: timestamp.date_naive().format("%Y-%m-%d").to_string(),
            abstract_markdown,
            attachments,
            base_path_prefix: config.route_prefix.trim_end_matches('/').to_string(),
            organisations: vec![config.organisation_content_id.clone()],
        };

        debug!(
            slug = %document.slug,
            original_id = %document.original_id,
            attachments = document.attachments.len(),
            "document assembled"
        );
        Ok(document)
    }

    #[must_use]
    pub fn content_id(&self) -> Uuid {
        self.content_id
    }

    /// Replaces the generated content id, e.g. with one already published.
    pub fn set_content_id(&mut self, content_id: Uuid) {
        self.content_id = content_id;
    }

    /// Output page on the authoritative host.
    #[must_use]
    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    #[must_use]
    pub fn original_id(&self) -> &str {
        &self.original_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Always empty: R4D abstracts are too long to serve as summaries.
    #[must_use]
    pub fn summary(&self) -> &str {
        ""
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Appends `-<original_id>` to the slug. Only the first call has an effect.
    pub fn disambiguate(&mut self) {
        if self.disambiguated {
            return;
        }
        self.slug = format!("{}-{}", self.slug, self.original_id);
        self.disambiguated = true;
    }

    #[must_use]
    pub fn base_path(&self) -> String {
        format!("{}/{}", self.base_path_prefix, self.slug)
    }

    #[must_use]
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    #[must_use]
    pub fn themes(&self) -> &[String] {
        &self.themes
    }

    #[must_use]
    pub fn creators(&self) -> &[String] {
        &self.creators
    }

    #[must_use]
    pub fn citation(&self) -> &str {
        &self.citation
    }

    #[must_use]
    pub fn peer_reviewed(&self) -> bool {
        self.peer_reviewed
    }

    /// RFC 3339 timestamp of the source date.
    #[must_use]
    pub fn public_updated_at(&self) -> &str {
        &self.public_updated_at
    }

    /// `YYYY-MM-DD` date of the source date.
    #[must_use]
    pub fn first_published_at(&self) -> &str {
        &self.first_published_at
    }

    #[must_use]
    pub fn organisations(&self) -> &[String] {
        &self.organisations
    }

    /// The abstract as markdown, empty when the source abstract is blank.
    #[must_use]
    pub fn abstract_markdown(&self) -> &str {
        &self.abstract_markdown
    }

    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut [Attachment] {
        &mut self.attachments
    }

    /// The markdown body: abstract, citation, then links.
    #[must_use]
    pub fn body(&self) -> String {
        let mut sections = Vec::with_capacity(3);
        if !self.abstract_markdown.is_empty() {
            sections.push(format!("## Abstract\n\n{}", self.abstract_markdown));
        }
        if !self.citation.is_empty() {
            sections.push(self.citation.clone());
        }
        if let Some(links) = render_attachments(&self.attachments, &self.title) {
            sections.push(format!("## Links\n\n{links}"));
        }
        sections.join("\n\n")
    }

    /// Navigation outline derived from the body's headings.
    #[must_use]
    pub fn headers(&self) -> Vec<Header> {
        extract_headers(&self.body())
    }

    #[must_use]
    pub fn format_specific_metadata(&self) -> FormatSpecificMetadata {
        FormatSpecificMetadata {
            dfid_document_type: self.document_type.clone(),
            dfid_theme: self.themes.clone(),
            country: self.countries.clone(),
            dfid_authors: self.creators.clone(),
            dfid_review_status: if self.peer_reviewed {
                ReviewStatus::PeerReviewed
            } else {
                ReviewStatus::NotPeerReviewed
            },
            first_published_at: self.first_published_at.clone(),
            bulk_published: true,
        }
    }

    #[must_use]
    pub fn metadata(&self) -> Metadata {
        Metadata {
            document_type: DOCUMENT_TYPE,
            format_specific: self.format_specific_metadata(),
        }
    }

    #[must_use]
    pub fn change_history(&self) -> Vec<ChangeNote> {
        vec![ChangeNote {
            public_timestamp: self.public_updated_at.clone(),
            note: FIRST_PUBLISHED_NOTE,
        }]
    }

    /// The `details` hash, with hosted attachments only.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::NotSaved`] (wrapped) if any hosted
    /// attachment has not been saved.
    pub fn details(&self) -> Result<Details, DocumentError> {
        let attachments = self
            .attachments
            .iter()
            .filter(|attachment| attachment.is_hosted())
            .map(Attachment::to_json)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Details {
            metadata: self.metadata(),
            change_history: self.change_history(),
            attachments,
            body: vec![BodyPart {
                content_type: "markdown",
                content: self.body(),
            }],
        })
    }

    /// [`Document::details`] as JSON.
    ///
    /// # Errors
    ///
    /// As [`Document::details`].
    pub fn presented_details(&self) -> Result<Value, DocumentError> {
        Ok(serde_json::to_value(self.details()?)?)
    }

    /// The full content item sent to the publishing API.
    ///
    /// # Errors
    ///
    /// As [`Document::details`].
    pub fn to_publishing_payload(&self) -> Result<Value, DocumentError> {
        let base_path = self.base_path();
        Ok(json!({
            "content_id": self.content_id,
            "base_path": base_path,
            "title": self.title,
            "description": self.summary(),
            "document_type": DOCUMENT_TYPE,
            "schema_name": "specialist_document",
            "publishing_app": "specialist-publisher",
            "rendering_app": "specialist-frontend",
            "locale": "en",
            "phase": "live",
            "public_updated_at": self.public_updated_at,
            "details": self.presented_details()?,
            "routes": [{ "path": base_path, "type": "exact" }],
            "redirects": [],
            "update_type": "major",
        }))
    }

    /// Everything a reviewer needs to check the transformation.
    #[must_use]
    pub fn preview(&self) -> Preview {
        Preview {
            content_id: self.content_id,
            base_path: self.base_path(),
            title: self.title.clone(),
            metadata: self.metadata(),
            body: self.body(),
            headers: self.headers(),
        }
    }

    /// Downloads every hosted attachment and uploads it to `store`.
    ///
    /// All downloads start before any is awaited, so they run concurrently.
    /// Returns the number of attachments saved.
    ///
    /// # Errors
    ///
    /// Returns the first download or store failure.
    #[instrument(skip(self, fetcher, store), fields(slug = %self.slug))]
    pub async fn save_attachments(
        &mut self,
        fetcher: Arc<dyn AttachmentFetcher>,
        store: &dyn AssetStore,
    ) -> Result<usize, DocumentError> {
        let tasks = self
            .attachments
            .iter()
            .filter(|attachment| attachment.is_hosted())
            .map(|attachment| attachment.start_fetch(Arc::clone(&fetcher)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut saved = 0;
        let hosted = self
            .attachments
            .iter_mut()
            .filter(|attachment| attachment.is_hosted());
        for (attachment, task) in hosted.zip(tasks) {
            let bytes = task.bytes().await.map_err(AttachmentError::from)?;
            attachment.store_bytes(bytes, store).await?;
            saved += 1;
        }

        debug!(saved, "attachments saved");
        Ok(saved)
    }
}

fn required<S: FieldSource + ?Sized>(source: &S, field: &'static str) -> Result<String, DocumentError> {
    source
        .get(field)
        .and_then(|value| value.as_str().map(str::to_string))
        .ok_or(DocumentError::MissingField { field })
}

fn optional<S: FieldSource + ?Sized>(source: &S, field: &str) -> String {
    source
        .get(field)
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Remaps linked-development output URIs onto the authoritative host and
/// extracts the numeric output id.
fn canonical_output(
    raw: &str,
    config: &MigrationConfig,
) -> Result<(String, String), DocumentError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|e| DocumentError::InvalidOutputUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match legacy_target(&url, &config.legacy_host, &config.authoritative_host) {
        Some(LegacyTarget::Output(id)) if url_on_host(&url, &config.legacy_host) => {
            let canonical = format!("http://{}/Output/{id}/Default.aspx", config.authoritative_host);
            Ok((canonical, id))
        }
        Some(LegacyTarget::Output(id) | LegacyTarget::Project(id)) => Ok((raw.to_string(), id)),
        None => {
            let id = url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
                .map(str::to_string)
                .ok_or_else(|| DocumentError::InvalidOutputUrl {
                    url: raw.to_string(),
                    reason: "URL has no path".to_string(),
                })?;
            Ok((raw.to_string(), id))
        }
    }
}

/// Turns a SKOS concept URI such as `.../Themes#Climate%20and%20Environment`
/// into a facet code such as `climate_and_environment`.
fn code_from_uri(uri: &str) -> String {
    let uri = uri.trim();
    let local = match uri.rsplit_once('#') {
        Some((_, fragment)) => fragment,
        None => uri.rsplit('/').find(|segment| !segment.is_empty()).unwrap_or(uri),
    };
    let decoded = urlencoding::decode(local).map_or_else(|_| local.to_string(), |d| d.into_owned());
    decoded
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Parses RFC 3339 timestamps, naive timestamps (taken as UTC) and bare dates.
fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, DocumentError> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Ok(date.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset()),
        Err(e) => Err(DocumentError::InvalidDate {
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}
