//! Builds and renders a record's attachment list.
//!
//! R4D records often list the same file twice: once on r4d.dfid.gov.uk and
//! once on a mirror or DOI resolver. Only the hosted copy is kept.

use std::collections::HashSet;

use tracing::{debug, instrument};

use super::attachment::Attachment;
use super::error::AttachmentError;
use super::hosts::url_on_host;
use crate::config::MigrationConfig;

/// Parses the whitespace-delimited `uris` field into attachments, in source
/// order, with duplicate copies (bumph) removed.
///
/// A URL listed more than once is kept at its first occurrence.
///
/// An entry on one of `config.mirror_hosts` is dropped when a hosted entry has
/// the same filename, compared case-insensitively. An entry on one of
/// `config.doi_hosts` is dropped whenever any hosted entry exists.
///
/// # Errors
///
/// Returns [`AttachmentError::InvalidUrl`] for the first malformed URL.
#[instrument(skip(urls_field, config), fields(urls = urls_field.split_whitespace().count()))]
pub fn classify(
    urls_field: &str,
    config: &MigrationConfig,
) -> Result<Vec<Attachment>, AttachmentError> {
    let mut seen = HashSet::new();
    let attachments = urls_field
        .split_whitespace()
        .filter(|raw| {
            let first = seen.insert(*raw);
            if !first {
                debug!(url = %raw, "dropping repeated attachment URL");
            }
            first
        })
        .map(|raw| Attachment::new(raw, &config.authoritative_host))
        .collect::<Result<Vec<_>, _>>()?;

    let hosted_filenames: HashSet<String> = attachments
        .iter()
        .filter(|attachment| attachment.is_hosted())
        .map(|attachment| attachment.filename().to_lowercase())
        .collect();
    let any_hosted = !hosted_filenames.is_empty();

    let kept: Vec<Attachment> = attachments
        .into_iter()
        .filter(|attachment| {
            if attachment.is_hosted() {
                return true;
            }
            let url = attachment.url();
            let mirrored = config.mirror_hosts.iter().any(|host| url_on_host(url, host))
                && hosted_filenames.contains(&attachment.filename().to_lowercase());
            let superseded = any_hosted && config.doi_hosts.iter().any(|host| url_on_host(url, host));

            if mirrored || superseded {
                debug!(url = %attachment.original_url(), "dropping bumph attachment");
                return false;
            }
            true
        })
        .collect();

    Ok(kept)
}

/// Renders the body of the Links section.
///
/// A lone hosted attachment is its inline placeholder and a lone external one
/// is a link titled with the document title. Two or more become a `* ` list of
/// snippets. Returns `None` when there is nothing to render.
#[must_use]
pub fn render_attachments(attachments: &[Attachment], document_title: &str) -> Option<String> {
    match attachments {
        [] => None,
        [single] if single.is_hosted() => Some(single.snippet()),
        [single] => Some(format!("[{document_title}]({})", single.original_url())),
        many => Some(
            many.iter()
                .map(|attachment| format!("* {}", attachment.snippet()))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
    }
}
