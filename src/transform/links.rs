//! Rewrites anchors that point into the legacy R4D systems.
//!
//! Output pages have a migrated counterpart whose slug is derived from the
//! output's title, which is also what authors used as the anchor text. Project
//! pages were not migrated, so those anchors are unwrapped to plain text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, trace};
use url::Url;

use super::hosts::{LegacyTarget, legacy_target};
use super::html::strip_tags;
use super::slug::slugify;
use crate::config::MigrationConfig;

#[allow(clippy::expect_used)]
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("anchor regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("href regex is valid") // Static pattern, safe to panic
});

/// Rewrites legacy R4D anchors in unescaped HTML.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    config: MigrationConfig,
}

impl LinkRewriter {
    /// Creates a rewriter for the hosts and destination in `config`.
    #[must_use]
    pub fn new(config: &MigrationConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Rewrites every anchor in `text`.
    ///
    /// - legacy output links are retargeted to the destination URL for the
    ///   slug of their visible text;
    /// - legacy project links are replaced by their visible text;
    /// - anything else is left untouched.
    #[must_use]
    pub fn rewrite<'a>(&self, text: &'a str) -> Cow<'a, str> {
        ANCHOR_RE.replace_all(text, |caps: &Captures<'_>| self.rewrite_anchor(caps))
    }

    fn rewrite_anchor(&self, caps: &Captures<'_>) -> String {
        let whole = &caps[0];
        let inner = &caps[2];

        let Some(href) = extract_href(&caps[1]) else {
            return whole.to_string();
        };
        let Ok(url) = Url::parse(href.trim()) else {
            return whole.to_string();
        };

        match legacy_target(&url, &self.config.legacy_host, &self.config.authoritative_host) {
            Some(LegacyTarget::Output(id)) => {
                let slug = slugify(&strip_tags(inner));
                if slug.is_empty() {
                    debug!(output_id = %id, "legacy output link has no text; unwrapping");
                    return inner.to_string();
                }
                let destination = self.config.destination_url(&slug);
                trace!(output_id = %id, %destination, "rewrote legacy output link");
                format!(r#"<a href="{destination}">{inner}</a>"#)
            }
            Some(LegacyTarget::Project(id)) => {
                trace!(project_id = %id, "removed legacy project link");
                inner.to_string()
            }
            None => whole.to_string(),
        }
    }
}

fn extract_href(attributes: &str) -> Option<&str> {
    let caps = HREF_RE.captures(attributes)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> LinkRewriter {
        LinkRewriter::new(&MigrationConfig::default())
    }

    #[test]
    fn test_output_link_is_retargeted_and_keeps_text() {
        let html = "See the record for <a href=\"http://linked-development.org/r4d/output/65132\">Moving\n\
                    Beyond Research to Influence Policy Workshop, University of Southampton, 23-24 January 2001.\n\
                    </a> which provides the links.";
        let rewritten = rewriter().rewrite(html);

        assert!(!rewritten.contains("linked-development"));
        assert!(rewritten.contains(
            "https://gov.uk/dfid-research-outputs/moving-beyond-research-to-influence-policy-workshop-university-of-southampton-23-24-january-2001"
        ));
        assert!(rewritten.contains("Beyond Research to Influence Policy Workshop"));
    }

    #[test]
    fn test_project_links_are_unwrapped() {
        let html = "(<a href=\"http://linked-development.org/r4d/project/2980\">R8023: Guidelines for Good Governance</a>,\n\
                    and <a href='http://linked-development.org/r4d/project/3730'>R8338: Equity, Irrigation and Poverty</a>).";
        let rewritten = rewriter().rewrite(html);

        assert_eq!(
            rewritten,
            "(R8023: Guidelines for Good Governance,\nand R8338: Equity, Irrigation and Poverty)."
        );
    }

    #[test]
    fn test_authoritative_output_page_is_retargeted() {
        let html = r#"<A HREF=http://r4d.dfid.gov.uk/Output/5050/Default.aspx>Mobile Phones</A>"#;
        assert_eq!(
            rewriter().rewrite(html),
            r#"<a href="https://gov.uk/dfid-research-outputs/mobile-phones">Mobile Phones</a>"#
        );
    }

    #[test]
    fn test_other_links_pass_through_unchanged() {
        let html = r#"<a href="http://example.com/report.pdf" title="x">report</a> and <a name="top">top</a>"#;
        assert_eq!(rewriter().rewrite(html), html);
    }

    #[test]
    fn test_output_link_without_text_is_unwrapped() {
        let html = r#"x <a href="http://linked-development.org/r4d/output/1"> </a> y"#;
        assert_eq!(rewriter().rewrite(html), "x   y");
    }

    #[test]
    fn test_extract_href_variants() {
        assert_eq!(extract_href(r#" href="a""#), Some("a"));
        assert_eq!(extract_href(" href='b' "), Some("b"));
        assert_eq!(extract_href(" HREF=c"), Some("c"));
        assert_eq!(extract_href(" name=\"d\""), None);
    }
}
