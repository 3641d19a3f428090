//! Host normalization and legacy R4D URL recognition.

use url::Url;

/// Normalizes a host string: trim, strip leading "www.", trailing '.', and lowercase.
#[must_use]
pub fn canonical_host(host: &str) -> String {
    host.trim()
        .trim_start_matches("www.")
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

/// Returns true if the two host strings refer to the same host after normalization.
#[must_use]
pub fn hosts_match(lhs: &str, rhs: &str) -> bool {
    canonical_host(lhs) == canonical_host(rhs)
}

/// Returns true if `url` is served by `host`.
#[must_use]
pub fn url_on_host(url: &Url, host: &str) -> bool {
    url.host_str().is_some_and(|url_host| hosts_match(url_host, host))
}

/// What a link into the legacy R4D systems points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyTarget {
    /// A research output, by numeric id.
    Output(String),
    /// A research project, which has no migrated destination.
    Project(String),
}

/// Recognizes R4D output and project links on either the legacy
/// linked-development host (`/r4d/output/5050/`) or the authoritative host
/// (`/Output/5050/Default.aspx`).
#[must_use]
pub fn legacy_target(url: &Url, legacy_host: &str, authoritative_host: &str) -> Option<LegacyTarget> {
    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();

    let (kind, id) = if url_on_host(url, legacy_host) {
        match segments.as_slice() {
            [r4d, kind, id, ..] if r4d.eq_ignore_ascii_case("r4d") => (*kind, *id),
            _ => return None,
        }
    } else if url_on_host(url, authoritative_host) {
        match segments.as_slice() {
            [kind, id, ..] => (*kind, *id),
            _ => return None,
        }
    } else {
        return None;
    };

    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    if kind.eq_ignore_ascii_case("output") {
        Some(LegacyTarget::Output(id.to_string()))
    } else if kind.eq_ignore_ascii_case("project") {
        Some(LegacyTarget::Project(id.to_string()))
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LEGACY: &str = "linked-development.org";
    const R4D: &str = "r4d.dfid.gov.uk";

    fn target(raw: &str) -> Option<LegacyTarget> {
        legacy_target(&Url::parse(raw).unwrap(), LEGACY, R4D)
    }

    #[test]
    fn test_hosts_match_ignores_www_and_case() {
        assert!(hosts_match("www.GSDRC.org", "gsdrc.org"));
        assert!(hosts_match("r4d.dfid.gov.uk.", "r4d.dfid.gov.uk"));
        assert!(!hosts_match("dx.doi.org", "doi.org"));
    }

    #[test]
    fn test_legacy_target_recognizes_linked_development_links() {
        assert_eq!(
            target("http://linked-development.org/r4d/output/65132"),
            Some(LegacyTarget::Output("65132".to_string()))
        );
        assert_eq!(
            target("http://linked-development.org/r4d/project/2980/"),
            Some(LegacyTarget::Project("2980".to_string()))
        );
    }

    #[test]
    fn test_legacy_target_recognizes_r4d_output_pages() {
        assert_eq!(
            target("http://r4d.dfid.gov.uk/Output/5050/Default.aspx"),
            Some(LegacyTarget::Output("5050".to_string()))
        );
    }

    #[test]
    fn test_legacy_target_ignores_other_links() {
        assert_eq!(target("http://r4d.dfid.gov.uk/pdfs/some.pdf"), None);
        assert_eq!(target("http://linked-development.org/r4d/output/abc"), None);
        assert_eq!(target("http://example.com/r4d/output/1"), None);
        assert_eq!(target("http://linked-development.org/"), None);
    }
}
