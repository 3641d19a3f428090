//! Markup normalization for R4D abstracts, titles, and citations.
//!
//! Source text arrives from the triple-store with HTML entities escaped up to
//! three times over (`&amp;amp;lt;p&amp;amp;gt;`). Everything here is total:
//! malformed markup degrades to best-effort output and never returns an error.

mod markdown;

use scraper::Html;
use tracing::{instrument, trace};

pub use markdown::to_markdown;

/// Number of unescape passes needed for every abstract observed in R4D.
pub const UNESCAPE_PASSES: usize = 3;

/// Upper bound on unescape passes for text escaped deeper than usual.
pub const MAX_UNESCAPE_PASSES: usize = 8;

/// Bold/strong labels that authors used as section headings.
pub const KNOWN_HEADERS: [&str; 4] = ["Query", "Summary", "Key Findings", "Overview"];

/// Decodes one level of HTML escaping.
///
/// Handles the five XML entities (`&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`)
/// plus decimal and hexadecimal character references. Anything else,
/// including references to invalid code points, is left as written.
#[must_use]
pub fn unescape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];

        match decode_entity(candidate) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Decodes the entity at the start of `candidate` (which begins with `&`).
///
/// Returns the decoded character and the number of bytes consumed.
fn decode_entity(candidate: &str) -> Option<(char, usize)> {
    // Longest reference we decode is `&#x10FFFF;`
    let semicolon = candidate.char_indices().take(12).find(|(_, c)| *c == ';')?.0;
    let name = &candidate[1..semicolon];

    let decoded = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) if !hex.is_empty() => u32::from_str_radix(hex, 16).ok()?,
                Some(_) => return None,
                None if !numeric.is_empty() && numeric.bytes().all(|b| b.is_ascii_digit()) => {
                    numeric.parse().ok()?
                }
                None => return None,
            };
            char::from_u32(code)?
        }
    };

    Some((decoded, semicolon + 1))
}

/// Applies [`unescape_html`] at least [`UNESCAPE_PASSES`] times, continuing
/// until the text stops changing or [`MAX_UNESCAPE_PASSES`] is reached.
///
/// Another pass over the result is a no-op for anything escaped up to
/// [`MAX_UNESCAPE_PASSES`] levels deep.
#[must_use]
pub fn unescape_three_times(input: &str) -> String {
    let mut text = input.to_string();
    for pass in 0..MAX_UNESCAPE_PASSES {
        let next = unescape_html(&text);
        if pass >= UNESCAPE_PASSES && next == text {
            break;
        }
        text = next;
    }
    text
}

/// True for inputs that carry no content: empty, whitespace, or a lone hyphen.
#[must_use]
pub fn is_blank(text: &str) -> bool {
    matches!(text.trim(), "" | "-")
}

/// Removes all markup, returning the text content with whitespace collapsed.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    collapse_whitespace(&text)
}

/// Collapses runs of whitespace into single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes raw source markup into markdown.
///
/// Blank-ish inputs (see [`is_blank`]) produce an empty string.
#[must_use]
pub fn normalize(raw: &str) -> String {
    normalize_with(raw, str::to_string)
}

/// Like [`normalize`], but runs `rewrite` over the unescaped HTML before it is
/// converted, so anchors can be retargeted while they are still markup.
#[instrument(skip(raw, rewrite), fields(raw_len = raw.len()))]
pub fn normalize_with<F>(raw: &str, rewrite: F) -> String
where
    F: FnOnce(&str) -> String,
{
    let unescaped = unescape_three_times(raw);
    if is_blank(&unescaped) {
        trace!("blank input");
        return String::new();
    }

    let rewritten = rewrite(&unescaped);
    to_markdown(&rewritten)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_html_decodes_xml_entities() {
        assert_eq!(unescape_html("&lt;p&gt;"), "<p>");
        assert_eq!(unescape_html("&quot;q&quot; &apos;a&apos;"), "\"q\" 'a'");
        assert_eq!(unescape_html("fish &amp; chips"), "fish & chips");
    }

    #[test]
    fn test_unescape_html_decodes_numeric_references() {
        assert_eq!(unescape_html("&#8216;x&#8217;"), "\u{2018}x\u{2019}");
        assert_eq!(unescape_html("it&#39;s"), "it's");
        assert_eq!(unescape_html("&#x2014;"), "\u{2014}");
        assert_eq!(unescape_html("&#61623;"), "\u{f0b7}");
    }

    #[test]
    fn test_unescape_html_leaves_unknown_and_broken_references() {
        assert_eq!(unescape_html("R&D"), "R&D");
        assert_eq!(unescape_html("&nbsp;"), "&nbsp;");
        assert_eq!(unescape_html("&#xD800;"), "&#xD800;");
        assert_eq!(unescape_html("&#;"), "&#;");
        assert_eq!(unescape_html("trailing &"), "trailing &");
        assert_eq!(unescape_html("&#99999999999;"), "&#99999999999;");
    }

    #[test]
    fn test_unescape_html_is_single_level() {
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_unescape_three_times_unwraps_triple_escaping() {
        assert_eq!(unescape_three_times("&amp;amp;lt;b&amp;amp;gt;"), "<b>");
        assert_eq!(unescape_three_times("&amp;amp;#61623;"), "\u{f0b7}");
    }

    #[test]
    fn test_fourth_pass_is_a_no_op() {
        let inputs = [
            "&amp;lt;p&amp;gt;This research&amp;lt;/p&amp;gt;",
            " &amp;#8216;And Then He Switched off the Phone&amp;#8217; ",
            "&amp;lt;ul&amp;gt;&amp;amp;#61623;&amp;lt;li&amp;gt; item&amp;lt;/li&amp;gt;",
            "plain text with R&D in it",
        ];
        for input in inputs {
            let thrice = unescape_three_times(input);
            assert_eq!(unescape_html(&thrice), thrice, "input: {input}");
        }
    }

    #[test]
    fn test_unescape_three_times_settles_deeper_escaping() {
        let four_times = "&amp;amp;amp;lt;b&amp;amp;amp;gt;x";
        let settled = unescape_three_times(four_times);
        assert_eq!(settled, "<b>x");
        assert_eq!(unescape_html(&settled), settled);
    }

    #[test]
    fn test_unescape_three_times_stops_at_pass_limit() {
        let mut deep = "&lt;".to_string();
        for _ in 0..MAX_UNESCAPE_PASSES {
            deep = deep.replace('&', "&amp;");
        }
        let result = unescape_three_times(&deep);
        assert_eq!(result, "&lt;");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("-"));
        assert!(is_blank(" - "));
        assert!(is_blank("\n\t"));
        assert!(!is_blank("--"));
        assert!(!is_blank("a"));
    }

    #[test]
    fn test_strip_tags_keeps_text() {
        assert_eq!(
            strip_tags(" Heinlein, R. <b>Domestic Violence Law.</b> 72 pp. "),
            "Heinlein, R. Domestic Violence Law. 72 pp."
        );
    }

    #[test]
    fn test_normalize_blank_inputs_are_empty() {
        for input in ["", "-", " - ", "  "] {
            assert_eq!(normalize(input), "", "input: {input:?}");
        }
    }

    #[test]
    fn test_normalize_unescapes_before_converting() {
        let md = normalize("&amp;lt;p&amp;gt;Hello &amp;lt;b&amp;gt;world&amp;lt;/b&amp;gt;&amp;lt;/p&amp;gt;");
        assert_eq!(md, "Hello **world**");
    }

    #[test]
    fn test_normalize_with_runs_rewrite_on_unescaped_markup() {
        let md = normalize_with("&amp;lt;i&amp;gt;x&amp;lt;/i&amp;gt;", |html| {
            assert_eq!(html, "<i>x</i>");
            html.replace('x', "y")
        });
        assert_eq!(md, "*y*");
    }

    #[test]
    fn test_normalize_survives_garbage() {
        let inputs = [
            "<<<>>>",
            "</p></p><li>",
            "&#xFFFFFFFF; <a href=>",
            "<b><i>unclosed",
            "\u{0}\u{1} <ul><ul><li></ul>",
        ];
        for input in inputs {
            let _ = normalize(input);
        }
    }
}
