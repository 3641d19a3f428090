//! URL slugs for document titles and heading anchors.

/// Longest slug we emit; longer titles are cut back to a hyphen boundary.
pub const MAX_SLUG_LENGTH: usize = 150;

/// Builds a lowercase, hyphen-separated ASCII slug.
///
/// Common Latin diacritics are folded (`é` becomes `e`, `ß` becomes `ss`),
/// every other non-alphanumeric run becomes a single hyphen, and the result
/// never starts or ends with a hyphen.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        let folded = fold_diacritic(ch);
        let pieces: &str = match folded {
            Some(ascii) => ascii,
            None if ch.is_ascii_alphanumeric() => {
                push_with_separator(&mut slug, &mut pending_hyphen, ch);
                continue;
            }
            None => {
                pending_hyphen = true;
                continue;
            }
        };
        for piece in pieces.chars() {
            push_with_separator(&mut slug, &mut pending_hyphen, piece);
        }
    }

    truncate_slug(slug, MAX_SLUG_LENGTH)
}

fn push_with_separator(slug: &mut String, pending_hyphen: &mut bool, ch: char) {
    if *pending_hyphen && !slug.is_empty() {
        slug.push('-');
    }
    *pending_hyphen = false;
    slug.push(ch);
}

fn truncate_slug(slug: String, max: usize) -> String {
    if slug.len() <= max {
        return slug;
    }
    // Slug is pure ASCII here, so byte slicing is safe.
    let cut = &slug[..max];
    let cut = match (slug.as_bytes().get(max), cut.rfind('-')) {
        (Some(b'-'), _) | (None, _) => cut,
        (Some(_), Some(boundary)) => &cut[..boundary],
        (Some(_), None) => cut,
    };
    cut.trim_end_matches('-').to_string()
}

fn fold_diacritic(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_title_with_curly_quotes() {
        assert_eq!(
            slugify("\u{2018}And Then He Switched off the Phone\u{2019}: Mobile Phones ..."),
            "and-then-he-switched-off-the-phone-mobile-phones"
        );
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  a -- b__c  "), "a-b-c");
        assert_eq!(slugify("Sub-abstract"), "sub-abstract");
        assert_eq!(slugify("23-24 January 2001."), "23-24-january-2001");
    }

    #[test]
    fn test_slugify_folds_diacritics() {
        assert_eq!(slugify("Política Económica in São Tomé"), "politica-economica-in-sao-tome");
        assert_eq!(slugify("Straße"), "strasse");
    }

    #[test]
    fn test_slugify_drops_unfoldable_scripts() {
        assert_eq!(slugify("Report 报告 2016"), "report-2016");
        assert_eq!(slugify("报告"), "");
    }

    #[test]
    fn test_slugify_long_title_stays_within_budget() {
        let title = "Domestic Violence Law: The Gap Between Legislation and Practice in Cambodia \
                     and What Can Be Done About It. A Study of Courts, Police, Village Chiefs and \
                     Survivors Across Five Provinces, With Recommendations For Donors";
        let slug = slugify(title);
        assert!(slug.len() <= MAX_SLUG_LENGTH, "{} chars", slug.len());
        assert!(slug.starts_with("domestic-violence-law-the-gap"));
        assert!(!slug.contains("--"));
        assert!(!slug.ends_with('-'));
        assert_eq!(slug, slug.to_lowercase());
    }

    #[test]
    fn test_truncate_slug_prefers_hyphen_boundary() {
        assert_eq!(truncate_slug("abc-def-ghi".to_string(), 6), "abc");
        assert_eq!(truncate_slug("abc-def-ghi".to_string(), 7), "abc-def");
        assert_eq!(truncate_slug("abcdefghi".to_string(), 4), "abcd");
    }
}
