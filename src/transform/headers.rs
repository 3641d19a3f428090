//! Heading outline for a markdown body.

use serde::Serialize;

use super::slug::slugify;

/// One entry in the navigation outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub text: String,
    pub level: u8,
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
}

impl Header {
    fn new(text: &str, level: u8) -> Self {
        let text = unescape_markdown(text);
        Self {
            id: slugify(&text),
            text,
            level,
            headers: Vec::new(),
        }
    }
}

/// Parses `## ` and `### ` lines into a two-level outline.
///
/// Level-3 headings nest under the closest preceding level-2 heading; any that
/// come before the first level-2 heading stay at the top level.
#[must_use]
pub fn extract_headers(markdown: &str) -> Vec<Header> {
    let mut outline: Vec<Header> = Vec::new();

    for line in markdown.lines() {
        let Some((level, text)) = heading(line) else {
            continue;
        };
        let header = Header::new(text, level);

        match (level, outline.last_mut()) {
            (3, Some(parent)) if parent.level == 2 => parent.headers.push(header),
            _ => outline.push(header),
        }
    }

    outline
}

/// Drops the backslash from `\#`-style escapes of ASCII punctuation.
fn unescape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek().is_some_and(char::is_ascii_punctuation) {
            continue;
        }
        out.push(ch);
    }
    out
}

fn heading(line: &str) -> Option<(u8, &str)> {
    let (level, rest) = if let Some(rest) = line.strip_prefix("### ") {
        (3, rest)
    } else if let Some(rest) = line.strip_prefix("## ") {
        (2, rest)
    } else {
        return None;
    };
    let text = rest.trim();
    (!text.is_empty()).then_some((level, text))
}
