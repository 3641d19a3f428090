//! HTML fragment to markdown conversion.
//!
//! The fragment is parsed by an error-recovering HTML5 parser and walked once.
//! Inline content accumulates in a buffer that is flushed into a block whenever
//! a block-level element starts or ends. List items always begin on their own
//! line, however the source markup ran them together.
//!
//! Source text is escaped as it is written, so only the writer's own markup is
//! live markdown.

use scraper::{ElementRef, Html, Node};

use super::{KNOWN_HEADERS, collapse_whitespace};

/// Width of an ordered-list marker including its padding (`1.  `).
const ORDERED_MARKER_WIDTH: usize = 4;

/// Characters escaped wherever they occur in source text.
const INLINE_SPECIAL: [char; 5] = ['\\', '*', '_', '[', ']'];

/// Converts an HTML fragment into markdown.
#[must_use]
pub fn to_markdown(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut writer = MarkdownWriter::default();
    writer.visit_children(fragment.root_element());
    writer.finish()
}

#[derive(Debug, Default)]
struct MarkdownWriter {
    blocks: Vec<String>,
    inline: String,
}

impl MarkdownWriter {
    fn visit_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        self.visit_element(child_element);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        match name {
            "script" | "style" | "head" | "title" => {}
            "br" => self.line_break(),
            "p" | "div" | "section" | "article" | "blockquote" | "table" | "tr" | "dl" | "dd"
            | "dt" | "center" => {
                self.flush();
                self.visit_children(element);
                self.flush();
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = usize::from(name.as_bytes()[1] - b'0');
                let text = inline_markdown(element);
                self.push_heading(level, &text);
            }
            "b" | "strong" => match pseudo_header(element) {
                Some(label) => self.push_heading(3, &label),
                None => self.wrap_inline(element, "**"),
            },
            "i" | "em" if contains_pseudo_header(element) => self.visit_children(element),
            "i" | "em" => self.wrap_inline(element, "*"),
            "a" => self.push_link(element),
            "ul" | "ol" => {
                self.flush();
                let list = render_list(element, name == "ol");
                if !list.is_empty() {
                    self.blocks.push(list);
                }
            }
            "li" => {
                self.flush();
                let item = render_item(element);
                if !item.is_empty() {
                    self.blocks.push(format_item("*", 2, &item));
                }
            }
            _ => self.visit_children(element),
        }
    }

    fn push_text(&mut self, text: &str) {
        for (index, paragraph) in split_paragraphs(text).into_iter().enumerate() {
            if index > 0 {
                self.flush();
            }
            let mut escape_at = None;
            for (offset, ch) in paragraph.char_indices() {
                if ch.is_whitespace() {
                    self.push_space();
                    continue;
                }
                if self.at_line_start() {
                    escape_at = block_marker_offset(&paragraph[offset..]).map(|at| offset + at);
                }
                if escape_at == Some(offset) || INLINE_SPECIAL.contains(&ch) {
                    self.inline.push('\\');
                }
                self.inline.push(ch);
            }
        }
    }

    fn at_line_start(&self) -> bool {
        self.inline.is_empty() || self.inline.ends_with('\n')
    }

    fn push_space(&mut self) {
        if !self.inline.is_empty() && !self.inline.ends_with([' ', '\n']) {
            self.inline.push(' ');
        }
    }

    fn push_raw(&mut self, markdown: &str) {
        self.inline.push_str(markdown);
    }

    fn line_break(&mut self) {
        if self.inline.trim().is_empty() {
            self.inline.clear();
        } else if self.inline.ends_with('\n') {
            self.flush();
        } else {
            let trimmed = self.inline.trim_end().len();
            self.inline.truncate(trimmed);
            self.inline.push('\n');
        }
    }

    fn push_heading(&mut self, level: usize, text: &str) {
        self.flush();
        let text = collapse_whitespace(text);
        if !text.is_empty() {
            self.blocks.push(format!("{} {text}", "#".repeat(level)));
        }
    }

    fn wrap_inline(&mut self, element: ElementRef<'_>, marker: &str) {
        let inner = inline_markdown(element);
        if inner.is_empty() {
            self.push_space();
            return;
        }
        if starts_with_space(element) {
            self.push_space();
        }
        self.push_raw(&format!("{marker}{inner}{marker}"));
        if ends_with_space(element) {
            self.push_space();
        }
    }

    fn push_link(&mut self, element: ElementRef<'_>) {
        let text = inline_markdown(element);
        let href = element.value().attr("href").map(str::trim).unwrap_or_default();

        if starts_with_space(element) {
            self.push_space();
        }
        match (href.is_empty(), text.is_empty()) {
            (true, _) => self.push_raw(&text),
            (false, true) => self.push_raw(&format!("<{href}>")),
            (false, false) => self.push_raw(&format!("[{text}]({href})")),
        }
        if ends_with_space(element) {
            self.push_space();
        }
    }

    fn flush(&mut self) {
        let block = self
            .inline
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        self.inline.clear();
        if !block.is_empty() {
            self.blocks.push(block);
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.blocks.join("\n\n")
    }
}

/// Renders an element's children as a single line of inline markdown.
fn inline_markdown(element: ElementRef<'_>) -> String {
    let mut writer = MarkdownWriter::default();
    writer.visit_children(element);
    collapse_whitespace(&writer.finish())
}

/// Offset of the character that would make `line` open a heading, list item
/// or quote, if any.
fn block_marker_offset(line: &str) -> Option<usize> {
    match line.chars().next()? {
        '#' | '-' | '+' | '>' => Some(0),
        c if c.is_ascii_digit() => {
            let digits = line.bytes().take_while(u8::is_ascii_digit).count();
            matches!(line.as_bytes().get(digits), Some(b'.' | b')')).then_some(digits)
        }
        _ => None,
    }
}

/// Escapes source text that is placed outside the writer's own inline flow.
fn escape_text(text: &str) -> String {
    let mut writer = MarkdownWriter::default();
    writer.push_text(text);
    collapse_whitespace(&writer.finish())
}

/// Splits text on blank lines, which authors used as paragraph breaks.
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut start = 0;
    let mut blank_run_start: Option<usize> = None;
    let mut newlines = 0;

    for (index, ch) in text.char_indices() {
        match ch {
            '\n' => {
                if newlines == 0 {
                    blank_run_start = Some(index);
                }
                newlines += 1;
            }
            c if c.is_whitespace() => {}
            _ => {
                if newlines >= 2
                    && let Some(run_start) = blank_run_start
                {
                    paragraphs.push(&text[start..run_start]);
                    start = index;
                }
                newlines = 0;
                blank_run_start = None;
            }
        }
    }

    paragraphs.push(&text[start..]);
    paragraphs
}

/// True if a pseudo-header sits anywhere inside `element`.
fn contains_pseudo_header(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|inner| matches!(inner.value().name(), "b" | "strong"))
        .any(|inner| pseudo_header(inner).is_some())
}

/// Recognizes `<b>Query:</b>`-style labels and returns the heading text.
fn pseudo_header(element: ElementRef<'_>) -> Option<String> {
    let text: String = element.text().collect();
    if !KNOWN_HEADERS.iter().any(|header| text.contains(header)) {
        return None;
    }
    Some(collapse_whitespace(&text.replacen(':', "", 1)))
}

fn starts_with_space(element: ElementRef<'_>) -> bool {
    element
        .text()
        .next()
        .and_then(|text| text.chars().next())
        .is_some_and(char::is_whitespace)
}

fn ends_with_space(element: ElementRef<'_>) -> bool {
    element
        .text()
        .last()
        .and_then(|text| text.chars().next_back())
        .is_some_and(char::is_whitespace)
}

/// Symbol-font bullets and similar glyphs pasted between list items.
fn is_stray_bullet(ch: char) -> bool {
    ch.is_whitespace()
        || matches!(ch, '\u{2022}' | '\u{00b7}' | '\u{25aa}' | '\u{25cf}' | '-')
        || ('\u{e000}'..='\u{f8ff}').contains(&ch)
}

fn render_list(list: ElementRef<'_>, ordered: bool) -> String {
    let mut items: Vec<String> = Vec::new();

    for child in list.children() {
        match child.value() {
            Node::Text(text) => {
                let stray = text.trim_matches(is_stray_bullet);
                if !stray.is_empty() {
                    items.push(escape_text(stray));
                }
            }
            Node::Element(_) => {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                match element.value().name() {
                    "ul" | "ol" => {
                        let nested = render_list(element, element.value().name() == "ol");
                        if nested.is_empty() {
                            continue;
                        }
                        match items.last_mut() {
                            Some(last) => {
                                last.push_str("\n\n");
                                last.push_str(&nested);
                            }
                            None => items.push(nested),
                        }
                    }
                    _ => {
                        let item = render_item(element);
                        if !item.is_empty() {
                            items.push(item);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if ordered {
                format_item(&format!("{}.", index + 1), ORDERED_MARKER_WIDTH, item)
            } else {
                format_item("*", 2, item)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_item(item: ElementRef<'_>) -> String {
    let mut writer = MarkdownWriter::default();
    writer.visit_children(item);
    writer.finish()
}

/// Prefixes the first line of `body` with the marker and indents the rest.
fn format_item(marker: &str, width: usize, body: &str) -> String {
    let width = width.max(marker.len() + 1);
    let indent = " ".repeat(width);
    body.lines()
        .enumerate()
        .map(|(index, line)| match (index, line.is_empty()) {
            (0, _) => format!("{marker:<width$}{line}"),
            (_, true) => String::new(),
            (_, false) => format!("{indent}{line}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
