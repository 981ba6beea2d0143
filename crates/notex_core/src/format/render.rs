//! Allow-list renderer for storage-form note content.
//!
//! # Responsibility
//! - Turn stored content into HTML that is safe to inject into a page.
//! - Provide a structured span projection for non-HTML frontends.
//!
//! # Invariants
//! - Only `<strong>`, `</strong>`, `<mark>`, `</mark>` survive as markup;
//!   every other `<`, `>`, `&`, `"`, `'` is escaped.
//! - Emitted HTML is balanced: stray closing tags are escaped and open tags
//!   are closed at the end of input.

use crate::format::codec::{MARK_CLOSE, MARK_OPEN, STRONG_CLOSE, STRONG_OPEN};
use serde::{Deserialize, Serialize};

/// Run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledSpan {
    pub text: String,
    pub bold: bool,
    pub highlight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    StrongOpen,
    StrongClose,
    MarkOpen,
    MarkClose,
}

impl Tag {
    fn literal(self) -> &'static str {
        match self {
            Self::StrongOpen => STRONG_OPEN,
            Self::StrongClose => STRONG_CLOSE,
            Self::MarkOpen => MARK_OPEN,
            Self::MarkClose => MARK_CLOSE,
        }
    }
}

#[derive(Debug)]
enum Token<'a> {
    Text(&'a str),
    Tag(Tag),
}

/// Renders storage-form content as escaped HTML keeping only allowed tags.
pub fn render_html(markup: &str) -> String {
    let mut html = String::with_capacity(markup.len());
    let mut open: Vec<Tag> = Vec::new();

    for token in tokenize(markup) {
        match token {
            Token::Text(text) => push_escaped(&mut html, text),
            Token::Tag(tag @ (Tag::StrongOpen | Tag::MarkOpen)) => {
                open.push(tag);
                html.push_str(tag.literal());
            }
            Token::Tag(tag) => {
                let opener = opener_for(tag);
                let Some(index) = open.iter().rposition(|candidate| *candidate == opener) else {
                    push_escaped(&mut html, tag.literal());
                    continue;
                };
                // Overlapping spans: close the inner tags, then reopen them.
                let inner: Vec<Tag> = open.drain(index + 1..).collect();
                for nested in inner.iter().rev() {
                    html.push_str(closer_for(*nested).literal());
                }
                open.pop();
                html.push_str(tag.literal());
                for nested in inner {
                    html.push_str(nested.literal());
                    open.push(nested);
                }
            }
        }
    }

    while let Some(tag) = open.pop() {
        html.push_str(closer_for(tag).literal());
    }
    html
}

/// Splits storage-form content into styled runs.
///
/// Overlapping spans (`<strong>a<mark>b</strong>c</mark>`) are supported;
/// closing tags without a matching opener are kept as literal text.
pub fn styled_spans(markup: &str) -> Vec<StyledSpan> {
    let mut spans: Vec<StyledSpan> = Vec::new();
    let mut bold_depth = 0usize;
    let mut highlight_depth = 0usize;

    for token in tokenize(markup) {
        let (bold, highlight) = (bold_depth > 0, highlight_depth > 0);
        match token {
            Token::Text(text) => push_text(&mut spans, text, bold, highlight),
            Token::Tag(Tag::StrongOpen) => bold_depth += 1,
            Token::Tag(Tag::MarkOpen) => highlight_depth += 1,
            Token::Tag(Tag::StrongClose) if bold_depth > 0 => bold_depth -= 1,
            Token::Tag(Tag::MarkClose) if highlight_depth > 0 => highlight_depth -= 1,
            Token::Tag(tag) => push_text(&mut spans, tag.literal(), bold, highlight),
        }
    }

    spans
}

/// Returns the text a reader sees, with allowed tags stripped.
pub fn visible_text(markup: &str) -> String {
    styled_spans(markup)
        .into_iter()
        .map(|span| span.text)
        .collect()
}

fn push_text(spans: &mut Vec<StyledSpan>, text: &str, bold: bool, highlight: bool) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = spans.last_mut() {
        if last.bold == bold && last.highlight == highlight {
            last.text.push_str(text);
            return;
        }
    }
    spans.push(StyledSpan {
        text: text.to_string(),
        bold,
        highlight,
    });
}

fn tokenize(markup: &str) -> Vec<Token<'_>> {
    const TAGS: [Tag; 4] = [Tag::StrongOpen, Tag::StrongClose, Tag::MarkOpen, Tag::MarkClose];

    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(found) = markup[cursor..].find('<') {
        let at = cursor + found;
        let rest = &markup[at..];
        match TAGS.iter().find(|tag| rest.starts_with(tag.literal())) {
            Some(tag) => {
                if text_start < at {
                    tokens.push(Token::Text(&markup[text_start..at]));
                }
                tokens.push(Token::Tag(*tag));
                cursor = at + tag.literal().len();
                text_start = cursor;
            }
            None => cursor = at + 1,
        }
    }

    if text_start < markup.len() {
        tokens.push(Token::Text(&markup[text_start..]));
    }
    tokens
}

fn opener_for(tag: Tag) -> Tag {
    match tag {
        Tag::StrongClose => Tag::StrongOpen,
        Tag::MarkClose => Tag::MarkOpen,
        other => other,
    }
}

fn closer_for(tag: Tag) -> Tag {
    match tag {
        Tag::StrongOpen => Tag::StrongClose,
        Tag::MarkOpen => Tag::MarkClose,
        other => other,
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{render_html, styled_spans, visible_text, StyledSpan};

    #[test]
    fn allowed_tags_survive_and_script_is_escaped() {
        let html = render_html("<strong>hi</strong> <script>alert('x')</script>");
        assert_eq!(
            html,
            "<strong>hi</strong> &lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn tag_attributes_are_not_allowed() {
        let html = render_html("<mark class=\"x\">a</mark>");
        assert_eq!(html, "&lt;mark class=&quot;x&quot;&gt;a&lt;/mark&gt;");
    }

    #[test]
    fn stray_closer_is_escaped_and_open_tag_is_closed() {
        assert_eq!(render_html("a</strong>b"), "a&lt;/strong&gt;b");
        assert_eq!(render_html("<mark>open"), "<mark>open</mark>");
    }

    #[test]
    fn overlapping_spans_are_split_into_nested_tags() {
        assert_eq!(
            render_html("<strong>a<mark>b</strong>c</mark>"),
            "<strong>a<mark>b</mark></strong><mark>c</mark>"
        );
    }

    #[test]
    fn spans_track_overlapping_styles() {
        let spans = styled_spans("x<strong>a<mark>b</mark></strong>");
        assert_eq!(
            spans,
            vec![
                StyledSpan {
                    text: "x".to_string(),
                    bold: false,
                    highlight: false,
                },
                StyledSpan {
                    text: "a".to_string(),
                    bold: true,
                    highlight: false,
                },
                StyledSpan {
                    text: "b".to_string(),
                    bold: true,
                    highlight: true,
                },
            ]
        );
    }

    #[test]
    fn visible_text_strips_allowed_tags_only() {
        assert_eq!(
            visible_text("<strong>Buy</strong> milk <em>now</em>"),
            "Buy milk <em>now</em>"
        );
    }
}
