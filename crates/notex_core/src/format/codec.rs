//! Marker codec between edit form and storage form.
//!
//! # Responsibility
//! - Convert `**bold**` / `==highlight==` markers into `<strong>` / `<mark>`
//!   wrappers before content is persisted.
//! - Convert stored wrappers back into markers when a note is opened for
//!   editing.
//!
//! # Invariants
//! - `decode_to_plain_text(encode_to_markup(s)) == s` for well-formed `s`.
//! - `encode_to_markup(decode_to_plain_text(m)) == m` for every `m` produced
//!   by `encode_to_markup`.
//! - Unpaired markers and unknown markup pass through unchanged.
//! - A span never crosses a line break.
//!
//! # See also
//! - `format::commands` for the selection commands producing markers.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening/closing marker for bold spans in edit form.
pub const BOLD_MARKER: &str = "**";
/// Opening/closing marker for highlighted spans in edit form.
pub const HIGHLIGHT_MARKER: &str = "==";

/// Storage-form opening tag for bold spans.
pub const STRONG_OPEN: &str = "<strong>";
/// Storage-form closing tag for bold spans.
pub const STRONG_CLOSE: &str = "</strong>";
/// Storage-form opening tag for highlighted spans.
pub const MARK_OPEN: &str = "<mark>";
/// Storage-form closing tag for highlighted spans.
pub const MARK_CLOSE: &str = "</mark>";

static BOLD_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold marker regex"));
static HIGHLIGHT_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"==(.*?)==").expect("valid highlight marker regex"));
static STRONG_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<strong>(.*?)</strong>").expect("valid strong tag regex"));
static MARK_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<mark>(.*?)</mark>").expect("valid mark tag regex"));

/// Converts edit-form text into storage form.
///
/// Each pair is matched non-greedily, so the first closing marker after an
/// opening marker ends the span. The bold and highlight passes touch
/// disjoint characters and commute.
pub fn encode_to_markup(text: &str) -> String {
    let bold = BOLD_MARKER_RE.replace_all(text, "<strong>$1</strong>");
    HIGHLIGHT_MARKER_RE
        .replace_all(&bold, "<mark>$1</mark>")
        .into_owned()
}

/// Converts storage-form markup back into edit-form text.
pub fn decode_to_plain_text(markup: &str) -> String {
    let bold = STRONG_TAG_RE.replace_all(markup, "**$1**");
    MARK_TAG_RE.replace_all(&bold, "==$1==").into_owned()
}

#[cfg(test)]
mod tests {
    use super::{decode_to_plain_text, encode_to_markup};

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(encode_to_markup("plain text"), "plain text");
        assert_eq!(decode_to_plain_text("plain text"), "plain text");
    }

    #[test]
    fn bold_span_becomes_strong() {
        assert_eq!(
            encode_to_markup("a **bold** word"),
            "a <strong>bold</strong> word"
        );
    }

    #[test]
    fn mixed_spans_encode_independently() {
        assert_eq!(
            encode_to_markup("==hl== and **b**"),
            "<mark>hl</mark> and <strong>b</strong>"
        );
    }

    #[test]
    fn unbalanced_marker_passes_through() {
        assert_eq!(encode_to_markup("unbalanced **text"), "unbalanced **text");
        assert_eq!(encode_to_markup("a == b"), "a == b");
    }

    #[test]
    fn matching_is_non_greedy() {
        assert_eq!(
            encode_to_markup("**a** and **b**"),
            "<strong>a</strong> and <strong>b</strong>"
        );
    }

    #[test]
    fn odd_marker_count_leaves_trailing_marker_literal() {
        assert_eq!(
            encode_to_markup("**a** **b"),
            "<strong>a</strong> **b"
        );
    }

    #[test]
    fn spans_do_not_cross_line_breaks() {
        assert_eq!(encode_to_markup("**a\nb**"), "**a\nb**");
        assert_eq!(decode_to_plain_text("<mark>a\nb</mark>"), "<mark>a\nb</mark>");
    }

    #[test]
    fn unknown_markup_is_preserved_by_decode() {
        assert_eq!(
            decode_to_plain_text("<em>x</em> <strong>y</strong>"),
            "<em>x</em> **y**"
        );
    }
}
