//! Selection-scoped formatting commands.
//!
//! # Responsibility
//! - Wrap a selected character range of edit-form text in a marker pair.
//! - Report the selection that still brackets the wrapped content.
//!
//! # Invariants
//! - Offsets are whole characters, never bytes.
//! - An empty selection is a no-op.
//! - Applying the same marker twice wraps twice; there is no toggling.

use crate::format::codec::{BOLD_MARKER, HIGHLIGHT_MARKER};
use serde::{Deserialize, Serialize};

/// Inline formatting kind selectable from the editor toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Bold,
    Highlight,
}

impl MarkerKind {
    /// Returns the two-character marker for this kind.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Bold => BOLD_MARKER,
            Self::Highlight => HIGHLIGHT_MARKER,
        }
    }

    /// Parses a user-facing kind label.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bold" | "b" | "**" => Some(Self::Bold),
            "highlight" | "hl" | "mark" | "==" => Some(Self::Highlight),
            _ => None,
        }
    }
}

/// Result of [`apply_marker`]: new text plus the selection to restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerEdit {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Wraps `text[start..end]` (character offsets) in the marker for `kind`.
///
/// Out-of-range offsets are clamped to the text length and a reversed range
/// is normalized, so arbitrary widget input never panics.
pub fn apply_marker(text: &str, start: usize, end: usize, kind: MarkerKind) -> MarkerEdit {
    let char_len = text.chars().count();
    let (start, end) = normalize_range(start, end, char_len);

    if start == end {
        return MarkerEdit {
            text: text.to_string(),
            start,
            end,
        };
    }

    let marker = kind.marker();
    let start_byte = byte_offset(text, start);
    let end_byte = byte_offset(text, end);

    let mut wrapped = String::with_capacity(text.len() + marker.len() * 2);
    wrapped.push_str(&text[..start_byte]);
    wrapped.push_str(marker);
    wrapped.push_str(&text[start_byte..end_byte]);
    wrapped.push_str(marker);
    wrapped.push_str(&text[end_byte..]);

    let shift = marker.chars().count();
    MarkerEdit {
        text: wrapped,
        start: start + shift,
        end: end + shift,
    }
}

fn normalize_range(start: usize, end: usize, char_len: usize) -> (usize, usize) {
    let start = start.min(char_len);
    let end = end.min(char_len);
    if start <= end {
        (start, end)
    } else {
        (end, start)
    }
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(offset, _)| offset)
}
