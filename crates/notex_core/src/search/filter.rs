//! Case-insensitive substring filter over note title and visible content.
//!
//! # Invariants
//! - A blank query matches every note.
//! - Content is matched on its visible text, so markup tag names never
//!   produce hits.
//! - Input order is preserved.

use crate::format::render::visible_text;
use crate::model::note::Note;

/// Normalized search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteQuery {
    needle: Option<String>,
}

impl NoteQuery {
    /// Trims and lowercases the raw query; blank input matches everything.
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        Self {
            needle: (!trimmed.is_empty()).then(|| trimmed.to_lowercase()),
        }
    }

    /// Returns whether this query matches every note.
    pub fn is_match_all(&self) -> bool {
        self.needle.is_none()
    }

    /// Returns whether `note` matches this query.
    pub fn matches(&self, note: &Note) -> bool {
        let Some(needle) = self.needle.as_deref() else {
            return true;
        };
        note.title.to_lowercase().contains(needle)
            || visible_text(&note.content).to_lowercase().contains(needle)
    }
}

/// Keeps notes matching `raw_query`, preserving order.
pub fn filter_notes(notes: Vec<Note>, raw_query: &str) -> Vec<Note> {
    let query = NoteQuery::new(raw_query);
    if query.is_match_all() {
        return notes;
    }
    notes.into_iter().filter(|note| query.matches(note)).collect()
}
