//! Editor state for one note being composed or edited.
//!
//! # Responsibility
//! - Hold edit-form text, title, attachment names and the current selection.
//! - Decode stored content when a note is opened, encode it when a draft is
//!   produced; nowhere else.
//!
//! # Invariants
//! - `content` is always edit form.
//! - `selection` is a character range with `start <= end <= content length`.

use crate::format::codec::{decode_to_plain_text, encode_to_markup};
use crate::format::commands::{apply_marker, MarkerKind};
use crate::model::note::{Note, NoteDraft, NoteId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Editor-side validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorError {
    /// Title or content is blank.
    MissingTitleOrContent,
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitleOrContent => write!(f, "Title and content are required"),
        }
    }
}

impl Error for EditorError {}

/// Composition state backing the note editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    editing: Option<NoteId>,
    pub title: String,
    content: String,
    attachments: Vec<String>,
    selection: (usize, usize),
}

impl EditorState {
    /// Starts an empty editor for a new note.
    pub fn new_note() -> Self {
        Self::default()
    }

    /// Opens a stored note for editing, decoding its content to edit form.
    pub fn open(note: &Note) -> Self {
        Self {
            editing: Some(note.id),
            title: note.title.clone(),
            content: decode_to_plain_text(&note.content),
            attachments: note.attachments.clone(),
            selection: (0, 0),
        }
    }

    /// Id of the note being edited, `None` for a new note.
    pub fn editing(&self) -> Option<NoteId> {
        self.editing
    }

    /// Current edit-form content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replaces the content as typed by the user and collapses the selection
    /// to the end of the text.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        let end = self.content.chars().count();
        self.selection = (end, end);
    }

    pub fn attachments(&self) -> &[String] {
        &self.attachments
    }

    /// Records attachment file names; content is never read.
    pub fn attach<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attachments.extend(names.into_iter().map(Into::into));
    }

    pub fn selection(&self) -> (usize, usize) {
        self.selection
    }

    /// Sets the selection, clamped to the content and normalized.
    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.content.chars().count();
        let (start, end) = (start.min(len), end.min(len));
        self.selection = if start <= end { (start, end) } else { (end, start) };
    }

    /// Whether a non-empty range is selected (drives the formatting popup).
    pub fn has_selection(&self) -> bool {
        self.selection.0 != self.selection.1
    }

    pub fn apply_bold(&mut self) {
        self.apply(MarkerKind::Bold);
    }

    pub fn apply_highlight(&mut self) {
        self.apply(MarkerKind::Highlight);
    }

    /// Wraps the current selection and restores the shifted selection.
    pub fn apply(&mut self, kind: MarkerKind) {
        let (start, end) = self.selection;
        let edit = apply_marker(&self.content, start, end, kind);
        self.content = edit.text;
        self.selection = (edit.start, edit.end);
    }

    /// Produces a storage-form draft ready to send to the store.
    pub fn to_draft(&self) -> Result<NoteDraft, EditorError> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(EditorError::MissingTitleOrContent);
        }
        Ok(NoteDraft {
            title: self.title.clone(),
            content: encode_to_markup(&self.content),
            attachments: self.attachments.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorError, EditorState};
    use crate::model::note::Note;
    use uuid::Uuid;

    #[test]
    fn open_decodes_and_to_draft_encodes() {
        let note = Note {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Plan".to_string(),
            content: "a <strong>b</strong> <mark>c</mark>".to_string(),
            attachments: vec!["plan.pdf".to_string()],
            created_at: 1,
            updated_at: 2,
        };

        let editor = EditorState::open(&note);
        assert_eq!(editor.editing(), Some(note.id));
        assert_eq!(editor.content(), "a **b** ==c==");

        let draft = editor.to_draft().unwrap();
        assert_eq!(draft.content, note.content);
        assert_eq!(draft.attachments, note.attachments);
    }

    #[test]
    fn bold_then_highlight_on_selection() {
        let mut editor = EditorState::new_note();
        editor.set_content("hello world");
        editor.select(6, 11);
        editor.apply_bold();
        assert_eq!(editor.content(), "hello **world**");
        assert_eq!(editor.selection(), (8, 13));

        editor.apply_highlight();
        assert_eq!(editor.content(), "hello **==world==**");
        assert_eq!(editor.selection(), (10, 15));
    }

    #[test]
    fn formatting_without_selection_is_noop() {
        let mut editor = EditorState::new_note();
        editor.set_content("hello");
        assert!(!editor.has_selection());
        editor.apply_bold();
        assert_eq!(editor.content(), "hello");
    }

    #[test]
    fn blank_title_or_content_is_rejected() {
        let mut editor = EditorState::new_note();
        editor.set_content("body");
        assert_eq!(
            editor.to_draft().unwrap_err(),
            EditorError::MissingTitleOrContent
        );

        editor.title = "t".to_string();
        editor.set_content("   ");
        assert!(editor.to_draft().is_err());
    }
}
