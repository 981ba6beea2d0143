//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and its write-side inputs.
//! - Validate records before they reach storage.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `content` is always storage form (see `format::codec`).
//! - `title` and `content` are never blank.
//! - `updated_at` is not earlier than `created_at`.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// Persisted note resource.
///
/// Serialized with camelCase field names to match the JSON note resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// Owner; every store call is scoped by this value.
    pub user_id: UserId,
    pub title: String,
    /// Storage-form body, persisted verbatim.
    pub content: String,
    /// Attachment file names only; file content is not stored.
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Note {
    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.is_nil() {
            return Err(NoteValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::BlankTitle);
        }
        if self.content.trim().is_empty() {
            return Err(NoteValidationError::BlankContent);
        }
        if self.updated_at < self.created_at {
            return Err(NoteValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }
}

/// Input for creating a note. `content` is storage form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl NoteDraft {
    /// Checks that title and content are present.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::BlankTitle);
        }
        if self.content.trim().is_empty() {
            return Err(NoteValidationError::BlankContent);
        }
        Ok(())
    }
}

/// Partial update input.
///
/// Blank or missing fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
}

impl NoteUpdate {
    /// Returns the title to write, if any.
    pub fn effective_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|value| !value.trim().is_empty())
    }

    /// Returns the content to write, if any.
    pub fn effective_content(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    NilId,
    BlankTitle,
    BlankContent,
    UpdatedBeforeCreated { created_at: i64, updated_at: i64 },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "note id must not be nil"),
            Self::BlankTitle => write!(f, "note title must not be blank"),
            Self::BlankContent => write!(f, "note content must not be blank"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must be >= created_at ({created_at})"
            ),
        }
    }
}

impl Error for NoteValidationError {}
