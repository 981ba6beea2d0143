//! Note use-case service.
//!
//! # Responsibility
//! - Provide per-user create/update/get/list/search/delete APIs.
//! - Keep storage-form content opaque: the service never re-encodes or
//!   normalizes `content`.
//!
//! # Invariants
//! - Create requires non-blank title and content.
//! - Update only replaces fields supplied non-blank.
//! - Every call is scoped by the verified owner id.

use crate::model::note::{Note, NoteDraft, NoteId, NoteUpdate, NoteValidationError};
use crate::model::user::UserId;
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoError;
use crate::search::filter::filter_notes;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title or content missing on create.
    InvalidInput(NoteValidationError),
    /// Target note does not exist for this owner.
    NoteNotFound(NoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid note input: {err}"),
            Self::NoteNotFound(note_id) => write!(f, "note not found: {note_id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(note_id) => Self::NoteNotFound(note_id),
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note from a storage-form draft.
    pub fn create_note(&mut self, owner: UserId, draft: NoteDraft) -> Result<Note, NoteServiceError> {
        let draft = NoteDraft {
            attachments: normalize_attachments(draft.attachments),
            ..draft
        };
        draft.validate()?;

        let note_id = self.repo.create_note(owner, Uuid::new_v4(), &draft)?;
        info!("event=note_create module=service status=ok note_id={note_id}");
        self.repo
            .get_note(owner, note_id)?
            .ok_or(NoteServiceError::InconsistentState(
                "created note not found in read-back",
            ))
    }

    /// Applies a partial update and returns the stored note.
    pub fn update_note(
        &mut self,
        owner: UserId,
        note_id: NoteId,
        update: NoteUpdate,
    ) -> Result<Note, NoteServiceError> {
        let update = NoteUpdate {
            attachments: update.attachments.map(normalize_attachments),
            ..update
        };
        self.repo.update_note(owner, note_id, &update)?;
        info!("event=note_update module=service status=ok note_id={note_id}");

        self.repo
            .get_note(owner, note_id)?
            .ok_or(NoteServiceError::InconsistentState(
                "updated note not found in read-back",
            ))
    }

    /// Creates when `note_id` is `None`, otherwise updates that note.
    pub fn save_note(
        &mut self,
        owner: UserId,
        note_id: Option<NoteId>,
        draft: NoteDraft,
    ) -> Result<Note, NoteServiceError> {
        match note_id {
            None => self.create_note(owner, draft),
            Some(note_id) => self.update_note(
                owner,
                note_id,
                NoteUpdate {
                    title: Some(draft.title),
                    content: Some(draft.content),
                    attachments: Some(draft.attachments),
                },
            ),
        }
    }

    /// Loads one note; absent and foreign notes both read as not found.
    pub fn get_note(&self, owner: UserId, note_id: NoteId) -> Result<Note, NoteServiceError> {
        self.repo
            .get_note(owner, note_id)?
            .ok_or(NoteServiceError::NoteNotFound(note_id))
    }

    /// Lists every note of `owner`, most recently updated first.
    pub fn list_notes(&self, owner: UserId) -> Result<Vec<Note>, NoteServiceError> {
        Ok(self.repo.list_notes(owner)?)
    }

    /// Lists notes of `owner` whose title or visible content contains `query`.
    pub fn search_notes(&self, owner: UserId, query: &str) -> Result<Vec<Note>, NoteServiceError> {
        let notes = self.list_notes(owner)?;
        Ok(filter_notes(notes, query))
    }

    /// Permanently deletes one note.
    pub fn delete_note(&mut self, owner: UserId, note_id: NoteId) -> Result<(), NoteServiceError> {
        self.repo.delete_note(owner, note_id)?;
        info!("event=note_delete module=service status=ok note_id={note_id}");
        Ok(())
    }
}

/// Trims attachment names and drops blank ones, keeping order.
pub fn normalize_attachments(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::normalize_attachments;

    #[test]
    fn attachments_are_trimmed_and_blank_names_dropped() {
        let names = vec![
            " report.pdf ".to_string(),
            "   ".to_string(),
            "photo.png".to_string(),
        ];
        assert_eq!(
            normalize_attachments(names),
            vec!["report.pdf".to_string(), "photo.png".to_string()]
        );
    }
}
