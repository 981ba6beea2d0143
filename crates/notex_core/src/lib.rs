//! Core domain logic for NoteX.
//! This crate is the single source of truth for note formatting and storage
//! invariants.

pub mod db;
pub mod editor;
pub mod format;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod session;

pub use editor::{EditorError, EditorState};
pub use format::codec::{decode_to_plain_text, encode_to_markup};
pub use format::commands::{apply_marker, MarkerEdit, MarkerKind};
pub use format::render::{render_html, styled_spans, visible_text, StyledSpan};
pub use logging::{init_logging, LogLevel, LogSettings, LoggingError};
pub use model::note::{Note, NoteDraft, NoteId, NoteUpdate, NoteValidationError};
pub use model::user::{User, UserId, UserProfile};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::session_repo::{SessionRepository, SqliteSessionRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use search::filter::{filter_notes, NoteQuery};
pub use service::auth_service::{parse_bearer, AuthConfig, AuthError, AuthService};
pub use service::note_service::{NoteService, NoteServiceError};
pub use session::{Session, SessionSlot};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
