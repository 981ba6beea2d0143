//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist storage-form note content verbatim.
//! - Own attachment-name replacement with atomic semantics.
//!
//! # Invariants
//! - All note queries are constrained by `user_uuid`.
//! - `content` is written and read back byte-for-byte; no normalization.
//! - Attachment names keep insertion order (`position`).
//! - Timestamps are Unix milliseconds. Each write stamps `updated_at`
//!   strictly after every other note of the same owner, so lists ordered by
//!   `updated_at DESC` are newest first even for writes in the same
//!   millisecond.

use crate::model::note::{Note, NoteDraft, NoteId, NoteUpdate};
use crate::model::user::UserId;
use crate::repo::{ensure_schema, parse_uuid, RepoError, RepoResult, NOW_MS_SQL};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

/// One past the owner's latest `updated_at`, 0 when the owner has no notes.
/// Expects the owner bound as `?2`.
const NEXT_OWNER_STAMP_SQL: &str =
    "(SELECT COALESCE(MAX(updated_at) + 1, 0) FROM notes WHERE user_uuid = ?2)";

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    title,
    content,
    created_at,
    updated_at
FROM notes";

/// Repository interface for per-user note storage.
pub trait NoteRepository {
    /// Inserts one note for `owner` under the caller-provided id.
    fn create_note(&mut self, owner: UserId, note_id: NoteId, draft: &NoteDraft)
        -> RepoResult<NoteId>;
    /// Applies a partial update and bumps `updated_at`.
    fn update_note(&mut self, owner: UserId, note_id: NoteId, update: &NoteUpdate)
        -> RepoResult<()>;
    /// Gets one note owned by `owner`.
    fn get_note(&self, owner: UserId, note_id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists notes owned by `owner`, newest first.
    fn list_notes(&self, owner: UserId) -> RepoResult<Vec<Note>>;
    /// Hard-deletes one note owned by `owner`.
    fn delete_note(&mut self, owner: UserId, note_id: NoteId) -> RepoResult<()>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            "notes",
            &["uuid", "user_uuid", "title", "content", "created_at", "updated_at"],
        )?;
        ensure_schema(conn, "note_attachments", &["note_uuid", "position", "file_name"])?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(
        &mut self,
        owner: UserId,
        note_id: NoteId,
        draft: &NoteDraft,
    ) -> RepoResult<NoteId> {
        draft.validate()?;
        if note_id.is_nil() {
            return Err(RepoError::InvalidData("note id must not be nil".to_string()));
        }

        let note_text = note_id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            &format!(
                "INSERT INTO notes (uuid, user_uuid, title, content, created_at, updated_at)
                 SELECT ?1, ?2, ?3, ?4, stamp, stamp
                 FROM (SELECT MAX({NOW_MS_SQL}, {NEXT_OWNER_STAMP_SQL}) AS stamp);"
            ),
            params![
                note_text.as_str(),
                owner.to_string(),
                draft.title.as_str(),
                draft.content.as_str(),
            ],
        )?;
        replace_attachments_in_tx(&tx, note_text.as_str(), &draft.attachments)?;
        tx.commit()?;

        Ok(note_id)
    }

    fn update_note(
        &mut self,
        owner: UserId,
        note_id: NoteId,
        update: &NoteUpdate,
    ) -> RepoResult<()> {
        let note_text = note_id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            &format!(
                "UPDATE notes
                 SET
                    title = COALESCE(?3, title),
                    content = COALESCE(?4, content),
                    updated_at = MAX({NOW_MS_SQL}, created_at, {NEXT_OWNER_STAMP_SQL})
                 WHERE uuid = ?1
                   AND user_uuid = ?2;"
            ),
            params![
                note_text.as_str(),
                owner.to_string(),
                update.effective_title(),
                update.effective_content(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(note_id));
        }

        if let Some(attachments) = update.attachments.as_ref() {
            replace_attachments_in_tx(&tx, note_text.as_str(), attachments)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_note(&self, owner: UserId, note_id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE uuid = ?1
               AND user_uuid = ?2;"
        ))?;

        let mut rows = stmt.query(params![note_id.to_string(), owner.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(self.conn, row)?));
        }

        Ok(None)
    }

    fn list_notes(&self, owner: UserId) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE user_uuid = ?1
             ORDER BY updated_at DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(self.conn, row)?);
        }

        Ok(notes)
    }

    fn delete_note(&mut self, owner: UserId, note_id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM notes WHERE uuid = ?1 AND user_uuid = ?2;",
            params![note_id.to_string(), owner.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note_id));
        }

        Ok(())
    }
}

fn parse_note_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "notes.uuid")?;
    let owner_text: String = row.get("user_uuid")?;
    let user_id = parse_uuid(&owner_text, "notes.user_uuid")?;

    let note = Note {
        id,
        user_id,
        title: row.get("title")?,
        content: row.get("content")?,
        attachments: load_attachments(conn, &uuid_text)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    note.validate()?;
    Ok(note)
}

fn load_attachments(conn: &Connection, note_uuid: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT file_name
         FROM note_attachments
         WHERE note_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([note_uuid])?;
    let mut names = Vec::new();
    while let Some(row) = rows.next()? {
        names.push(row.get(0)?);
    }
    Ok(names)
}

fn replace_attachments_in_tx(
    tx: &Transaction<'_>,
    note_uuid: &str,
    attachments: &[String],
) -> RepoResult<()> {
    tx.execute(
        "DELETE FROM note_attachments WHERE note_uuid = ?1;",
        [note_uuid],
    )?;

    for (position, file_name) in attachments.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| RepoError::InvalidData("too many attachments".to_string()))?;
        tx.execute(
            "INSERT INTO note_attachments (note_uuid, position, file_name)
             VALUES (?1, ?2, ?3);",
            params![note_uuid, position, file_name.as_str()],
        )?;
    }
    Ok(())
}
