//! Bearer-token session repository.
//!
//! # Invariants
//! - Only SHA-256 digests of tokens are stored.
//! - A session is active while `expires_at` is strictly in the future.

use crate::model::user::UserId;
use crate::repo::{ensure_schema, parse_uuid, RepoResult, NOW_MS_SQL};
use rusqlite::{params, Connection};

/// Repository interface for issued bearer tokens.
pub trait SessionRepository {
    /// Stores a token digest that expires `ttl_ms` from now.
    fn insert_session(&self, token_hash: &str, user_id: UserId, ttl_ms: i64) -> RepoResult<()>;
    /// Returns the owner of an unexpired token digest.
    fn find_active_user(&self, token_hash: &str) -> RepoResult<Option<UserId>>;
    /// Revokes one token digest. Returns whether a row was removed.
    fn delete_session(&self, token_hash: &str) -> RepoResult<bool>;
    /// Removes expired sessions and returns how many were dropped.
    fn purge_expired(&self) -> RepoResult<usize>;
}

/// SQLite-backed session repository.
pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            "sessions",
            &["token_hash", "user_uuid", "created_at", "expires_at"],
        )?;
        Ok(Self { conn })
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn insert_session(&self, token_hash: &str, user_id: UserId, ttl_ms: i64) -> RepoResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO sessions (token_hash, user_uuid, created_at, expires_at)
                 VALUES (?1, ?2, {NOW_MS_SQL}, {NOW_MS_SQL} + ?3);"
            ),
            params![token_hash, user_id.to_string(), ttl_ms],
        )?;
        Ok(())
    }

    fn find_active_user(&self, token_hash: &str) -> RepoResult<Option<UserId>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT user_uuid
             FROM sessions
             WHERE token_hash = ?1
               AND expires_at > {NOW_MS_SQL};"
        ))?;
        let mut rows = stmt.query([token_hash])?;
        match rows.next()? {
            Some(row) => {
                let user_text: String = row.get(0)?;
                Ok(Some(parse_uuid(&user_text, "sessions.user_uuid")?))
            }
            None => Ok(None),
        }
    }

    fn delete_session(&self, token_hash: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE token_hash = ?1;", [token_hash])?;
        Ok(changed > 0)
    }

    fn purge_expired(&self) -> RepoResult<usize> {
        let changed = self.conn.execute(
            &format!("DELETE FROM sessions WHERE expires_at <= {NOW_MS_SQL};"),
            [],
        )?;
        Ok(changed)
    }
}
