//! Account repository contract and SQLite implementation.
//!
//! # Invariants
//! - Emails are unique case-insensitively; duplicates surface as
//!   `RepoError::Conflict`.

use crate::model::user::{normalize_email, User, UserId};
use crate::repo::{ensure_schema, is_unique_violation, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    email,
    password_hash,
    created_at
FROM users";

/// Repository interface for user accounts.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
}

/// SQLite-backed account repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            "users",
            &["uuid", "name", "email", "password_hash", "created_at"],
        )?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        let email = normalize_email(&user.email);
        let inserted = self.conn.execute(
            "INSERT INTO users (uuid, name, email, password_hash)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.name.as_str(),
                email.as_str(),
                user.password_hash.as_str(),
            ],
        );

        match inserted {
            Ok(_) => Ok(user.id),
            Err(err) if is_unique_violation(&err) => {
                Err(RepoError::Conflict(format!("email `{email}` already registered")))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE email = ?1 COLLATE NOCASE;"))?;
        let mut rows = stmt.query([normalize_email(email)])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    Ok(User {
        id: parse_uuid(&uuid_text, "users.uuid")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
    })
}
