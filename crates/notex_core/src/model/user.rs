//! User account model.
//!
//! # Invariants
//! - `email` is stored trimmed and lowercase; it is the login key.
//! - `password_hash` never leaves core; `UserProfile` is the public shape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a user account.
pub type UserId = Uuid;

/// Stored account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// bcrypt hash string (`$2b$<cost>$...`).
    pub password_hash: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl User {
    /// Returns the public projection of this account.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public account projection returned by login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Normalizes an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
