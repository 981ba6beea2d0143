//! Explicit client session state.
//!
//! # Responsibility
//! - Carry the bearer token and user identity for authenticated calls.
//! - Give session creation and teardown a single owner.
//!
//! # Invariants
//! - A session exists only between a successful login and logout or the
//!   first authorization failure.

use crate::model::user::UserProfile;
use serde::{Deserialize, Serialize};

/// Token plus identity returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    pub fn new(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// Returns the `Authorization` header value for this session.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Holder for the current session, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSlot {
    current: Option<Session>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a session after login, replacing any previous one.
    pub fn begin(&mut self, session: Session) {
        self.current = Some(session);
    }

    /// Tears the session down and returns it.
    pub fn end(&mut self) -> Option<Session> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Returns the bearer header value when a session is active.
    pub fn bearer(&self) -> Option<String> {
        self.current.as_ref().map(Session::bearer)
    }
}

#[cfg(test)]
mod tests {
    use super::{Session, SessionSlot};
    use crate::model::user::UserProfile;
    use uuid::Uuid;

    fn profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn slot_lifecycle_begin_and_end() {
        let mut slot = SessionSlot::new();
        assert!(slot.bearer().is_none());

        slot.begin(Session::new("abc", profile()));
        assert!(slot.is_active());
        assert_eq!(slot.bearer().as_deref(), Some("Bearer abc"));

        let ended = slot.end().expect("session should be returned");
        assert_eq!(ended.token, "abc");
        assert!(!slot.is_active());
        assert!(slot.end().is_none());
    }
}
