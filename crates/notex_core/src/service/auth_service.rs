//! Account registration, login and bearer-token verification.
//!
//! # Responsibility
//! - Register accounts with hashed passwords.
//! - Issue, verify and revoke bearer tokens.
//!
//! # Invariants
//! - Unknown email and wrong password produce the same `InvalidCredentials`.
//! - Raw tokens are returned once at login and never stored.
//! - Passwords and tokens never appear in log lines.

use crate::model::user::{normalize_email, User, UserId, UserProfile};
use crate::repo::session_repo::SessionRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::service::credentials::{
    generate_token, hash_password, token_digest, verify_password, BcryptError,
};
use crate::session::Session;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DEFAULT_TOKEN_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;
const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
const BEARER_PREFIX: &str = "Bearer ";

/// Tunables for credential handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthConfig {
    /// Lifetime of an issued token in milliseconds.
    pub token_ttl_ms: i64,
    /// bcrypt work factor for new password hashes (4..=31).
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_ms: DEFAULT_TOKEN_TTL_MS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

/// Authentication failure outcomes.
#[derive(Debug)]
pub enum AuthError {
    /// A required registration/login field is blank.
    InvalidInput(&'static str),
    UserAlreadyExists,
    InvalidCredentials,
    /// Missing, malformed, unknown, revoked or expired token.
    Unauthorized,
    /// bcrypt rejected the configured cost or failed to hash.
    PasswordHash(BcryptError),
    Repo(RepoError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(field) => write!(f, "missing required field `{field}`"),
            Self::UserAlreadyExists => write!(f, "user already exists"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::PasswordHash(err) => write!(f, "password hashing failed: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PasswordHash(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BcryptError> for AuthError {
    fn from(value: BcryptError) -> Self {
        Self::PasswordHash(value)
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Conflict(_) => Self::UserAlreadyExists,
            other => Self::Repo(other),
        }
    }
}

/// Authentication service over account and session repositories.
pub struct AuthService<U: UserRepository, S: SessionRepository> {
    users: U,
    sessions: S,
    config: AuthConfig,
}

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    pub fn new(users: U, sessions: S, config: AuthConfig) -> Self {
        Self {
            users,
            sessions,
            config,
        }
    }

    /// Registers a new account and returns its public profile.
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() {
            return Err(AuthError::InvalidInput("name"));
        }
        if email.is_empty() {
            return Err(AuthError::InvalidInput("email"));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password"));
        }

        if self.users.find_by_email(&email)?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email,
            password_hash: hash_password(password, self.config.bcrypt_cost)?,
            created_at: 0,
        };
        self.users.create_user(&user)?;
        info!("event=user_register module=auth status=ok user_id={}", user.id);
        Ok(user.profile())
    }

    /// Checks credentials and issues a new session.
    pub fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let Some(user) = self.users.find_by_email(email)? else {
            warn!("event=user_login module=auth status=rejected reason=unknown_email");
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash) {
            warn!(
                "event=user_login module=auth status=rejected reason=bad_password user_id={}",
                user.id
            );
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        self.sessions
            .insert_session(&token_digest(&token), user.id, self.config.token_ttl_ms)?;
        info!("event=user_login module=auth status=ok user_id={}", user.id);
        Ok(Session::new(token, user.profile()))
    }

    /// Verifies an `Authorization` header value (`Bearer <token>`).
    pub fn verify_bearer(&self, authorization: Option<&str>) -> Result<UserId, AuthError> {
        let token = authorization
            .and_then(parse_bearer)
            .ok_or(AuthError::Unauthorized)?;
        self.verify_token(token)
    }

    /// Resolves a raw token to its owner.
    pub fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        self.sessions
            .find_active_user(&token_digest(token))?
            .ok_or(AuthError::Unauthorized)
    }

    /// Loads the profile behind a verified user id.
    pub fn profile(&self, user_id: UserId) -> Result<UserProfile, AuthError> {
        self.users
            .get_user(user_id)?
            .map(|user| user.profile())
            .ok_or(AuthError::Unauthorized)
    }

    /// Revokes a token. Unknown tokens are rejected as unauthorized.
    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        if !self.sessions.delete_session(&token_digest(token))? {
            return Err(AuthError::Unauthorized);
        }
        let purged = self.sessions.purge_expired()?;
        info!("event=user_logout module=auth status=ok purged_sessions={purged}");
        Ok(())
    }
}

/// Extracts the token from a `Bearer <token>` header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let token = header.trim().strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then_some(token)
}
