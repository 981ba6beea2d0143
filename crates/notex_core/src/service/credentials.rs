//! Password hashing and bearer-token primitives.
//!
//! # Invariants
//! - Stored password hashes are bcrypt strings (`$2b$<cost>$<salt+hash>`);
//!   cost and salt travel with the hash.
//! - Tokens are 64 lowercase hex chars; only their SHA-256 digest is
//!   persisted.

use sha2::{Digest, Sha256};
use uuid::Uuid;

pub use bcrypt::BcryptError;

/// Hashes `password` with bcrypt at `cost` and a fresh random salt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(password, cost)
}

/// Checks `password` against a stored bcrypt hash. Malformed hashes never
/// verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

/// Generates a new random bearer token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    hex::encode(bytes)
}

/// Returns the digest under which a token is stored.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
