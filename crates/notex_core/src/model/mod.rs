//! Domain model for notes and accounts.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Note content held by a model is storage form, never edit form.

pub mod note;
pub mod user;
