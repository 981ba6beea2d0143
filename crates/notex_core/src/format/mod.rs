//! Inline formatting for note content.
//!
//! # Responsibility
//! - Own the edit-form / storage-form conversion of note bodies.
//! - Provide selection commands and a safe renderer for stored content.
//!
//! # Invariants
//! - Every function here is pure: no I/O, no shared state, never fails.
//! - Storage form is exactly what the store persists and returns.

pub mod codec;
pub mod commands;
pub mod render;
