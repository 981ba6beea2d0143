//! Note search entry points.
//!
//! # Responsibility
//! - Filter a user's notes by a free-text query.
//! - Keep search matching rules inside core.

pub mod filter;
