//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep API/client layers decoupled from storage details.

pub mod auth_service;
pub mod credentials;
pub mod note_service;
