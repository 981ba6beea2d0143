//! NoteX service surface: request dispatch, runtime configuration and the
//! session-holding client.
//!
//! Transport is left to the embedder; requests and responses are plain
//! values carrying JSON bodies.

pub mod api;
pub mod client;
pub mod config;

pub use api::{ApiRequest, ApiResponse, Method, NotexApi};
pub use client::{ClientError, NotexClient};
pub use config::{ApiConfig, ConfigError};
pub use notex_core::{core_version, ping};
