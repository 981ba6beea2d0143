//! Request dispatcher for the NoteX REST surface.
//!
//! # Responsibility
//! - Map `(method, path)` pairs to note and auth use-cases.
//! - Shape every outcome into the JSON envelope clients expect
//!   (`success`, `message`, payload).
//!
//! # Invariants
//! - `handle` never panics and always returns a response.
//! - Note routes run only after bearer verification; the verified user id
//!   scopes every store call.
//! - Note content is passed through untouched; the dispatcher never encodes,
//!   decodes or normalizes it.
//! - Internal error details go to the log, never into a response body.

use crate::config::ApiConfig;
use log::{error, info, warn};
use notex_core::db::{open_db, open_db_in_memory, DbResult};
use notex_core::{
    parse_bearer, AuthConfig, AuthError, AuthService, Note, NoteDraft, NoteService,
    NoteServiceError, NoteUpdate, RepoResult, SqliteNoteRepository, SqliteSessionRepository,
    SqliteUserRepository, UserId,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use uuid::Uuid;

/// HTTP verbs served by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Parses an HTTP method name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Transport-neutral request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path with optional query string, e.g. `/api/notes?q=milk`.
    pub path: String,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// JSON body; `Value::Null` when absent.
    pub body: Value,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            authorization: None,
            body: Value::Null,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_authorization(mut self, header: impl Into<String>) -> Self {
        self.authorization = Some(header.into());
        self
    }
}

/// Transport-neutral response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn failure(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "success": false, "message": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the envelope `message`, if any.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route<'a> {
    Root,
    Register,
    Login,
    Logout,
    Notes,
    Note(&'a str),
}

impl Route<'_> {
    fn label(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Register => "auth_register",
            Self::Login => "auth_login",
            Self::Logout => "auth_logout",
            Self::Notes => "notes",
            Self::Note(_) => "note_item",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginBody {
    email: String,
    password: String,
}

type AuthServiceImpl<'conn> =
    AuthService<SqliteUserRepository<'conn>, SqliteSessionRepository<'conn>>;

/// In-process NoteX API over one SQLite connection.
pub struct NotexApi {
    conn: Connection,
    auth_config: AuthConfig,
}

impl NotexApi {
    /// Opens the database named by `config` and applies migrations.
    pub fn open(config: &ApiConfig) -> DbResult<Self> {
        let conn = open_db(&config.db_path)?;
        Ok(Self::with_connection(conn, config.auth_config()))
    }

    /// Creates an API over a fresh in-memory database.
    pub fn in_memory(auth_config: AuthConfig) -> DbResult<Self> {
        Ok(Self::with_connection(open_db_in_memory()?, auth_config))
    }

    /// Wraps an already migrated connection.
    pub fn with_connection(conn: Connection, auth_config: AuthConfig) -> Self {
        Self { conn, auth_config }
    }

    /// Dispatches one request.
    pub fn handle(&mut self, request: &ApiRequest) -> ApiResponse {
        let started_at = Instant::now();
        let (path, query) = split_query(&request.path);
        let route = match_route(path);

        let response = match (request.method, route.as_ref()) {
            (Method::Get, Some(Route::Root)) => {
                ApiResponse::ok(200, json!({ "message": "NoteX API is running" }))
            }
            (Method::Post, Some(Route::Register)) => self.register(&request.body),
            (Method::Post, Some(Route::Login)) => self.login(&request.body),
            (Method::Post, Some(Route::Logout)) => self.logout(request.authorization.as_deref()),
            (Method::Get, Some(Route::Notes)) => self.authorized(request, |api, owner| {
                api.list_notes(owner, query_param(query, "q").as_deref())
            }),
            (Method::Post, Some(Route::Notes)) => {
                self.authorized(request, |api, owner| api.create_note(owner, &request.body))
            }
            (Method::Get, Some(Route::Note(id))) => {
                self.authorized(request, |api, owner| api.get_note(owner, id))
            }
            (Method::Put, Some(Route::Note(id))) => self.authorized(request, |api, owner| {
                api.update_note(owner, id, &request.body)
            }),
            (Method::Delete, Some(Route::Note(id))) => {
                self.authorized(request, |api, owner| api.delete_note(owner, id))
            }
            _ => ApiResponse::failure(404, "Route not found"),
        };

        info!(
            "event=api_request module=api method={} route={} http_status={} duration_ms={}",
            request.method.label(),
            route.as_ref().map_or("unknown", Route::label),
            response.status,
            started_at.elapsed().as_millis()
        );
        response
    }

    fn auth_service(&self) -> RepoResult<AuthServiceImpl<'_>> {
        Ok(AuthService::new(
            SqliteUserRepository::try_new(&self.conn)?,
            SqliteSessionRepository::try_new(&self.conn)?,
            self.auth_config,
        ))
    }

    fn authorized(
        &mut self,
        request: &ApiRequest,
        handler: impl FnOnce(&mut Self, UserId) -> ApiResponse,
    ) -> ApiResponse {
        let verified = self
            .auth_service()
            .map_err(AuthError::from)
            .and_then(|auth| auth.verify_bearer(request.authorization.as_deref()));
        match verified {
            Ok(owner) => handler(self, owner),
            Err(AuthError::Unauthorized) => {
                warn!("event=api_auth module=api status=rejected reason=unauthorized");
                ApiResponse::failure(401, "Not authorized")
            }
            Err(err) => {
                error!("event=api_auth module=api status=error error={err}");
                ApiResponse::failure(500, "Server error during authorization")
            }
        }
    }

    fn register(&self, body: &Value) -> ApiResponse {
        let Some(input) = parse_body::<RegisterBody>(body) else {
            return ApiResponse::failure(400, "Invalid request body");
        };
        let outcome = self.auth_service().map_err(AuthError::from).and_then(|auth| {
            auth.register(&input.name, &input.email, &input.password)
        });
        match outcome {
            Ok(_) => ApiResponse::ok(
                201,
                json!({ "success": true, "message": "User registered successfully" }),
            ),
            Err(AuthError::UserAlreadyExists) => ApiResponse::failure(400, "User already exists"),
            Err(AuthError::InvalidInput(_)) => {
                ApiResponse::failure(400, "Name, email and password are required")
            }
            Err(err) => {
                error!("event=api_register module=api status=error error={err}");
                ApiResponse::failure(500, "Server error during registration")
            }
        }
    }

    fn login(&self, body: &Value) -> ApiResponse {
        let Some(input) = parse_body::<LoginBody>(body) else {
            return ApiResponse::failure(400, "Invalid request body");
        };
        let outcome = self
            .auth_service()
            .map_err(AuthError::from)
            .and_then(|auth| auth.login(&input.email, &input.password));
        match outcome {
            Ok(session) => ApiResponse::ok(
                200,
                json!({
                    "success": true,
                    "message": "Login successful",
                    "token": session.token,
                    "user": session.user,
                }),
            ),
            Err(AuthError::InvalidCredentials | AuthError::InvalidInput(_)) => {
                ApiResponse::failure(400, "Invalid credentials")
            }
            Err(err) => {
                error!("event=api_login module=api status=error error={err}");
                ApiResponse::failure(500, "Server error during login")
            }
        }
    }

    fn logout(&self, authorization: Option<&str>) -> ApiResponse {
        let Some(token) = authorization.and_then(parse_bearer) else {
            return ApiResponse::failure(401, "Not authorized");
        };
        let outcome = self
            .auth_service()
            .map_err(AuthError::from)
            .and_then(|auth| auth.logout(token));
        match outcome {
            Ok(()) => ApiResponse::ok(200, json!({ "success": true, "message": "Logged out" })),
            Err(AuthError::Unauthorized) => ApiResponse::failure(401, "Not authorized"),
            Err(err) => {
                error!("event=api_logout module=api status=error error={err}");
                ApiResponse::failure(500, "Server error during logout")
            }
        }
    }

    fn list_notes(&mut self, owner: UserId, query: Option<&str>) -> ApiResponse {
        let outcome = self.with_note_service(|service| match query {
            Some(query) => service.search_notes(owner, query),
            None => service.list_notes(owner),
        });
        match outcome {
            Ok(notes) => ApiResponse::ok(200, json!({ "success": true, "notes": notes })),
            Err(err) => note_failure(err, "Error fetching notes"),
        }
    }

    fn get_note(&mut self, owner: UserId, raw_id: &str) -> ApiResponse {
        let Some(note_id) = parse_note_id(raw_id) else {
            return ApiResponse::failure(404, "Note not found");
        };
        match self.with_note_service(|service| service.get_note(owner, note_id)) {
            Ok(note) => note_envelope(200, None, &note),
            Err(err) => note_failure(err, "Error fetching note"),
        }
    }

    fn create_note(&mut self, owner: UserId, body: &Value) -> ApiResponse {
        let Some(draft) = parse_body::<NoteDraft>(body) else {
            return ApiResponse::failure(400, "Title and content are required");
        };
        match self.with_note_service(|service| service.create_note(owner, draft)) {
            Ok(note) => note_envelope(201, Some("Note created successfully"), &note),
            Err(err) => note_failure(err, "Error creating note"),
        }
    }

    fn update_note(&mut self, owner: UserId, raw_id: &str, body: &Value) -> ApiResponse {
        let Some(note_id) = parse_note_id(raw_id) else {
            return ApiResponse::failure(404, "Note not found");
        };
        let Some(update) = parse_body::<NoteUpdate>(body) else {
            return ApiResponse::failure(400, "Invalid request body");
        };
        match self.with_note_service(|service| service.update_note(owner, note_id, update)) {
            Ok(note) => note_envelope(200, Some("Note updated successfully"), &note),
            Err(err) => note_failure(err, "Error updating note"),
        }
    }

    fn delete_note(&mut self, owner: UserId, raw_id: &str) -> ApiResponse {
        let Some(note_id) = parse_note_id(raw_id) else {
            return ApiResponse::failure(404, "Note not found");
        };
        match self.with_note_service(|service| service.delete_note(owner, note_id)) {
            Ok(()) => ApiResponse::ok(
                200,
                json!({ "success": true, "message": "Note deleted successfully" }),
            ),
            Err(err) => note_failure(err, "Error deleting note"),
        }
    }

    fn with_note_service<T>(
        &mut self,
        f: impl FnOnce(&mut NoteService<SqliteNoteRepository<'_>>) -> Result<T, NoteServiceError>,
    ) -> Result<T, NoteServiceError> {
        let repo = SqliteNoteRepository::try_new(&mut self.conn)?;
        let mut service = NoteService::new(repo);
        f(&mut service)
    }
}

fn match_route(path: &str) -> Option<Route<'_>> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Some(Route::Root);
    }
    let segments: Vec<&str> = trimmed.trim_start_matches('/').split('/').collect();
    match segments.as_slice() {
        ["api", "auth", "register"] => Some(Route::Register),
        ["api", "auth", "login"] => Some(Route::Login),
        ["api", "auth", "logout"] => Some(Route::Logout),
        ["api", "notes"] => Some(Route::Notes),
        ["api", "notes", id] if !id.is_empty() => Some(Route::Note(id)),
        _ => None,
    }
}

fn split_query(path: &str) -> (&str, Option<&str>) {
    match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    }
}

/// Reads one query parameter, decoding `+` and `%XX` escapes.
fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| percent_decode(value))
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'+' => decoded.push(b' '),
            b'%' => match (hex_value(bytes.get(index + 1)), hex_value(bytes.get(index + 2))) {
                (Some(high), Some(low)) => {
                    decoded.push(high << 4 | low);
                    index += 2;
                }
                _ => decoded.push(b'%'),
            },
            other => decoded.push(other),
        }
        index += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(byte: Option<&u8>) -> Option<u8> {
    char::from(*byte?).to_digit(16).map(|digit| digit as u8)
}

fn parse_note_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

fn parse_body<T: for<'de> Deserialize<'de> + Default>(body: &Value) -> Option<T> {
    if body.is_null() {
        return Some(T::default());
    }
    serde_json::from_value(body.clone()).ok()
}

fn note_envelope(status: u16, message: Option<&str>, note: &Note) -> ApiResponse {
    let mut body = json!({ "success": true, "note": note });
    if let Some(message) = message {
        body["message"] = Value::String(message.to_string());
    }
    ApiResponse::ok(status, body)
}

fn note_failure(err: NoteServiceError, server_message: &str) -> ApiResponse {
    match err {
        NoteServiceError::NoteNotFound(_) => ApiResponse::failure(404, "Note not found"),
        NoteServiceError::InvalidInput(_) => {
            ApiResponse::failure(400, "Title and content are required")
        }
        other => {
            error!("event=api_notes module=api status=error error={other}");
            ApiResponse::failure(500, server_message)
        }
    }
}
