//! Client-side session and note workflow over [`NotexApi`].
//!
//! # Responsibility
//! - Hold the active session and attach its bearer to every note request.
//! - Drive the editor round trip: fetch, open for edit, save, delete.
//!
//! # Invariants
//! - Any 401 from a note route clears the session.
//! - Content leaves the client in storage form only (`EditorState::to_draft`).

use crate::api::{ApiRequest, ApiResponse, NotexApi};
use log::{info, warn};
use notex_core::{EditorError, EditorState, Note, NoteId, Session, SessionSlot, UserProfile};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Client-side failure.
#[derive(Debug)]
pub enum ClientError {
    /// No session is active; the user must log in.
    NotLoggedIn,
    /// The server rejected the bearer; the session was cleared.
    SessionExpired,
    /// Editor-side validation failed before any request was sent.
    Editor(EditorError),
    /// The server answered with a non-success status.
    Rejected { status: u16, message: String },
    /// The response body did not have the expected shape.
    InvalidResponse(String),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotLoggedIn => write!(f, "not logged in"),
            Self::SessionExpired => write!(f, "session expired, please log in again"),
            Self::Editor(err) => write!(f, "{err}"),
            Self::Rejected { status, message } => write!(f, "{message} (status {status})"),
            Self::InvalidResponse(details) => write!(f, "invalid response: {details}"),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Editor(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EditorError> for ClientError {
    fn from(value: EditorError) -> Self {
        Self::Editor(value)
    }
}

/// Stateful client bound to one API instance.
pub struct NotexClient<'api> {
    api: &'api mut NotexApi,
    session: SessionSlot,
}

impl<'api> NotexClient<'api> {
    pub fn new(api: &'api mut NotexApi) -> Self {
        Self {
            api,
            session: SessionSlot::new(),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.current()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_active()
    }

    /// Creates an account. Does not log in.
    pub fn register(&mut self, name: &str, email: &str, password: &str) -> Result<(), ClientError> {
        let response = self.api.handle(&ApiRequest::post(
            "/api/auth/register",
            json!({ "name": name, "email": email, "password": password }),
        ));
        expect_success(&response).map(|_| ())
    }

    /// Logs in, stores the issued session and returns the user profile.
    pub fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        let response = self.api.handle(&ApiRequest::post(
            "/api/auth/login",
            json!({ "email": email, "password": password }),
        ));
        let body = expect_success(&response)?;
        let token: String = field(body, "token")?;
        let user: UserProfile = field(body, "user")?;
        info!("event=client_login module=client status=ok user_id={}", user.id);
        self.session.begin(Session::new(token, user.clone()));
        Ok(user)
    }

    /// Ends the session locally; the server-side revoke is best effort.
    pub fn logout(&mut self) {
        let Some(session) = self.session.end() else {
            return;
        };
        let response = self.api.handle(
            &ApiRequest::post("/api/auth/logout", Value::Null)
                .with_authorization(session.bearer()),
        );
        if !response.is_success() {
            warn!(
                "event=client_logout module=client status=ignored http_status={}",
                response.status
            );
        }
    }

    /// Lists notes, optionally filtered by `query`.
    pub fn fetch_notes(&mut self, query: Option<&str>) -> Result<Vec<Note>, ClientError> {
        let path = match query.map(str::trim).filter(|query| !query.is_empty()) {
            Some(query) => format!("/api/notes?q={}", encode_query(query)),
            None => "/api/notes".to_string(),
        };
        let body = self.send(ApiRequest::get(path))?;
        field(&body, "notes")
    }

    /// Loads one note into an editor in edit form.
    pub fn open_for_edit(&mut self, note_id: NoteId) -> Result<EditorState, ClientError> {
        let body = self.send(ApiRequest::get(format!("/api/notes/{note_id}")))?;
        let note: Note = field(&body, "note")?;
        Ok(EditorState::open(&note))
    }

    /// Creates or updates the note behind `editor`.
    pub fn save(&mut self, editor: &EditorState) -> Result<Note, ClientError> {
        let draft = editor.to_draft()?;
        let payload = json!({
            "title": draft.title,
            "content": draft.content,
            "attachments": draft.attachments,
        });
        let request = match editor.editing() {
            Some(note_id) => ApiRequest::put(format!("/api/notes/{note_id}"), payload),
            None => ApiRequest::post("/api/notes", payload),
        };
        let body = self.send(request)?;
        field(&body, "note")
    }

    pub fn delete_note(&mut self, note_id: NoteId) -> Result<(), ClientError> {
        self.send(ApiRequest::delete(format!("/api/notes/{note_id}")))
            .map(|_| ())
    }

    fn send(&mut self, request: ApiRequest) -> Result<Value, ClientError> {
        let bearer = self.session.bearer().ok_or(ClientError::NotLoggedIn)?;
        let response = self.api.handle(&request.with_authorization(bearer));
        if response.status == 401 {
            self.session.end();
            warn!("event=client_session module=client status=expired");
            return Err(ClientError::SessionExpired);
        }
        expect_success(&response).cloned()
    }
}

fn expect_success(response: &ApiResponse) -> Result<&Value, ClientError> {
    if response.is_success() {
        return Ok(&response.body);
    }
    Err(ClientError::Rejected {
        status: response.status,
        message: response.message().unwrap_or("request failed").to_string(),
    })
}

fn field<T: DeserializeOwned>(body: &Value, name: &str) -> Result<T, ClientError> {
    let value = body
        .get(name)
        .ok_or_else(|| ClientError::InvalidResponse(format!("missing `{name}`")))?;
    serde_json::from_value(value.clone())
        .map_err(|err| ClientError::InvalidResponse(format!("bad `{name}`: {err}")))
}

fn encode_query(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(char::from(byte))
            }
            b' ' => encoded.push('+'),
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}
