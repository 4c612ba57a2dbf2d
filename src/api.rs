//! Session REST collaborator.
//!
//! DESIGN
//! ======
//! The client consumes three endpoints: session info, question details, and
//! participant registration. [`SessionApi`] is that surface. [`HttpApi`] talks
//! to a real server with `reqwest`; [`MemoryApi`] serves an in-process catalog
//! for the simulation and tests.
//!
//! Errors are returned, never retried. The session state machine logs them
//! and stays where it was.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tokio::sync::RwLock;
use wire::rest::{participants_path, question_image_path, question_path, session_path};
use wire::{JoinRequest, Participant, QuestionRecord, SessionInfo};

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },
}

#[async_trait::async_trait]
pub trait SessionApi: Send + Sync {
    /// `GET /api/session/{id}`
    async fn fetch_session(&self, session_id: &str) -> Result<SessionInfo, FetchError>;

    /// `GET /api/question/{id}`
    async fn fetch_question(&self, question_id: &str) -> Result<QuestionRecord, FetchError>;

    /// `POST /api/session/{id}/participants`
    async fn join_session(&self, session_id: &str, user: &str) -> Result<Participant, FetchError>;

    /// Where the question's image can be loaded from.
    fn image_url(&self, question_id: &str) -> String {
        question_image_path(question_id)
    }
}

// =============================================================================
// HTTP
// =============================================================================

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Build a client for `base_url`. `timeout` bounds whole requests; `None`
    /// leaves them unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Request`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { http: builder.build()?, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, FetchError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body: text });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait::async_trait]
impl SessionApi for HttpApi {
    async fn fetch_session(&self, session_id: &str) -> Result<SessionInfo, FetchError> {
        let response = self.http.get(self.url(&session_path(session_id))).send().await?;
        Self::read(response).await
    }

    async fn fetch_question(&self, question_id: &str) -> Result<QuestionRecord, FetchError> {
        let response = self.http.get(self.url(&question_path(question_id))).send().await?;
        Self::read(response).await
    }

    async fn join_session(&self, session_id: &str, user: &str) -> Result<Participant, FetchError> {
        let body = JoinRequest { user: user.to_owned() };
        let response = self.http.post(self.url(&participants_path(session_id))).json(&body).send().await?;
        Self::read(response).await
    }

    fn image_url(&self, question_id: &str) -> String {
        self.url(&question_image_path(question_id))
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// In-process stand-in for the session server.
#[derive(Default)]
pub struct MemoryApi {
    questions: RwLock<HashMap<String, QuestionRecord>>,
    sessions: RwLock<HashMap<String, SessionInfo>>,
    next_participant: AtomicU64,
}

impl MemoryApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_question(mut self, question: QuestionRecord) -> Self {
        self.questions.get_mut().insert(question.id.clone(), question);
        self
    }

    #[must_use]
    pub fn with_session(mut self, session_id: &str, question_id: Option<&str>) -> Self {
        let info = SessionInfo { question_id: question_id.map(str::to_owned) };
        self.sessions.get_mut().insert(session_id.to_owned(), info);
        self
    }

    /// Change the question a session reports to newly joining clients.
    pub async fn set_session_question(&self, session_id: &str, question_id: Option<&str>) {
        let info = SessionInfo { question_id: question_id.map(str::to_owned) };
        self.sessions.write().await.insert(session_id.to_owned(), info);
    }
}

#[async_trait::async_trait]
impl SessionApi for MemoryApi {
    async fn fetch_session(&self, session_id: &str) -> Result<SessionInfo, FetchError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound { resource: "session", id: session_id.to_owned() })
    }

    async fn fetch_question(&self, question_id: &str) -> Result<QuestionRecord, FetchError> {
        self.questions
            .read()
            .await
            .get(question_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound { resource: "question", id: question_id.to_owned() })
    }

    async fn join_session(&self, session_id: &str, user: &str) -> Result<Participant, FetchError> {
        if !self.sessions.read().await.contains_key(session_id) {
            return Err(FetchError::NotFound { resource: "session", id: session_id.to_owned() });
        }
        let id = self.next_participant.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Participant { username: user.to_owned(), id: id.to_string() })
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
