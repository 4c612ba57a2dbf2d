//! REST bodies and paths for the session API.

use serde::{Deserialize, Serialize};

/// `GET /api/session/{id}` response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Question currently set up for the session, if any.
    #[serde(default, deserialize_with = "crate::id::optional")]
    pub question_id: Option<String>,
}

/// `GET /api/question/{id}` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(deserialize_with = "crate::id::required")]
    pub id: String,
    pub prompt: String,
    /// Answer labels in vertex order.
    pub answers: Vec<String>,
}

/// `POST /api/session/{id}/participants` request body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub user: String,
}

/// `POST /api/session/{id}/participants` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub username: String,
    #[serde(deserialize_with = "crate::id::required")]
    pub id: String,
}

#[must_use]
pub fn session_path(session_id: &str) -> String {
    format!("/api/session/{session_id}")
}

#[must_use]
pub fn participants_path(session_id: &str) -> String {
    format!("/api/session/{session_id}/participants")
}

#[must_use]
pub fn question_path(question_id: &str) -> String {
    format!("/api/question/{question_id}")
}

/// Image resource derived from the question id.
#[must_use]
pub fn question_image_path(question_id: &str) -> String {
    format!("/api/question/{question_id}/image")
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
