//! JSON payloads carried on session topics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned when a payload cannot be decoded.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The bytes are not valid JSON, or the JSON does not have the expected shape.
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session lifecycle command.
///
/// Tagged by `type`. Unrecognized tags decode to [`ControlMessage::Unknown`]
/// so receivers can ignore them instead of failing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// Select the question for the next round; `None` clears it.
    Setup {
        #[serde(default, deserialize_with = "crate::id::optional")]
        question_id: Option<String>,
    },
    /// Begin answering.
    Start,
    /// Stop answering.
    Stop,
    /// Sent by a participant once its question details have loaded.
    Ready,
    /// Any tag this version does not know.
    #[serde(other)]
    Unknown,
}

impl ControlMessage {
    /// Decode from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Json`] when `type` is missing or a known
    /// variant has malformed fields.
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encode as JSON bytes for publishing.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Json`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PayloadError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Setup { .. } => "setup",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Ready => "ready",
            Self::Unknown => "unknown",
        }
    }
}

/// Body of an update message: `{"data": {"position": [...]}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    pub data: UpdateData,
}

/// Inner update data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateData {
    /// The sender's normalized weight vector.
    pub position: Vec<f64>,
}

impl UpdatePayload {
    #[must_use]
    pub fn new(position: Vec<f64>) -> Self {
        Self { data: UpdateData { position } }
    }

    /// Decode from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Json`] when the value is not an update body.
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encode as JSON bytes for publishing.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Json`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PayloadError> {
        Ok(serde_json::to_vec(self)?)
    }

    #[must_use]
    pub fn into_position(self) -> Vec<f64> {
        self.data.position
    }
}

/// An update attributed to the participant whose topic it arrived on.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateMessage {
    pub participant_id: String,
    pub position: Vec<f64>,
}

impl UpdateMessage {
    /// Decode the payload of an update received from `participant_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Json`] when the payload is not an update body.
    pub fn from_payload(participant_id: &str, payload: Value) -> Result<Self, PayloadError> {
        let payload = UpdatePayload::from_value(payload)?;
        Ok(Self { participant_id: participant_id.to_owned(), position: payload.into_position() })
    }
}

/// Parse raw payload bytes into JSON.
///
/// # Errors
///
/// Returns [`PayloadError::Json`] for anything that is not valid JSON.
pub fn parse_json(bytes: &[u8]) -> Result<Value, PayloadError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
