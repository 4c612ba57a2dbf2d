//! Shared wire contract for swarm sessions.
//!
//! This crate owns everything that crosses a process boundary: the pub/sub
//! topic layout, the JSON payloads carried on those topics, and the REST
//! bodies exchanged with the session API. It has no I/O of its own; the
//! client crate and the CLI both build on it.
//!
//! Topics are `/`-separated and always rooted at `swarm/session/<sid>`:
//!
//! ```text
//! swarm/session/<sid>/control[/<pid>]    lifecycle commands
//! swarm/session/<sid>/updates/<pid>      per-participant weight vectors
//! ```

pub mod message;
pub mod rest;
pub mod topic;

pub use message::{ControlMessage, PayloadError, UpdateData, UpdateMessage, UpdatePayload};
pub use rest::{JoinRequest, Participant, QuestionRecord, SessionInfo};
pub use topic::{Topic, TopicError, parse_topic, topic_matches};

/// Deserialize ids that may arrive either as JSON strings or numbers.
pub(crate) mod id {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn from_value<E: Error>(value: Value) -> Result<Option<String>, E> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            other => Err(E::custom(format!("expected string or number id, got {other}"))),
        }
    }

    pub fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        from_value(Value::deserialize(deserializer)?)?.ok_or_else(|| D::Error::custom("id must not be null"))
    }

    pub fn optional<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        from_value(Value::deserialize(deserializer)?)
    }
}
