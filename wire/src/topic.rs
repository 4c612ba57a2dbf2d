//! Topic construction, parsing, and subscription-filter matching.
//!
//! Parsing mirrors what participants accept: at most five segments are
//! considered (anything after the fifth is ignored), the first two must be
//! `swarm/session`, and the session segment must be a non-empty decimal
//! number. Whether that number is *our* session is the caller's decision.

/// First topic segment.
pub const ROOT_SEGMENT: &str = "swarm";
/// Second topic segment.
pub const SESSION_SEGMENT: &str = "session";
/// Fourth segment for lifecycle commands.
pub const CONTROL_SEGMENT: &str = "control";
/// Fourth segment for weight-vector updates.
pub const UPDATES_SEGMENT: &str = "updates";
/// Segments beyond this count are ignored.
pub const MAX_TOPIC_SEGMENTS: usize = 5;

/// Why an inbound topic was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopicError {
    /// Fewer than four segments.
    #[error("topic has {0} segments, need at least 4")]
    TooShort(usize),
    /// Does not start with `swarm/session`.
    #[error("topic is not rooted at swarm/session")]
    ForeignRoot,
    /// Session segment is empty or not a decimal number.
    #[error("invalid session id segment '{0}'")]
    InvalidSessionId(String),
    /// Update topic without the participant segment.
    #[error("update topic is not participant-specific")]
    MissingParticipant,
    /// Fourth segment is neither `control` nor `updates`.
    #[error("unknown topic kind '{0}'")]
    UnknownKind(String),
}

/// A successfully parsed session topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// `swarm/session/<sid>/control[/<sender>]`
    Control { session_id: String, sender: Option<String> },
    /// `swarm/session/<sid>/updates/<participant_id>`
    Update { session_id: String, participant_id: String },
}

impl Topic {
    #[must_use]
    pub fn session_id(&self) -> &str {
        match self {
            Self::Control { session_id, .. } | Self::Update { session_id, .. } => session_id,
        }
    }
}

/// Filter covering session-wide control messages (no sender suffix).
#[must_use]
pub fn control_filter(session_id: &str) -> String {
    format!("{ROOT_SEGMENT}/{SESSION_SEGMENT}/{session_id}/{CONTROL_SEGMENT}")
}

/// Filter covering updates from any participant.
#[must_use]
pub fn updates_filter(session_id: &str) -> String {
    format!("{ROOT_SEGMENT}/{SESSION_SEGMENT}/{session_id}/{UPDATES_SEGMENT}/+")
}

/// Filter covering control messages sent by any participant (host side).
#[must_use]
pub fn participant_control_filter(session_id: &str) -> String {
    format!("{}/+", control_filter(session_id))
}

/// Control topic, optionally sub-addressed by the sending participant.
#[must_use]
pub fn control_topic(session_id: &str, participant_id: Option<&str>) -> String {
    match participant_id {
        Some(pid) => format!("{}/{pid}", control_filter(session_id)),
        None => control_filter(session_id),
    }
}

/// Update topic for one participant.
#[must_use]
pub fn update_topic(session_id: &str, participant_id: &str) -> String {
    format!("{ROOT_SEGMENT}/{SESSION_SEGMENT}/{session_id}/{UPDATES_SEGMENT}/{participant_id}")
}

/// Parse an inbound topic.
///
/// # Errors
///
/// Returns a [`TopicError`] describing the first structural problem found.
pub fn parse_topic(topic: &str) -> Result<Topic, TopicError> {
    let segments: Vec<&str> = topic.split('/').take(MAX_TOPIC_SEGMENTS).collect();
    if segments.len() < 4 {
        return Err(TopicError::TooShort(segments.len()));
    }
    if segments[0] != ROOT_SEGMENT || segments[1] != SESSION_SEGMENT {
        return Err(TopicError::ForeignRoot);
    }
    let session_id = segments[2];
    if session_id.is_empty() || !session_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TopicError::InvalidSessionId(session_id.to_owned()));
    }

    match segments[3] {
        CONTROL_SEGMENT => Ok(Topic::Control {
            session_id: session_id.to_owned(),
            sender: segments.get(4).map(|s| (*s).to_owned()),
        }),
        UPDATES_SEGMENT => {
            if segments.len() != MAX_TOPIC_SEGMENTS {
                return Err(TopicError::MissingParticipant);
            }
            Ok(Topic::Update { session_id: session_id.to_owned(), participant_id: segments[4].to_owned() })
        }
        other => Err(TopicError::UnknownKind(other.to_owned())),
    }
}

/// MQTT-style filter matching: `+` matches one segment, a trailing `#`
/// matches any remainder (including none).
#[must_use]
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_parts = filter.split('/');
    let mut topic_parts = topic.split('/');
    loop {
        match (filter_parts.next(), topic_parts.next()) {
            (Some("#"), _) => return filter_parts.next().is_none(),
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
#[path = "topic_test.rs"]
mod tests;
