//! Session channel: topic validation, echo suppression, and publishing.
//!
//! DESIGN
//! ======
//! A channel is bound to one session and one local participant. It subscribes
//! to the session-wide control topic and to every participant's update topic,
//! then filters what comes back: anything that is not a well-formed topic of
//! *this* session, any update the local participant sent itself, and any
//! payload that is not JSON are dropped with a log line. Only clean messages
//! reach the [`ChannelHandler`].
//!
//! Routing ([`SessionChannel::route`]) is a pure function of the channel's
//! identity, so the event loop can own the inbox and the channel separately.

use serde_json::Value;
use wire::message::parse_json;
use wire::topic::{control_filter, control_topic, update_topic, updates_filter};
use wire::{ControlMessage, PayloadError, Topic, TopicError, UpdatePayload, parse_topic};

use crate::config::Identity;
use crate::transport::{Inbox, InboundMessage, Transport, TransportError};

/// Receives messages that passed validation.
pub trait ChannelHandler {
    fn on_control(&mut self, payload: Value);
    fn on_update(&mut self, participant_id: &str, payload: Value);
}

/// A validated inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Control(Value),
    Update { participant_id: String, payload: Value },
}

/// Why an inbound message was dropped.
#[derive(Debug, thiserror::Error)]
pub enum Rejected {
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error("message for session {0}")]
    ForeignSession(String),
    #[error("own update echoed back")]
    Echo,
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

pub struct SessionChannel {
    transport: Box<dyn Transport>,
    session_id: String,
    participant_id: String,
    closed: bool,
}

impl SessionChannel {
    /// Connect `transport` and subscribe to the session's control and update
    /// topics.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if connecting or subscribing fails; the
    /// transport is closed before returning in the latter case.
    pub async fn connect(
        mut transport: Box<dyn Transport>,
        endpoint: &str,
        identity: &Identity,
    ) -> Result<(Self, Inbox), TransportError> {
        let inbox = match transport.connect(endpoint).await {
            Ok(inbox) => inbox,
            Err(e) => {
                tracing::warn!(error = %e, endpoint, "session channel connect failed");
                return Err(e);
            }
        };
        let filters = [control_filter(&identity.session_id), updates_filter(&identity.session_id)];
        if let Err(e) = transport.subscribe(&filters).await {
            tracing::warn!(error = %e, session_id = %identity.session_id, "session channel subscribe failed");
            transport.close().await;
            return Err(e);
        }
        tracing::info!(
            session_id = %identity.session_id,
            participant_id = %identity.participant_id,
            "session channel connected"
        );

        let channel = Self {
            transport,
            session_id: identity.session_id.clone(),
            participant_id: identity.participant_id.clone(),
            closed: false,
        };
        Ok((channel, inbox))
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Validate an inbound message against this channel's identity.
    ///
    /// # Errors
    ///
    /// Returns the reason the message must be dropped.
    pub fn route(&self, message: &InboundMessage) -> Result<Route, Rejected> {
        let topic = parse_topic(&message.topic)?;
        if topic.session_id() != self.session_id {
            return Err(Rejected::ForeignSession(topic.session_id().to_owned()));
        }
        match topic {
            Topic::Control { .. } => Ok(Route::Control(parse_json(&message.payload)?)),
            Topic::Update { participant_id, .. } => {
                if participant_id == self.participant_id {
                    return Err(Rejected::Echo);
                }
                Ok(Route::Update { participant_id, payload: parse_json(&message.payload)? })
            }
        }
    }

    /// Route `message` and hand it to `handler`. Returns whether it was
    /// delivered.
    pub fn dispatch<H: ChannelHandler>(&self, message: &InboundMessage, handler: &mut H) -> bool {
        match self.route(message) {
            Ok(Route::Control(payload)) => {
                handler.on_control(payload);
                true
            }
            Ok(Route::Update { participant_id, payload }) => {
                handler.on_update(&participant_id, payload);
                true
            }
            Err(Rejected::Echo) => false,
            Err(e @ Rejected::ForeignSession(_)) => {
                tracing::debug!(reason = %e, topic = %message.topic, "dropping message");
                false
            }
            Err(e) => {
                tracing::warn!(reason = %e, topic = %message.topic, "dropping invalid message");
                false
            }
        }
    }

    /// Publish a lifecycle message on this participant's control topic.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if encoding or publishing fails.
    pub async fn publish_control(&mut self, message: &ControlMessage) -> Result<(), TransportError> {
        let topic = control_topic(&self.session_id, Some(&self.participant_id));
        let payload = message.to_bytes()?;
        self.publish(&topic, payload).await
    }

    /// Publish the local weight vector on this participant's update topic.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if encoding or publishing fails.
    pub async fn publish_update(&mut self, update: &UpdatePayload) -> Result<(), TransportError> {
        let topic = update_topic(&self.session_id, &self.participant_id);
        let payload = update.to_bytes()?;
        self.publish(&topic, payload).await
    }

    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.transport.publish(topic, payload).await.inspect_err(|e| {
            tracing::warn!(error = %e, topic, "publish failed");
        })
    }

    /// Release the transport. Later calls do nothing.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.transport.close().await;
        tracing::info!(session_id = %self.session_id, participant_id = %self.participant_id, "session channel closed");
    }
}

#[cfg(test)]
#[path = "channel_test.rs"]
mod tests;
