//! Pub/sub transport seam.
//!
//! DESIGN
//! ======
//! The session channel only needs four operations from a broker connection:
//! connect, subscribe, publish, close. [`Transport`] is that surface and
//! nothing more; reconnects and retries belong to the implementation, not to
//! the session. Inbound messages arrive on an mpsc [`Inbox`] handed out by
//! `connect`, so the consumer drains them from its own event loop.
//!
//! [`LocalBroker`] is an in-process hub with MQTT-style filter matching. The
//! simulation runs every participant against one broker, and the tests use it
//! in place of a network broker.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::task::JoinHandle;
use wire::topic_matches;

/// Messages buffered per broker before slow receivers start lagging.
const BROKER_CAPACITY: usize = 1024;
/// Messages buffered per connection inbox.
const INBOX_CAPACITY: usize = 256;

// =============================================================================
// TYPES
// =============================================================================

/// A message delivered on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self { topic: topic.into(), payload: payload.into() }
    }
}

/// Receiving half of a connection.
pub type Inbox = mpsc::Receiver<InboundMessage>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("transport is not connected")]
    NotConnected,
    #[error("transport is closed")]
    Closed,
    #[error("publish failed: {0}")]
    Publish(String),
    #[error(transparent)]
    Payload(#[from] wire::PayloadError),
}

/// Minimal broker connection used by the session channel.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Open the connection. Messages for subscribed filters arrive on the
    /// returned inbox.
    async fn connect(&mut self, endpoint: &str) -> Result<Inbox, TransportError>;

    /// Add subscription filters (`+` and `#` wildcards allowed).
    async fn subscribe(&mut self, filters: &[String]) -> Result<(), TransportError>;

    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Release the connection. Calling it again is a no-op.
    async fn close(&mut self);
}

// =============================================================================
// LOCAL BROKER
// =============================================================================

/// In-process publish/subscribe hub. Cheap to clone; clones share the hub.
#[derive(Clone)]
pub struct LocalBroker {
    tx: broadcast::Sender<InboundMessage>,
}

impl LocalBroker {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROKER_CAPACITY);
        Self { tx }
    }

    /// A fresh, unconnected client of this broker.
    #[must_use]
    pub fn transport(&self) -> LocalTransport {
        LocalTransport { broker: self.clone(), filters: Arc::default(), forwarder: None, closed: false }
    }

    /// Publish without a connection. Returns how many connections saw it
    /// (before filtering).
    pub fn publish(&self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> usize {
        let message = InboundMessage::new(topic, payload);
        match self.tx.send(message) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(message)) => {
                tracing::debug!(topic = %message.topic, "publish with no connected clients");
                0
            }
        }
    }
}

impl Default for LocalBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// One client connection to a [`LocalBroker`].
pub struct LocalTransport {
    broker: LocalBroker,
    filters: Arc<RwLock<Vec<String>>>,
    forwarder: Option<JoinHandle<()>>,
    closed: bool,
}

impl LocalTransport {
    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if self.forwarder.is_none() {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }
}

async fn forward(
    mut rx: broadcast::Receiver<InboundMessage>,
    filters: Arc<RwLock<Vec<String>>>,
    inbox: mpsc::Sender<InboundMessage>,
) {
    loop {
        match rx.recv().await {
            Ok(message) => {
                let wanted = filters.read().await.iter().any(|f| topic_matches(f, &message.topic));
                if wanted && inbox.send(message).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "local transport lagged; messages dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[async_trait::async_trait]
impl Transport for LocalTransport {
    async fn connect(&mut self, endpoint: &str) -> Result<Inbox, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if self.forwarder.is_some() {
            return Err(TransportError::Connect("already connected".into()));
        }
        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let rx = self.broker.tx.subscribe();
        self.forwarder = Some(tokio::spawn(forward(rx, self.filters.clone(), tx)));
        tracing::debug!(endpoint, "local transport connected");
        Ok(inbox)
    }

    async fn subscribe(&mut self, filters: &[String]) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.filters.write().await.extend(filters.iter().cloned());
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.broker.publish(topic, payload);
        Ok(())
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        self.filters.write().await.clear();
    }
}

impl Drop for LocalTransport {
    fn drop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
