use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::mpsc;

use super::*;

#[derive(Default)]
struct Record {
    connects: Vec<String>,
    subscriptions: Vec<String>,
    published: Vec<(String, Value)>,
    closes: usize,
}

struct RecordingTransport {
    record: Arc<Mutex<Record>>,
    fail_subscribe: bool,
    _feed: Option<mpsc::Sender<InboundMessage>>,
}

impl RecordingTransport {
    fn new() -> (Self, Arc<Mutex<Record>>) {
        let record = Arc::new(Mutex::new(Record::default()));
        (Self { record: record.clone(), fail_subscribe: false, _feed: None }, record)
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn connect(&mut self, endpoint: &str) -> Result<Inbox, TransportError> {
        self.record.lock().unwrap().connects.push(endpoint.to_owned());
        let (tx, rx) = mpsc::channel(8);
        self._feed = Some(tx);
        Ok(rx)
    }

    async fn subscribe(&mut self, filters: &[String]) -> Result<(), TransportError> {
        if self.fail_subscribe {
            return Err(TransportError::Connect("refused".into()));
        }
        self.record.lock().unwrap().subscriptions.extend(filters.iter().cloned());
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let value = serde_json::from_slice(&payload).unwrap();
        self.record.lock().unwrap().published.push((topic.to_owned(), value));
        Ok(())
    }

    async fn close(&mut self) {
        self.record.lock().unwrap().closes += 1;
    }
}

#[derive(Default)]
struct Collected {
    controls: Vec<Value>,
    updates: Vec<(String, Value)>,
}

impl ChannelHandler for Collected {
    fn on_control(&mut self, payload: Value) {
        self.controls.push(payload);
    }

    fn on_update(&mut self, participant_id: &str, payload: Value) {
        self.updates.push((participant_id.to_owned(), payload));
    }
}

fn bob() -> Identity {
    Identity::new("42", "bob", "Bob")
}

async fn channel() -> (SessionChannel, Arc<Mutex<Record>>) {
    let (transport, record) = RecordingTransport::new();
    let (channel, _inbox) = SessionChannel::connect(Box::new(transport), "ws://broker/", &bob()).await.unwrap();
    (channel, record)
}

fn msg(topic: &str, payload: &Value) -> InboundMessage {
    InboundMessage::new(topic, serde_json::to_vec(payload).unwrap())
}

// =============================================================================
// CONNECT
// =============================================================================

#[tokio::test]
async fn connect_subscribes_control_and_updates() {
    let (_channel, record) = channel().await;
    let record = record.lock().unwrap();
    assert_eq!(record.connects, vec!["ws://broker/"]);
    assert_eq!(record.subscriptions, vec!["swarm/session/42/control", "swarm/session/42/updates/+"]);
}

#[tokio::test]
async fn failed_subscribe_closes_transport() {
    let (mut transport, record) = RecordingTransport::new();
    transport.fail_subscribe = true;
    let res = SessionChannel::connect(Box::new(transport), "ws://broker/", &bob()).await;
    assert!(res.is_err());
    assert_eq!(record.lock().unwrap().closes, 1);
}

// =============================================================================
// INBOUND
// =============================================================================

#[tokio::test]
async fn peer_update_reaches_handler() {
    let (channel, _) = channel().await;
    let mut handler = Collected::default();
    let payload = json!({"data": {"position": [0.5, 0.5, 0.0]}});

    assert!(channel.dispatch(&msg("swarm/session/42/updates/alice", &payload), &mut handler));
    assert_eq!(handler.updates, vec![("alice".to_owned(), payload)]);
}

#[tokio::test]
async fn own_update_is_suppressed() {
    let (channel, _) = channel().await;
    let mut handler = Collected::default();
    let payload = json!({"data": {"position": [1.0, 0.0]}});

    assert!(!channel.dispatch(&msg("swarm/session/42/updates/bob", &payload), &mut handler));
    assert!(handler.updates.is_empty());
    assert!(matches!(channel.route(&msg("swarm/session/42/updates/bob", &payload)), Err(Rejected::Echo)));
}

#[tokio::test]
async fn foreign_session_is_dropped() {
    let (channel, _) = channel().await;
    let mut handler = Collected::default();
    let payload = json!({"data": {"position": [1.0]}});

    assert!(!channel.dispatch(&msg("swarm/session/99/updates/alice", &payload), &mut handler));
    assert!(!channel.dispatch(&msg("swarm/session/99/control", &json!({"type": "start"})), &mut handler));
    assert!(handler.updates.is_empty());
    assert!(handler.controls.is_empty());
}

#[tokio::test]
async fn control_with_or_without_sender_reaches_handler() {
    let (channel, _) = channel().await;
    let mut handler = Collected::default();

    assert!(channel.dispatch(&msg("swarm/session/42/control", &json!({"type": "start"})), &mut handler));
    assert!(channel.dispatch(&msg("swarm/session/42/control/alice", &json!({"type": "ready"})), &mut handler));
    assert_eq!(handler.controls, vec![json!({"type": "start"}), json!({"type": "ready"})]);
}

#[tokio::test]
async fn malformed_messages_are_dropped() {
    let (channel, _) = channel().await;
    let mut handler = Collected::default();
    let ok = json!({"type": "start"});

    for topic in [
        "swarm/session/42",
        "other/session/42/control",
        "swarm/room/42/control",
        "swarm/session/abc/control",
        "swarm/session//control",
        "swarm/session/42/updates",
        "swarm/session/42/chat/alice",
    ] {
        assert!(!channel.dispatch(&msg(topic, &ok), &mut handler), "{topic}");
    }
    let not_json = InboundMessage::new("swarm/session/42/control", b"{nope".to_vec());
    assert!(matches!(channel.route(&not_json), Err(Rejected::Payload(_))));
    assert!(!channel.dispatch(&not_json, &mut handler));

    assert!(handler.controls.is_empty());
    assert!(handler.updates.is_empty());
}

#[tokio::test]
async fn segments_past_the_fifth_are_ignored() {
    let (channel, _) = channel().await;
    let mut handler = Collected::default();
    let payload = json!({"data": {"position": []}});

    assert!(channel.dispatch(&msg("swarm/session/42/updates/alice/extra", &payload), &mut handler));
    assert_eq!(handler.updates[0].0, "alice");
}

// =============================================================================
// OUTBOUND
// =============================================================================

#[tokio::test]
async fn publishes_on_participant_topics() {
    let (mut channel, record) = channel().await;

    channel.publish_control(&ControlMessage::Ready).await.unwrap();
    channel.publish_update(&UpdatePayload::new(vec![0.25, 0.75])).await.unwrap();

    let record = record.lock().unwrap();
    assert_eq!(
        record.published,
        vec![
            ("swarm/session/42/control/bob".to_owned(), json!({"type": "ready"})),
            ("swarm/session/42/updates/bob".to_owned(), json!({"data": {"position": [0.25, 0.75]}})),
        ]
    );
}

#[tokio::test]
async fn close_is_idempotent() {
    let (mut channel, record) = channel().await;

    channel.close().await;
    channel.close().await;

    assert!(channel.is_closed());
    assert_eq!(record.lock().unwrap().closes, 1);
    let err = channel.publish_control(&ControlMessage::Ready).await.unwrap_err();
    assert!(matches!(err, TransportError::Closed));
}
