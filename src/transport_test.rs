use std::time::Duration;

use super::*;

async fn recv(inbox: &mut Inbox) -> InboundMessage {
    tokio::time::timeout(Duration::from_secs(1), inbox.recv())
        .await
        .expect("timed out waiting for message")
        .expect("inbox closed")
}

async fn assert_silent(inbox: &mut Inbox) {
    let res = tokio::time::timeout(Duration::from_millis(50), inbox.recv()).await;
    assert!(res.is_err(), "expected no message, got {res:?}");
}

async fn connected(broker: &LocalBroker, filters: &[&str]) -> (LocalTransport, Inbox) {
    let mut transport = broker.transport();
    let inbox = transport.connect("local").await.unwrap();
    let filters: Vec<String> = filters.iter().map(|f| (*f).to_owned()).collect();
    transport.subscribe(&filters).await.unwrap();
    (transport, inbox)
}

#[tokio::test]
async fn delivers_only_matching_topics() {
    let broker = LocalBroker::new();
    let (_t, mut inbox) = connected(&broker, &["swarm/session/1/updates/+"]).await;

    broker.publish("swarm/session/2/updates/a", b"{}".to_vec());
    broker.publish("swarm/session/1/control", b"{}".to_vec());
    broker.publish("swarm/session/1/updates/a", b"[1]".to_vec());

    let msg = recv(&mut inbox).await;
    assert_eq!(msg.topic, "swarm/session/1/updates/a");
    assert_eq!(msg.payload, b"[1]");
    assert_silent(&mut inbox).await;
}

#[tokio::test]
async fn publishing_connection_receives_its_own_messages() {
    let broker = LocalBroker::new();
    let (mut t, mut inbox) = connected(&broker, &["swarm/#"]).await;

    t.publish("swarm/session/1/updates/me", b"x".to_vec()).await.unwrap();
    assert_eq!(recv(&mut inbox).await.topic, "swarm/session/1/updates/me");
}

#[tokio::test]
async fn every_connection_gets_a_copy() {
    let broker = LocalBroker::new();
    let (_a, mut inbox_a) = connected(&broker, &["swarm/session/1/control"]).await;
    let (_b, mut inbox_b) = connected(&broker, &["swarm/session/1/control"]).await;

    assert_eq!(broker.publish("swarm/session/1/control", b"{}".to_vec()), 2);
    recv(&mut inbox_a).await;
    recv(&mut inbox_b).await;
}

#[tokio::test]
async fn publish_before_connect_is_rejected() {
    let broker = LocalBroker::new();
    let mut t = broker.transport();
    let err = t.publish("swarm/session/1/control", Vec::new()).await.unwrap_err();
    assert!(matches!(err, TransportError::NotConnected));
    assert!(matches!(t.subscribe(&[]).await.unwrap_err(), TransportError::NotConnected));
}

#[tokio::test]
async fn close_is_idempotent_and_final() {
    let broker = LocalBroker::new();
    let (mut t, mut inbox) = connected(&broker, &["#"]).await;

    t.close().await;
    t.close().await;

    let err = t.publish("swarm/session/1/control", Vec::new()).await.unwrap_err();
    assert!(matches!(err, TransportError::Closed));
    assert!(matches!(t.connect("local").await.unwrap_err(), TransportError::Closed));

    broker.publish("swarm/session/1/control", b"{}".to_vec());
    let next = tokio::time::timeout(Duration::from_secs(1), inbox.recv()).await.unwrap();
    assert!(next.is_none(), "inbox should end once the forwarder stops");
}

#[tokio::test]
async fn second_connect_is_rejected() {
    let broker = LocalBroker::new();
    let (mut t, _inbox) = connected(&broker, &[]).await;
    assert!(matches!(t.connect("local").await.unwrap_err(), TransportError::Connect(_)));
}

#[test]
fn broker_publish_without_clients_reports_zero() {
    let broker = LocalBroker::new();
    assert_eq!(broker.publish("swarm/session/1/control", Vec::new()), 0);
}
