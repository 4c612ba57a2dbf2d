//! In-process session emulator.
//!
//! DESIGN
//! ======
//! A host and N participants share one [`LocalBroker`]; a [`MemoryApi`]
//! stands in for the session server. Each round the host sets up a question,
//! waits for every participant to report `ready`, starts the round, lets the
//! participants drag their markers to random spots, waits until every
//! participant has heard from every peer, then stops the round. The report
//! lists each participant's cue per round; once all updates have landed the
//! cues agree.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use geometry::consts::BOARD_HALF_EXTENT;
use geometry::{AnswerLayout, DragSession, ListenerHost, Point, Viewport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use swarm::aggregate::{PeerMap, compute_cue};
use swarm::api::{MemoryApi, SessionApi};
use swarm::config::{ClientConfig, Identity};
use swarm::driver::{DriverHandle, SessionDriver};
use swarm::session::{SessionSnapshot, SessionStatus};
use swarm::transport::{Inbox, LocalBroker, LocalTransport, Transport};
use wire::topic::{control_topic, participant_control_filter};
use wire::{ControlMessage, QuestionRecord, Topic, parse_topic};

use crate::CliError;

const SESSION_ID: &str = "1";
const STEP_TIMEOUT: Duration = Duration::from_secs(5);
/// Simulated browser window the pointer moves in.
const WINDOW: Viewport = Viewport { left: 0.0, top: 0.0, width: 1280.0, height: 800.0 };

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[arg(long, default_value_t = 3)]
    participants: usize,

    #[arg(long, default_value_t = 2)]
    rounds: usize,

    /// Drags per participant per round.
    #[arg(long, default_value_t = 5)]
    moves: usize,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Clear peer vectors whenever a new question is set up.
    #[arg(long, default_value_t = false)]
    evict_peers: bool,
}

/// Counts attached drag listeners, like a document would.
#[derive(Default)]
struct Pointer {
    attached: usize,
}

impl ListenerHost for Pointer {
    fn attach_drag_listeners(&mut self) {
        self.attached += 1;
    }

    fn detach_drag_listeners(&mut self) {
        self.attached = self.attached.saturating_sub(1);
    }
}

struct Participant {
    handle: DriverHandle,
    pointer: Pointer,
    /// Weights of the most recent drag sample.
    last: Vec<f64>,
}

fn question(round: usize) -> QuestionRecord {
    let answers = 3 + round % 3;
    QuestionRecord {
        id: (round + 1).to_string(),
        prompt: format!("Round {} question", round + 1),
        answers: (0..answers).map(|i| format!("Answer {}", i + 1)).collect(),
    }
}

async fn within<T>(what: &'static str, fut: impl Future<Output = T>) -> Result<T, CliError> {
    tokio::time::timeout(STEP_TIMEOUT, fut).await.map_err(|_| CliError::Timeout(what))
}

async fn wait_all(
    participants: &mut [Participant],
    what: &'static str,
    predicate: impl Fn(&SessionSnapshot) -> bool,
) -> Result<Vec<SessionSnapshot>, CliError> {
    let mut snapshots = Vec::with_capacity(participants.len());
    for p in participants.iter_mut() {
        snapshots.push(within(what, p.handle.wait_for(&predicate)).await??);
    }
    Ok(snapshots)
}

// =============================================================================
// HOST
// =============================================================================

struct Host {
    transport: LocalTransport,
    inbox: Inbox,
}

impl Host {
    async fn connect(broker: &LocalBroker) -> Result<Self, CliError> {
        let mut transport = broker.transport();
        let inbox = transport.connect("local").await?;
        transport.subscribe(&[participant_control_filter(SESSION_ID)]).await?;
        Ok(Self { transport, inbox })
    }

    async fn send(&mut self, message: &ControlMessage) -> Result<(), CliError> {
        tracing::info!(kind = message.kind(), "host control");
        self.transport.publish(&control_topic(SESSION_ID, None), message.to_bytes()?).await?;
        Ok(())
    }

    /// Wait for `ready` from `expected` distinct participants.
    async fn await_ready(&mut self, expected: usize) -> Result<(), CliError> {
        let mut ready = HashSet::new();
        while ready.len() < expected {
            let Some(message) = within("ready", self.inbox.recv()).await? else {
                return Err(CliError::Timeout("ready"));
            };
            let Ok(Topic::Control { sender: Some(sender), .. }) = parse_topic(&message.topic) else {
                continue;
            };
            let payload: Value = serde_json::from_slice(&message.payload)?;
            if ControlMessage::from_value(payload)? == ControlMessage::Ready {
                tracing::debug!(%sender, "participant ready");
                ready.insert(sender);
            }
        }
        Ok(())
    }
}

// =============================================================================
// RUN
// =============================================================================

pub async fn run(config: &ClientConfig, args: SimulateArgs) -> Result<Value, CliError> {
    if args.participants == 0 {
        return Err(CliError::InvalidArgument("--participants must be at least 1".into()));
    }
    if args.moves == 0 {
        return Err(CliError::InvalidArgument("--moves must be at least 1".into()));
    }
    let mut api = MemoryApi::new().with_session(SESSION_ID, None);
    for round in 0..args.rounds {
        api = api.with_question(question(round));
    }
    let api = Arc::new(api);
    let broker = LocalBroker::new();
    let config = ClientConfig { evict_peers_on_setup: args.evict_peers || config.evict_peers_on_setup, ..config.clone() };

    let mut host = Host::connect(&broker).await?;
    let mut participants = Vec::with_capacity(args.participants);
    for i in 0..args.participants {
        let user = format!("sim.user{}", i + 1);
        let joined = api.join_session(SESSION_ID, &user).await?;
        let identity = Identity::new(SESSION_ID, joined.id, joined.username);
        let handle = SessionDriver::start(identity, &config, Box::new(broker.transport()), api.clone()).await?;
        participants.push(Participant { handle, pointer: Pointer::default(), last: Vec::new() });
    }
    wait_all(&mut participants, "join", |s| s.status == SessionStatus::Waiting).await?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut rounds = Vec::with_capacity(args.rounds);
    for round in 0..args.rounds {
        let record = question(round);
        tracing::info!(round = round + 1, question_id = %record.id, answers = record.answers.len(), "round starting");

        api.set_session_question(SESSION_ID, Some(&record.id)).await;
        host.send(&ControlMessage::Setup { question_id: Some(record.id.clone()) }).await?;
        host.await_ready(participants.len()).await?;
        host.send(&ControlMessage::Start).await?;
        wait_all(&mut participants, "start", |s| s.status == SessionStatus::Active).await?;

        let layout = AnswerLayout::new(record.answers.len());
        for _ in 0..args.moves {
            for p in &mut participants {
                drag_randomly(p, &layout, &mut rng).await?;
            }
        }

        let expected = expected_cue(&participants);
        let settled = wait_all(&mut participants, "peer updates", |s| close_to(&s.cue, &expected)).await?;
        host.send(&ControlMessage::Stop).await?;
        wait_all(&mut participants, "stop", |s| s.status == SessionStatus::Waiting).await?;

        let cues: Vec<Value> = participants
            .iter()
            .zip(&settled)
            .map(|(p, s)| {
                json!({
                    "participant_id": p.handle.identity().participant_id,
                    "local": s.local,
                    "cue": s.cue,
                    "cue_position": s.cue_position,
                })
            })
            .collect();
        rounds.push(json!({ "round": round + 1, "question_id": record.id, "answers": record.answers, "cues": cues }));
    }

    for p in participants {
        if p.pointer.attached != 0 {
            tracing::warn!(participant_id = %p.handle.identity().participant_id, "drag listeners left attached");
        }
        p.handle.leave().await?;
    }
    host.transport.close().await;

    let session = api.fetch_session(SESSION_ID).await?;
    Ok(json!({ "session_id": SESSION_ID, "question_id": session.question_id, "rounds": rounds }))
}

/// Mean of every participant's final vector.
fn expected_cue(participants: &[Participant]) -> Vec<f64> {
    let Some((first, rest)) = participants.split_first() else {
        return Vec::new();
    };
    let peers: PeerMap = rest.iter().map(|p| (p.handle.identity().participant_id.clone(), p.last.clone())).collect();
    compute_cue(&first.last, &peers)
}

fn close_to(actual: &[f64], expected: &[f64]) -> bool {
    actual.len() == expected.len() && actual.iter().zip(expected).all(|(a, e)| (a - e).abs() < 1e-9)
}

/// One drag: press, a couple of pointer moves over the drawn board, release.
async fn drag_randomly(p: &mut Participant, layout: &AnswerLayout, rng: &mut StdRng) -> Result<(), CliError> {
    let mut drag = DragSession::press(&mut p.pointer, WINDOW);
    for _ in 0..2 {
        let board = Point::new(
            rng.random_range(-BOARD_HALF_EXTENT..BOARD_HALF_EXTENT),
            rng.random_range(-BOARD_HALF_EXTENT..BOARD_HALF_EXTENT),
        );
        let screen = WINDOW.board_to_screen(board);
        let sample = drag.move_to(screen, layout);
        p.last.clone_from(&sample.weights);
        p.handle.drag(sample).await?;
    }
    let moves = drag.release();
    tracing::trace!(moves, participant_id = %p.handle.identity().participant_id, "drag released");
    Ok(())
}

#[cfg(test)]
#[path = "simulate_test.rs"]
mod tests;
