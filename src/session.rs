//! Session state machine.
//!
//! ARCHITECTURE
//! ============
//! `SessionCore` owns all per-session state: lifecycle status, the current
//! question, the answer layout, the local marker and vector, the peer map, and
//! the cue. It performs no I/O. Every input returns the [`Effect`]s the host
//! must carry out (fetch, publish), and async results come back in through the
//! matching `on_*` method. The driver serializes all inputs, so the core is
//! never shared.
//!
//! LIFECYCLE
//! =========
//! ```text
//! Joining --bootstrap ok--> Waiting <--start/stop--> Active
//! ```
//! Question status moves independently: `setup` selects a question (or clears
//! it), a fetch resolves `Loading` into `Loaded`, and the new layout is
//! announced with a `ready` control message.
//!
//! Every setup bumps an epoch. Question fetches carry the epoch they were
//! issued under and results from an older epoch are discarded, so fetches
//! may resolve in any order.

use geometry::{AnswerLayout, DragSample, Point};
use serde_json::Value;
use wire::{ControlMessage, QuestionRecord, SessionInfo, UpdateMessage};

use crate::aggregate::{PeerMap, compute_cue, usable_peers};
use crate::api::FetchError;
use crate::channel::ChannelHandler;
use crate::config::{ClientConfig, Identity};

// =============================================================================
// STATUS TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Fetching session info; never re-entered.
    Joining,
    /// Waiting for the host to start the round.
    Waiting,
    /// Answering; drags are published.
    Active,
}

/// A fully loaded question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub answers: Vec<String>,
    pub image: String,
}

impl Question {
    #[must_use]
    pub fn from_record(record: QuestionRecord, image: String) -> Self {
        Self { id: record.id, prompt: record.prompt, answers: record.answers, image }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionStatus {
    Undefined,
    Loading { id: String },
    Loaded(Question),
}

/// Work the host must perform on behalf of the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchSession { session_id: String },
    FetchQuestion { epoch: u64, question_id: String },
    PublishControl(ControlMessage),
    PublishUpdate(Vec<f64>),
}

/// Read-only view of the session for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub question: QuestionStatus,
    pub answer_count: usize,
    /// Local marker in board coordinates.
    pub marker: Point,
    pub local: Vec<f64>,
    pub cue: Vec<f64>,
    pub cue_position: Point,
    /// Decoded peer markers, ordered by participant id. Peers whose vector
    /// does not match the layout sit at the origin.
    pub peers: Vec<(String, Point)>,
    /// Peers that contributed to the cue.
    pub contributing_peers: usize,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            status: SessionStatus::Joining,
            question: QuestionStatus::Undefined,
            answer_count: 0,
            marker: Point::ORIGIN,
            local: Vec::new(),
            cue: Vec::new(),
            cue_position: Point::ORIGIN,
            peers: Vec::new(),
            contributing_peers: 0,
        }
    }
}

// =============================================================================
// CORE
// =============================================================================

pub struct SessionCore {
    identity: Identity,
    evict_peers_on_setup: bool,
    status: SessionStatus,
    question: QuestionStatus,
    epoch: u64,
    setup_seen: bool,
    bootstrapped: bool,
    layout: AnswerLayout,
    marker: Point,
    local: Vec<f64>,
    peers: PeerMap,
    cue: Vec<f64>,
}

impl SessionCore {
    #[must_use]
    pub fn new(identity: Identity, config: &ClientConfig) -> Self {
        Self {
            identity,
            evict_peers_on_setup: config.evict_peers_on_setup,
            status: SessionStatus::Joining,
            question: QuestionStatus::Undefined,
            epoch: 0,
            setup_seen: false,
            bootstrapped: false,
            layout: AnswerLayout::default(),
            marker: Point::ORIGIN,
            local: Vec::new(),
            peers: PeerMap::new(),
            cue: Vec::new(),
        }
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn question(&self) -> &QuestionStatus {
        &self.question
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn layout(&self) -> &AnswerLayout {
        &self.layout
    }

    #[must_use]
    pub fn peers(&self) -> &PeerMap {
        &self.peers
    }

    #[must_use]
    pub fn local(&self) -> &[f64] {
        &self.local
    }

    #[must_use]
    pub fn cue(&self) -> &[f64] {
        &self.cue
    }

    /// The cue decoded through the current layout.
    #[must_use]
    pub fn cue_position(&self) -> Point {
        self.layout.denormalize(&self.cue)
    }

    /// First effect of a new session: fetch the session info.
    #[must_use]
    pub fn begin(&self) -> Vec<Effect> {
        vec![Effect::FetchSession { session_id: self.identity.session_id.clone() }]
    }

    // -------------------------------------------------------------------------
    // Bootstrap and question loading
    // -------------------------------------------------------------------------

    pub fn on_session_fetched(&mut self, result: Result<SessionInfo, FetchError>) -> Vec<Effect> {
        let info = match result {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, session_id = %self.identity.session_id, "session fetch failed");
                return Vec::new();
            }
        };
        if self.bootstrapped {
            tracing::debug!(session_id = %self.identity.session_id, "ignoring repeated session info");
            return Vec::new();
        }
        self.bootstrapped = true;
        // A start or stop may already have moved the status on.
        if self.status == SessionStatus::Joining {
            self.status = SessionStatus::Waiting;
        }
        tracing::info!(session_id = %self.identity.session_id, question_id = ?info.question_id, "joined session");

        match info.question_id {
            // A setup that arrived while the bootstrap was in flight is newer.
            Some(_) if self.setup_seen => Vec::new(),
            Some(question_id) => self.load(question_id),
            None => Vec::new(),
        }
    }

    pub fn on_question_fetched(&mut self, epoch: u64, result: Result<Question, FetchError>) -> Vec<Effect> {
        if epoch != self.epoch {
            tracing::debug!(epoch, current = self.epoch, "discarding stale question fetch");
            return Vec::new();
        }
        let QuestionStatus::Loading { id } = &self.question else {
            tracing::debug!(epoch, "question fetch resolved while not loading");
            return Vec::new();
        };
        let question = match result {
            Ok(question) => question,
            Err(e) => {
                tracing::warn!(error = %e, question_id = %id, "question fetch failed");
                return Vec::new();
            }
        };

        tracing::info!(question_id = %question.id, answers = question.answers.len(), "question loaded");
        self.layout.resize(question.answers.len());
        self.question = QuestionStatus::Loaded(question);
        self.recompute_cue();
        vec![Effect::PublishControl(ControlMessage::Ready)]
    }

    fn load(&mut self, question_id: String) -> Vec<Effect> {
        self.epoch += 1;
        self.question = QuestionStatus::Loading { id: question_id.clone() };
        vec![Effect::FetchQuestion { epoch: self.epoch, question_id }]
    }

    // -------------------------------------------------------------------------
    // Channel input
    // -------------------------------------------------------------------------

    pub fn on_control(&mut self, message: ControlMessage) -> Vec<Effect> {
        tracing::debug!(kind = message.kind(), "control message");
        match message {
            ControlMessage::Setup { question_id } => self.setup(question_id),
            ControlMessage::Start => {
                self.status = SessionStatus::Active;
                Vec::new()
            }
            ControlMessage::Stop => {
                self.status = SessionStatus::Waiting;
                Vec::new()
            }
            ControlMessage::Ready | ControlMessage::Unknown => Vec::new(),
        }
    }

    /// Decode and apply a raw control payload. Undecodable payloads are
    /// logged and ignored.
    pub fn on_control_payload(&mut self, payload: Value) -> Vec<Effect> {
        match ControlMessage::from_value(payload) {
            Ok(message) => self.on_control(message),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed control message");
                Vec::new()
            }
        }
    }

    fn setup(&mut self, question_id: Option<String>) -> Vec<Effect> {
        self.setup_seen = true;
        self.layout.resize(0);
        if self.evict_peers_on_setup {
            self.peers.clear();
        }
        let effects = match question_id {
            Some(question_id) => self.load(question_id),
            None => {
                self.epoch += 1;
                self.question = QuestionStatus::Undefined;
                Vec::new()
            }
        };
        self.recompute_cue();
        effects
    }

    pub fn on_update(&mut self, update: UpdateMessage) {
        self.peers.insert(update.participant_id, update.position);
        self.recompute_cue();
    }

    /// Decode and apply a raw update payload from `participant_id`.
    pub fn on_update_payload(&mut self, participant_id: &str, payload: Value) {
        match UpdateMessage::from_payload(participant_id, payload) {
            Ok(update) => self.on_update(update),
            Err(e) => tracing::warn!(error = %e, participant_id, "ignoring malformed update"),
        }
    }

    // -------------------------------------------------------------------------
    // Local input
    // -------------------------------------------------------------------------

    /// Apply a drag sample. The marker always follows; the vector is kept and
    /// published only while the session is active.
    pub fn on_drag(&mut self, sample: DragSample) -> Vec<Effect> {
        self.marker = sample.position;
        if self.status != SessionStatus::Active {
            return Vec::new();
        }
        self.local = sample.weights;
        self.recompute_cue();
        vec![Effect::PublishUpdate(self.local.clone())]
    }

    /// Drag to a board-space point, encoded against the current layout.
    pub fn on_pointer(&mut self, board: Point) -> Vec<Effect> {
        let sample = DragSample::at(board, &self.layout);
        self.on_drag(sample)
    }

    fn recompute_cue(&mut self) {
        self.cue = compute_cue(&self.local, &self.peers);
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let mut peers: Vec<(String, Point)> =
            self.peers.iter().map(|(id, v)| (id.clone(), self.layout.denormalize(v))).collect();
        peers.sort_by(|a, b| a.0.cmp(&b.0));
        SessionSnapshot {
            status: self.status,
            question: self.question.clone(),
            answer_count: self.layout.len(),
            marker: self.marker,
            local: self.local.clone(),
            cue: self.cue.clone(),
            cue_position: self.cue_position(),
            peers,
            contributing_peers: usable_peers(&self.local, &self.peers).count(),
        }
    }
}

// =============================================================================
// CHANNEL ADAPTER
// =============================================================================

/// Feeds channel callbacks into a core and collects the resulting effects.
pub struct EffectCollector<'a> {
    core: &'a mut SessionCore,
    effects: Vec<Effect>,
}

impl<'a> EffectCollector<'a> {
    #[must_use]
    pub fn new(core: &'a mut SessionCore) -> Self {
        Self { core, effects: Vec::new() }
    }

    #[must_use]
    pub fn into_effects(self) -> Vec<Effect> {
        self.effects
    }
}

impl ChannelHandler for EffectCollector<'_> {
    fn on_control(&mut self, payload: Value) {
        let effects = self.core.on_control_payload(payload);
        self.effects.extend(effects);
    }

    fn on_update(&mut self, participant_id: &str, payload: Value) {
        self.core.on_update_payload(participant_id, payload);
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
