//! Session event loop.
//!
//! ARCHITECTURE
//! ============
//! One task owns the [`SessionCore`] and the [`SessionChannel`]. It waits on
//! three sources and handles one input at a time:
//!
//! ```text
//! broker inbox ──┐
//! fetch results ─┼──► SessionCore ──► effects ──► publish / spawn fetch
//! handle calls ──┘                        │
//!                                         └──► watch<SessionSnapshot>
//! ```
//!
//! Fetches run as spawned tasks that post their result back to the loop, so
//! the loop never blocks on HTTP. The core needs no locks because nothing else
//! touches it. Callers interact through a [`DriverHandle`].

use std::sync::Arc;

use geometry::{DragSample, Point};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use wire::{SessionInfo, UpdatePayload};

use crate::api::{FetchError, SessionApi};
use crate::channel::SessionChannel;
use crate::config::{ClientConfig, Identity};
use crate::session::{Effect, EffectCollector, Question, SessionCore, SessionSnapshot};
use crate::transport::{Inbox, Transport, TransportError};

const COMMAND_CAPACITY: usize = 64;
const COMPLETION_CAPACITY: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("session event loop has stopped")]
    Stopped,
    #[error("session event loop failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

enum Event {
    SessionFetched(Result<SessionInfo, FetchError>),
    QuestionFetched { epoch: u64, result: Result<Question, FetchError> },
    Drag(DragSample),
    Pointer(Point),
    Leave,
}

// =============================================================================
// DRIVER
// =============================================================================

pub struct SessionDriver {
    core: SessionCore,
    channel: SessionChannel,
    inbox: Inbox,
    inbox_open: bool,
    api: Arc<dyn SessionApi>,
    commands: mpsc::Receiver<Event>,
    completions: mpsc::Receiver<Event>,
    completions_tx: mpsc::Sender<Event>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionDriver {
    /// Connect to the broker, then spawn the event loop.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the session channel cannot connect.
    pub async fn start(
        identity: Identity,
        config: &ClientConfig,
        transport: Box<dyn Transport>,
        api: Arc<dyn SessionApi>,
    ) -> Result<DriverHandle, TransportError> {
        let (channel, inbox) = SessionChannel::connect(transport, &config.broker_url, &identity).await?;
        let core = SessionCore::new(identity.clone(), config);

        let (commands_tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let (completions_tx, completions) = mpsc::channel(COMPLETION_CAPACITY);
        let (snapshots, snapshot_rx) = watch::channel(core.snapshot());

        let driver = Self {
            core,
            channel,
            inbox,
            inbox_open: true,
            api,
            commands,
            completions,
            completions_tx,
            snapshots,
        };
        let task = tokio::spawn(driver.run());

        Ok(DriverHandle { identity, events: commands_tx, snapshots: snapshot_rx, task })
    }

    async fn run(mut self) -> SessionSnapshot {
        let effects = self.core.begin();
        self.execute(effects).await;

        loop {
            let effects = tokio::select! {
                message = self.inbox.recv(), if self.inbox_open => match message {
                    Some(message) => {
                        let mut collector = EffectCollector::new(&mut self.core);
                        self.channel.dispatch(&message, &mut collector);
                        collector.into_effects()
                    }
                    None => {
                        tracing::warn!(session_id = %self.channel.session_id(), "broker inbox closed");
                        self.inbox_open = false;
                        Vec::new()
                    }
                },
                Some(event) = self.completions.recv() => self.handle(event),
                command = self.commands.recv() => match command {
                    Some(Event::Leave) | None => break,
                    Some(event) => self.handle(event),
                },
            };
            self.execute(effects).await;
            self.publish_snapshot();
        }

        self.channel.close().await;
        let snapshot = self.core.snapshot();
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::SessionFetched(result) => self.core.on_session_fetched(result),
            Event::QuestionFetched { epoch, result } => self.core.on_question_fetched(epoch, result),
            Event::Drag(sample) => self.core.on_drag(sample),
            Event::Pointer(board) => self.core.on_pointer(board),
            Event::Leave => Vec::new(),
        }
    }

    async fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchSession { session_id } => {
                    let api = self.api.clone();
                    let tx = self.completions_tx.clone();
                    tokio::spawn(async move {
                        let result = api.fetch_session(&session_id).await;
                        if tx.send(Event::SessionFetched(result)).await.is_err() {
                            tracing::debug!(%session_id, "session fetch finished after leave");
                        }
                    });
                }
                Effect::FetchQuestion { epoch, question_id } => {
                    let api = self.api.clone();
                    let tx = self.completions_tx.clone();
                    tokio::spawn(async move {
                        let result = api.fetch_question(&question_id).await.map(|record| {
                            let image = api.image_url(&record.id);
                            Question::from_record(record, image)
                        });
                        if tx.send(Event::QuestionFetched { epoch, result }).await.is_err() {
                            tracing::debug!(%question_id, "question fetch finished after leave");
                        }
                    });
                }
                Effect::PublishControl(message) => {
                    if let Err(e) = self.channel.publish_control(&message).await {
                        tracing::debug!(error = %e, kind = message.kind(), "control not sent");
                    }
                }
                Effect::PublishUpdate(position) => {
                    if let Err(e) = self.channel.publish_update(&UpdatePayload::new(position)).await {
                        tracing::debug!(error = %e, "update not sent");
                    }
                }
            }
        }
    }

    fn publish_snapshot(&self) {
        let next = self.core.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Caller's side of a running session.
pub struct DriverHandle {
    identity: Identity,
    events: mpsc::Sender<Event>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<SessionSnapshot>,
}

impl DriverHandle {
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Feed a processed drag sample.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Stopped`] if the event loop is gone.
    pub async fn drag(&self, sample: DragSample) -> Result<(), DriverError> {
        self.send(Event::Drag(sample)).await
    }

    /// Move the marker to a board-space point, encoded against whatever
    /// layout is current when the loop handles it.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Stopped`] if the event loop is gone.
    pub async fn pointer(&self, board: Point) -> Result<(), DriverError> {
        self.send(Event::Pointer(board)).await
    }

    async fn send(&self, event: Event) -> Result<(), DriverError> {
        self.events.send(event).await.map_err(|_| DriverError::Stopped)
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until the state satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Stopped`] if the loop ends first.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, DriverError> {
        let snapshot = self.snapshots.wait_for(|s| predicate(s)).await.map_err(|_| DriverError::Stopped)?;
        Ok(snapshot.clone())
    }

    /// Close the channel and stop the loop. Returns the final state.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Join`] if the loop panicked.
    pub async fn leave(self) -> Result<SessionSnapshot, DriverError> {
        if self.events.send(Event::Leave).await.is_err() {
            tracing::debug!(participant_id = %self.identity.participant_id, "session loop already stopped");
        }
        Ok(self.task.await?)
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
