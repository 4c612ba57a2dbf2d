//! Swarm session client.
//!
//! ARCHITECTURE
//! ============
//! A participant joins a session, waits for the host to set up a question,
//! then drags a marker inside the answer polygon while every other
//! participant does the same. Each marker travels as a weight vector over the
//! answers; the cue is the mean of all vectors that match the current layout.
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Participant identity and environment configuration |
//! | [`transport`] | Pub/sub seam and the in-process broker |
//! | [`channel`] | Topic validation, echo suppression, publishing |
//! | [`api`] | Session REST collaborator (HTTP and in-memory) |
//! | [`aggregate`] | Cue computation over the peer map |
//! | [`session`] | The I/O-free session state machine |
//! | [`driver`] | The async event loop that runs a session |
//!
//! Geometry lives in the `geometry` crate and the wire contract in `wire`.

pub mod aggregate;
pub mod api;
pub mod channel;
pub mod config;
pub mod driver;
pub mod session;
pub mod transport;

pub use api::{FetchError, HttpApi, MemoryApi, SessionApi};
pub use channel::{ChannelHandler, SessionChannel};
pub use config::{ClientConfig, ConfigError, Identity};
pub use driver::{DriverError, DriverHandle, SessionDriver};
pub use session::{Effect, Question, QuestionStatus, SessionCore, SessionSnapshot, SessionStatus};
pub use transport::{InboundMessage, Inbox, LocalBroker, LocalTransport, Transport, TransportError};
