//! Answer-board geometry for the swarm session client.
//!
//! Every question is drawn as a regular polygon whose vertices are the answer
//! options. A participant's marker is a free point inside that polygon; this
//! crate turns the point into a weight vector over the answers (and back), so
//! peers exchange weights instead of pixel coordinates. It also owns the
//! pointer-side plumbing: mapping raw screen coordinates into board space and
//! scoping drag listeners to the lifetime of a drag.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`viewport`] | Board points and the screen-to-board transform |
//! | [`polygon`] | Vertex placement, `normalize` and `denormalize` |
//! | [`drag`] | Drag sessions with guaranteed listener release |
//! | [`consts`] | Board extent, answer radius, start angle |

pub mod consts;
pub mod drag;
pub mod polygon;
pub mod viewport;

pub use drag::{DragSample, DragSession, ListenerHost};
pub use polygon::{AnswerLayout, denormalize, nearest_pair, normalize, vertices};
pub use viewport::{Point, Viewport, clamp_to_board};
