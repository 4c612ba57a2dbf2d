//! Drag tracking for the local marker.
//!
//! A drag starts on pointer-down over the marker and ends on pointer-up. While
//! it is active the host must deliver pointer-move events, which usually means
//! registering document-level listeners. [`DragSession`] ties that
//! registration to a value: listeners are attached when the session is
//! pressed and detached when it is dropped, so a release, an early return, or
//! an unwinding panic all leave the host without stray listeners.
//!
//! Each move is mapped through the [`Viewport`] into board space, clamped to
//! the board, and encoded against the current [`AnswerLayout`].

#[cfg(test)]
#[path = "drag_test.rs"]
mod drag_test;

use crate::polygon::AnswerLayout;
use crate::viewport::{Point, Viewport, clamp_to_board};

/// Something that can route pointer-move / pointer-up events to a drag.
pub trait ListenerHost {
    /// Start delivering move and release events.
    fn attach_drag_listeners(&mut self);
    /// Stop delivering move and release events.
    fn detach_drag_listeners(&mut self);
}

/// One processed pointer-move.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSample {
    /// Clamped board-space marker position.
    pub position: Point,
    /// `position` encoded against the layout that was current for this move.
    pub weights: Vec<f64>,
}

impl DragSample {
    /// Build a sample directly from a board-space point.
    #[must_use]
    pub fn at(board: Point, layout: &AnswerLayout) -> Self {
        let position = clamp_to_board(board);
        Self { position, weights: layout.normalize(position) }
    }
}

/// An active drag. Listeners stay attached exactly as long as this value lives.
pub struct DragSession<'h, H: ListenerHost> {
    host: &'h mut H,
    viewport: Viewport,
    moves: usize,
}

impl<'h, H: ListenerHost> DragSession<'h, H> {
    /// Pointer-down on the marker: attach listeners and start tracking.
    pub fn press(host: &'h mut H, viewport: Viewport) -> Self {
        host.attach_drag_listeners();
        Self { host, viewport, moves: 0 }
    }

    /// Pointer-move at `screen` (CSS pixels).
    pub fn move_to(&mut self, screen: Point, layout: &AnswerLayout) -> DragSample {
        self.moves += 1;
        DragSample::at(self.viewport.screen_to_board(screen), layout)
    }

    /// Number of moves processed so far.
    #[must_use]
    pub fn moves(&self) -> usize {
        self.moves
    }

    /// Pointer-up: end the drag. Returns the number of moves processed.
    #[must_use = "the move count is the only result of a release"]
    pub fn release(self) -> usize {
        self.moves
    }
}

impl<H: ListenerHost> Drop for DragSession<'_, H> {
    fn drop(&mut self) {
        self.host.detach_drag_listeners();
    }
}
