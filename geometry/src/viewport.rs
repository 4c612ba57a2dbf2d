#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{BOARD_HALF_EXTENT, BOARD_SIZE};

/// A point in either screen or board space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The board center.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Clamp a board-space point into the `[-500, 500]²` square.
#[must_use]
pub fn clamp_to_board(point: Point) -> Point {
    Point {
        x: point.x.clamp(-BOARD_HALF_EXTENT, BOARD_HALF_EXTENT),
        y: point.y.clamp(-BOARD_HALF_EXTENT, BOARD_HALF_EXTENT),
    }
}

/// On-screen rectangle the board is drawn into.
///
/// The board's `-500 -500 1000 1000` view box is scaled uniformly to fit the
/// rectangle and centered along the longer axis. `left` / `top` / `width` /
/// `height` are in CSS pixels, relative to the same origin as pointer events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { left: 0.0, top: 0.0, width: BOARD_SIZE, height: BOARD_SIZE }
    }
}

impl Viewport {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Screen pixels per board unit.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.width.min(self.height) / BOARD_SIZE
    }

    /// Convert a screen-space point (CSS pixels) to board coordinates.
    ///
    /// A collapsed viewport (zero or negative size) maps everything to the origin.
    #[must_use]
    pub fn screen_to_board(&self, screen: Point) -> Point {
        let scale = self.scale();
        if scale <= 0.0 || !scale.is_finite() {
            return Point::ORIGIN;
        }
        let (pad_x, pad_y) = self.padding(scale);
        Point {
            x: (screen.x - self.left - pad_x) / scale - BOARD_HALF_EXTENT,
            y: (screen.y - self.top - pad_y) / scale - BOARD_HALF_EXTENT,
        }
    }

    /// Convert a board-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn board_to_screen(&self, board: Point) -> Point {
        let scale = self.scale();
        let (pad_x, pad_y) = self.padding(scale);
        Point {
            x: (board.x + BOARD_HALF_EXTENT) * scale + self.left + pad_x,
            y: (board.y + BOARD_HALF_EXTENT) * scale + self.top + pad_y,
        }
    }

    /// Letterbox padding on each axis once the board is scaled to fit.
    fn padding(&self, scale: f64) -> (f64, f64) {
        let drawn = BOARD_SIZE * scale;
        ((self.width - drawn) / 2.0, (self.height - drawn) / 2.0)
    }
}
