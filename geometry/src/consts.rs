//! Shared numeric constants for the geometry crate.

// ── Board ───────────────────────────────────────────────────────

/// Half the side of the square board; positions are clamped to
/// `[-BOARD_HALF_EXTENT, BOARD_HALF_EXTENT]` on both axes.
pub const BOARD_HALF_EXTENT: f64 = 500.0;

/// Full side of the square board in board units.
pub const BOARD_SIZE: f64 = BOARD_HALF_EXTENT * 2.0;

// ── Answers ─────────────────────────────────────────────────────

/// Distance from the board center to every answer vertex.
pub const ANSWER_RADIUS: f64 = 430.0;

/// Angle of the first answer vertex (straight up in screen space).
pub const START_ANGLE: f64 = -std::f64::consts::FRAC_PI_2;
