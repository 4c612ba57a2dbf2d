//! Answer polygon: vertex placement and the point ⇄ weight-vector encoding.
//!
//! A board point is encoded against the two answer vertices closest to it:
//! treating those vertices as basis vectors `A = (a, b)` and `C = (c, d)`, the
//! weights solve
//!
//! ```text
//! a·w₀ + c·w₁ = x
//! b·w₀ + d·w₁ = y
//! ```
//!
//! Every other answer gets weight 0. Decoding is the weighted sum of all
//! vertices, so a vector can be turned back into a point on any board that
//! has the same number of answers.
//!
//! The encoding only depends on the answer count. Vectors whose length does
//! not match the current layout are meaningless and decode to the origin.

#[cfg(test)]
#[path = "polygon_test.rs"]
mod polygon_test;

use std::f64::consts::TAU;

use crate::consts::{ANSWER_RADIUS, START_ANGLE};
use crate::viewport::Point;

/// Place `n` answer vertices on the answer circle, clockwise from the top.
///
/// Coordinates are truncated toward zero so that opposite vertices are exact
/// mirrors of each other (two answers sit at `(0, -R)` and `(0, R)`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn vertices(n: usize) -> Vec<Point> {
    if n == 0 {
        return Vec::new();
    }
    let step = TAU / n as f64;
    (0..n)
        .map(|i| {
            let angle = START_ANGLE + step * i as f64;
            Point::new((ANSWER_RADIUS * angle.cos()).trunc(), (ANSWER_RADIUS * angle.sin()).trunc())
        })
        .collect()
}

/// Indices of the two vertices nearest to `point`, closest first.
///
/// Equal distances keep the original vertex order. Returns `None` with fewer
/// than two vertices.
#[must_use]
pub fn nearest_pair(point: Point, vertices: &[Point]) -> Option<(usize, usize)> {
    if vertices.len() < 2 {
        return None;
    }
    let mut order: Vec<usize> = (0..vertices.len()).collect();
    // `sort_by` is stable; ties stay in index order.
    order.sort_by(|&l, &r| point.distance(vertices[l]).total_cmp(&point.distance(vertices[r])));
    Some((order[0], order[1]))
}

/// Encode a board point as weights over `vertices`.
///
/// The result always has `vertices.len()` entries. With fewer than two
/// vertices it is all zeros. When the two nearest vertices are antiparallel
/// (only possible with two answers) the system is singular and the point is
/// projected onto the vertical axis instead: `w₀ = y / b`.
#[must_use]
#[allow(clippy::float_cmp, clippy::many_single_char_names)]
pub fn normalize(point: Point, vertices: &[Point]) -> Vec<f64> {
    let mut weights = vec![0.0; vertices.len()];
    let Some((first, second)) = nearest_pair(point, vertices) else {
        return weights;
    };

    let (a, b) = (vertices[first].x, vertices[first].y);
    let (c, d) = (vertices[second].x, vertices[second].y);
    let det = c * b - a * d;
    if det == 0.0 {
        if b != 0.0 {
            weights[first] = point.y / b;
        }
    } else {
        weights[first] = -(d * point.x - c * point.y) / det;
        weights[second] = (b * point.x - a * point.y) / det;
    }
    weights
}

/// Decode a weight vector back into a board point.
///
/// Returns the origin when the vector length differs from the vertex count or
/// there are fewer than two vertices.
#[must_use]
pub fn denormalize(weights: &[f64], vertices: &[Point]) -> Point {
    if weights.len() != vertices.len() || vertices.len() < 2 {
        return Point::ORIGIN;
    }
    vertices
        .iter()
        .zip(weights)
        .fold(Point::ORIGIN, |acc, (v, w)| Point::new(acc.x + v.x * w, acc.y + v.y * w))
}

/// The vertex list for the current answer set.
///
/// Rebuilt wholesale whenever the answer count changes; vertices have no
/// identity beyond their index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerLayout {
    vertices: Vec<Point>,
}

impl AnswerLayout {
    #[must_use]
    pub fn new(answer_count: usize) -> Self {
        Self { vertices: vertices(answer_count) }
    }

    /// Number of answers (and the required weight-vector length).
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Rebuild for a new answer count. Returns `true` when the layout changed.
    pub fn resize(&mut self, answer_count: usize) -> bool {
        if answer_count == self.vertices.len() {
            return false;
        }
        self.vertices = vertices(answer_count);
        true
    }

    #[must_use]
    pub fn normalize(&self, point: Point) -> Vec<f64> {
        normalize(point, &self.vertices)
    }

    #[must_use]
    pub fn denormalize(&self, weights: &[f64]) -> Point {
        denormalize(weights, &self.vertices)
    }
}
