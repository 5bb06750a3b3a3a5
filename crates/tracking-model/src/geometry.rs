//! Planar geometry for marker outlines.
//!
//! Coordinates follow image conventions: `x` grows to the right and `y`
//! grows downward, measured in source pixels unless a scale factor has been
//! applied.

use serde::{Deserialize, Serialize};

/// A 2-D point. Serialized as a `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

/// The four ordered corners of a detected marker, as reported by the
/// detector (top-left first, clockwise in the marker's own frame).
pub type MarkerCorners = [Point2; 4];

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Divide both coordinates by `divisor`.
    pub fn scaled_down(&self, divisor: f64) -> Self {
        Self {
            x: self.x / divisor,
            y: self.y / divisor,
        }
    }

    /// Multiply both coordinates by `factor`.
    pub fn scaled_up(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

impl From<[f64; 2]> for Point2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point2> for [f64; 2] {
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Arithmetic mean of the four corners.
pub fn corner_centroid(corners: &MarkerCorners) -> Point2 {
    let (sx, sy) = corners
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2::new(sx / 4.0, sy / 4.0)
}
