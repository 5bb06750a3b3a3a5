//! Per-frame marker observations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{MarkerCorners, Point2};

/// Identifier decoded from a marker. Unique within a frame only.
pub type MarkerId = u32;

/// Raw detector output for a single marker in a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetection {
    pub id: MarkerId,
    pub corners: MarkerCorners,
}

impl MarkerDetection {
    pub fn new(id: MarkerId, corners: MarkerCorners) -> Self {
        Self { id, corners }
    }

    /// Axis-aligned square outline centered at `(cx, cy)`, corners ordered
    /// top-left, top-right, bottom-right, bottom-left.
    pub fn square(id: MarkerId, cx: f64, cy: f64, half_side: f64) -> Self {
        Self {
            id,
            corners: [
                Point2::new(cx - half_side, cy - half_side),
                Point2::new(cx + half_side, cy - half_side),
                Point2::new(cx + half_side, cy + half_side),
                Point2::new(cx - half_side, cy + half_side),
            ],
        }
    }
}

/// Unit of logged positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Millimeters,
    Pixels,
}

impl LengthUnit {
    /// Short label used in headers and reports.
    pub fn label(&self) -> &'static str {
        match self {
            LengthUnit::Millimeters => "mm",
            LengthUnit::Pixels => "px",
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Position of a frame in the stream.
///
/// `seconds` is derived from `frame_index` and the stream frame rate; it is
/// never wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    pub frame_index: u64,
    pub seconds: f64,
}

impl Timestamp {
    pub fn new(frame_index: u64, seconds: f64) -> Self {
        Self {
            frame_index,
            seconds,
        }
    }
}

/// One detected marker converted to output units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub marker_id: MarkerId,
    /// Centroid, in millimeters when calibrated, otherwise pixels.
    pub position: Point2,
    /// Planar angle of the first marker edge, in (-180, 180].
    pub rotation_degrees: f64,
}
