//! Per-marker sample construction.

use marktrack_model::geometry::{corner_centroid, MarkerCorners};
use marktrack_model::sample::{FrameSample, MarkerDetection};

use crate::calibration::ScaleFactor;

/// Build the sample for one detected marker.
///
/// The position is the mean of the four corners, converted to millimeters
/// when a scale factor is present.
pub fn build_sample(detection: &MarkerDetection, scale: Option<ScaleFactor>) -> FrameSample {
    let centroid = corner_centroid(&detection.corners);
    let position = match scale {
        Some(scale) => scale.to_millimeters(centroid),
        None => centroid,
    };

    FrameSample {
        marker_id: detection.id,
        position,
        rotation_degrees: rotation_degrees(&detection.corners),
    }
}

/// Angle of the edge from the first to the second corner, in (-180, 180].
pub fn rotation_degrees(corners: &MarkerCorners) -> f64 {
    let dx = corners[1].x - corners[0].x;
    let dy = corners[1].y - corners[0].y;
    let degrees = dy.atan2(dx).to_degrees();
    // atan2 yields -180 for a negative-zero dy
    if degrees <= -180.0 {
        degrees + 360.0
    } else {
        degrees
    }
}
