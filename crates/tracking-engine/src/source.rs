//! Frame source and detector interfaces.

use marktrack_common::error::MarktrackResult;
use marktrack_model::sample::{MarkerDetection, MarkerId};

/// A sequential source of frames with a fixed frame rate.
pub trait FrameSource: Send {
    type Frame;

    /// Nominal frames per second reported by the source.
    fn frames_per_second(&self) -> f64;

    /// Read the next frame. `Ok(None)` signals end of data.
    fn read_frame(&mut self) -> MarktrackResult<Option<Self::Frame>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Finds markers in a frame.
pub trait MarkerDetector<F>: Send {
    /// Detected markers in any order, possibly none.
    fn detect(&mut self, frame: &F) -> MarktrackResult<Vec<MarkerDetection>>;
}

/// Detector for sources whose frames already are detections.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDetector;

impl MarkerDetector<Vec<MarkerDetection>> for PassthroughDetector {
    fn detect(&mut self, frame: &Vec<MarkerDetection>) -> MarktrackResult<Vec<MarkerDetection>> {
        Ok(frame.clone())
    }
}

/// Convert a raw detector ID. Negative IDs are dropped with a warning.
pub fn accept_marker_id(raw: i64) -> Option<MarkerId> {
    match MarkerId::try_from(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::warn!(raw_id = raw, "Dropping marker with out-of-range ID");
            None
        }
    }
}
