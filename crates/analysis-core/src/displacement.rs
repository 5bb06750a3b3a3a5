//! Relative vertical displacement of the tracked marker pair.

use marktrack_model::sample::Timestamp;
use marktrack_model::series::{DisplacementSeries, FramePositions, MarkerPair, SeriesError};

/// Appends one series entry per frame in which both markers of the pair
/// are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplacementExtractor {
    pair: MarkerPair,
}

impl DisplacementExtractor {
    pub fn new(pair: MarkerPair) -> Self {
        Self { pair }
    }

    pub fn pair(&self) -> MarkerPair {
        self.pair
    }

    /// Record the frame's separation, if any, and return it.
    ///
    /// The entry is keyed off the reference marker: a frame holding only the
    /// target produces nothing.
    pub fn observe(
        &self,
        series: &mut DisplacementSeries,
        timestamp: Timestamp,
        positions: &FramePositions,
    ) -> Result<Option<f64>, SeriesError> {
        let Some(separation) = self.pair.separation(positions) else {
            return Ok(None);
        };
        series.push(timestamp, separation)?;
        Ok(Some(separation))
    }
}
