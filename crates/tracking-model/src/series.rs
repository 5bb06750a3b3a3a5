//! Time-indexed position store and displacement series.
//!
//! Both containers are append-only and ordered by frame index. Frames are
//! processed strictly in stream order, so an out-of-order append is a
//! programming error and is rejected rather than sorted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;
use crate::sample::{MarkerId, Timestamp};

/// Positions of every marker seen in one frame.
pub type FramePositions = BTreeMap<MarkerId, Point2>;

/// The two markers whose vertical separation is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPair {
    /// Marker whose row drives the displacement entry.
    pub reference: MarkerId,
    pub target: MarkerId,
}

impl MarkerPair {
    pub fn new(reference: MarkerId, target: MarkerId) -> Result<Self, SeriesError> {
        if reference == target {
            return Err(SeriesError::DegeneratePair { id: reference });
        }
        Ok(Self { reference, target })
    }

    /// Vertical separation between the pair, if both are present.
    pub fn separation(&self, positions: &FramePositions) -> Option<f64> {
        let reference = positions.get(&self.reference)?;
        let target = positions.get(&self.target)?;
        Some((target.y - reference.y).abs())
    }
}

impl Default for MarkerPair {
    fn default() -> Self {
        Self {
            reference: 0,
            target: 1,
        }
    }
}

/// Errors raised by the append-only containers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("Frame {next} appended after frame {previous}")]
    OutOfOrder { previous: u64, next: u64 },

    #[error("Marker pair must name two different markers (got {id} twice)")]
    DegeneratePair { id: MarkerId },
}

/// Mapping from timestamp to the marker positions observed at it.
///
/// Only frames with at least one marker are stored.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesStore {
    entries: Vec<(Timestamp, FramePositions)>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the positions for a frame.
    ///
    /// Returns `Ok(false)` without storing anything when `positions` is
    /// empty.
    pub fn insert(
        &mut self,
        timestamp: Timestamp,
        positions: FramePositions,
    ) -> Result<bool, SeriesError> {
        if let Some((last, _)) = self.entries.last() {
            if timestamp.frame_index <= last.frame_index {
                return Err(SeriesError::OutOfOrder {
                    previous: last.frame_index,
                    next: timestamp.frame_index,
                });
            }
        }
        if positions.is_empty() {
            return Ok(false);
        }
        self.entries.push((timestamp, positions));
        Ok(true)
    }

    /// Positions recorded for a frame index.
    pub fn get(&self, frame_index: u64) -> Option<&FramePositions> {
        self.entries
            .binary_search_by_key(&frame_index, |(ts, _)| ts.frame_index)
            .ok()
            .map(|i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Timestamp, &FramePositions)> {
        self.entries.iter().map(|(ts, p)| (ts, p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single entry of the displacement series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplacementPoint {
    pub timestamp: Timestamp,
    pub separation: f64,
}

/// Chronological vertical separations of the tracked pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplacementSeries {
    points: Vec<DisplacementPoint>,
}

impl DisplacementSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timestamp: Timestamp, separation: f64) -> Result<(), SeriesError> {
        if let Some(last) = self.points.last() {
            if timestamp.frame_index <= last.timestamp.frame_index {
                return Err(SeriesError::OutOfOrder {
                    previous: last.timestamp.frame_index,
                    next: timestamp.frame_index,
                });
            }
        }
        self.points.push(DisplacementPoint {
            timestamp,
            separation,
        });
        Ok(())
    }

    pub fn points(&self) -> &[DisplacementPoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&DisplacementPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&DisplacementPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Entry recorded for a frame index.
    pub fn at_frame(&self, frame_index: u64) -> Option<&DisplacementPoint> {
        self.points
            .binary_search_by_key(&frame_index, |p| p.timestamp.frame_index)
            .ok()
            .map(|i| &self.points[i])
    }

    /// First/last/net reduction. `None` for an empty series.
    pub fn summary(&self) -> Option<DisplacementSummary> {
        let first = self.first()?;
        let last = self.last()?;
        Some(DisplacementSummary {
            first_time_secs: first.timestamp.seconds,
            first_separation: first.separation,
            last_time_secs: last.timestamp.seconds,
            last_separation: last.separation,
            net: last.separation - first.separation,
        })
    }
}

/// Reduction of a non-empty displacement series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplacementSummary {
    pub first_time_secs: f64,
    pub first_separation: f64,
    pub last_time_secs: f64,
    pub last_separation: f64,
    /// `last_separation - first_separation`.
    pub net: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ts(frame_index: u64) -> Timestamp {
        Timestamp::new(frame_index, frame_index as f64 / 30.0)
    }

    fn positions(entries: &[(MarkerId, f64, f64)]) -> FramePositions {
        entries
            .iter()
            .map(|&(id, x, y)| (id, Point2::new(x, y)))
            .collect()
    }

    #[test]
    fn test_store_skips_empty_frames() {
        let mut store = TimeSeriesStore::new();
        assert!(store.insert(ts(0), positions(&[(0, 1.0, 2.0)])).unwrap());
        assert!(!store.insert(ts(1), FramePositions::new()).unwrap());
        assert!(store.insert(ts(2), positions(&[(1, 3.0, 4.0)])).unwrap());
        assert_eq!(store.len(), 2);
        assert!(store.get(1).is_none());
        assert_eq!(store.get(2).unwrap()[&1], Point2::new(3.0, 4.0));
    }

    #[test]
    fn test_store_rejects_out_of_order() {
        let mut store = TimeSeriesStore::new();
        store.insert(ts(5), positions(&[(0, 0.0, 0.0)])).unwrap();
        let err = store.insert(ts(5), positions(&[(0, 0.0, 0.0)])).unwrap_err();
        assert_eq!(
            err,
            SeriesError::OutOfOrder {
                previous: 5,
                next: 5
            }
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_pair_separation_is_absolute() {
        let pair = MarkerPair::default();
        let p = positions(&[(0, 0.0, 150.0), (1, 0.0, 100.0)]);
        assert_eq!(pair.separation(&p), Some(50.0));
        let p = positions(&[(0, 0.0, 100.0), (7, 0.0, 120.0)]);
        assert_eq!(pair.separation(&p), None);
    }

    #[test]
    fn test_degenerate_pair_rejected() {
        assert!(MarkerPair::new(2, 2).is_err());
        let pair = MarkerPair::new(4, 2).unwrap();
        assert_eq!(pair.reference, 4);
    }

    #[test]
    fn test_empty_series_has_no_summary() {
        assert!(DisplacementSeries::new().summary().is_none());
    }

    #[test]
    fn test_summary_first_last_net() {
        let mut series = DisplacementSeries::new();
        series.push(ts(0), 50.0).unwrap();
        series.push(ts(12), 35.0).unwrap();
        series.push(ts(30), 20.0).unwrap();
        let summary = series.summary().unwrap();
        assert_eq!(summary.first_separation, 50.0);
        assert_eq!(summary.last_separation, 20.0);
        assert!((summary.last_time_secs - 1.0).abs() < 1e-12);
        assert!((summary.net + 30.0).abs() < 1e-12);
        assert_eq!(series.at_frame(12).unwrap().separation, 35.0);
    }

    proptest! {
        #[test]
        fn net_depends_only_on_endpoints(
            values in proptest::collection::vec(0.0f64..500.0, 1..40),
            gaps in proptest::collection::vec(1u64..20, 40),
        ) {
            let mut series = DisplacementSeries::new();
            let mut frame = 0u64;
            for (value, gap) in values.iter().zip(gaps.iter()) {
                series.push(ts(frame), *value).unwrap();
                frame += gap;
            }
            let summary = series.summary().unwrap();
            let expected = values[values.len() - 1] - values[0];
            prop_assert!((summary.net - expected).abs() < 1e-9);
        }
    }
}
