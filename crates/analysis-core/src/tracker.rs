//! Frame tracker state machine.
//!
//! The driver loop is expressed as a transition function over
//! [`FrameInput`] values so it can be exercised without a video source:
//!
//! ```text
//!            Frame(..)
//!           ┌────────┐
//!           ▼        │
//!       ┌─────────┐──┘  Cancelled   ┌─────────┐
//!       │ Running │────────────────▶│ Stopped │
//!       └─────────┘                 └─────────┘
//!           │ EndOfStream / ReadFailed
//!           ▼
//!       ┌──────────┐
//!       │ Finished │
//!       └──────────┘
//! ```
//!
//! `Stopped` and `Finished` are terminal. Every `Frame` input advances the
//! timestamp by one frame duration whether or not it contains markers.

use std::collections::BTreeMap;

use serde::Serialize;

use marktrack_common::clock::FrameClock;
use marktrack_common::error::{MarktrackError, MarktrackResult};
use marktrack_model::sample::{FrameSample, LengthUnit, MarkerDetection, MarkerId, Timestamp};
use marktrack_model::series::{
    DisplacementSeries, FramePositions, MarkerPair, SeriesError, TimeSeriesStore,
};

use crate::calibration::ScaleFactor;
use crate::displacement::DisplacementExtractor;
use crate::sample_builder::build_sample;

/// Lifecycle of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerState {
    Running,
    /// Cancelled before the stream ended.
    Stopped,
    /// The stream reported end of data or a read failure.
    Finished,
}

impl TrackerState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TrackerState::Running)
    }
}

/// What the driver observed at a frame boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    /// Cancellation was requested before the next read.
    Cancelled,
    /// The source has no more frames.
    EndOfStream,
    /// The source failed mid-stream; handled as end of data.
    ReadFailed(String),
    /// A frame was read and passed through the detector.
    Frame(Vec<MarkerDetection>),
}

/// Pure state transition.
pub fn next_state(state: TrackerState, input: &FrameInput) -> TrackerState {
    match (state, input) {
        (TrackerState::Running, FrameInput::Frame(_)) => TrackerState::Running,
        (TrackerState::Running, FrameInput::Cancelled) => TrackerState::Stopped,
        (TrackerState::Running, FrameInput::EndOfStream | FrameInput::ReadFailed(_)) => {
            TrackerState::Finished
        }
        (terminal, _) => terminal,
    }
}

/// Fixed parameters of a tracking run.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    pub clock: FrameClock,
    pub scale: Option<ScaleFactor>,
    pub pair: MarkerPair,
}

impl TrackerConfig {
    pub fn unit(&self) -> LengthUnit {
        if self.scale.is_some() {
            LengthUnit::Millimeters
        } else {
            LengthUnit::Pixels
        }
    }
}

/// One row destined for the persistent log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRow {
    pub timestamp: Timestamp,
    pub sample: FrameSample,
    /// Pair separation for the frame, present only when both markers were
    /// detected.
    pub displacement: Option<f64>,
}

/// Result of processing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub timestamp: Timestamp,
    /// One row per distinct marker, ordered by ID. Empty when nothing was
    /// detected.
    pub rows: Vec<LogRow>,
    pub separation: Option<f64>,
}

/// Outcome of a single [`FrameTracker::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Processed(FrameRecord),
    Halted(TrackerState),
}

/// Everything a finished run leaves behind.
#[derive(Debug, Clone)]
pub struct TrackerOutput {
    pub state: TrackerState,
    pub frames_read: u64,
    pub store: TimeSeriesStore,
    pub series: DisplacementSeries,
}

/// Owns the position store and displacement series for one run.
#[derive(Debug)]
pub struct FrameTracker {
    config: TrackerConfig,
    extractor: DisplacementExtractor,
    state: TrackerState,
    next_frame_index: u64,
    store: TimeSeriesStore,
    series: DisplacementSeries,
}

impl FrameTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            extractor: DisplacementExtractor::new(config.pair),
            config,
            state: TrackerState::Running,
            next_frame_index: 0,
            store: TimeSeriesStore::new(),
            series: DisplacementSeries::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Number of frames consumed so far, with or without markers.
    pub fn frames_read(&self) -> u64 {
        self.next_frame_index
    }

    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    pub fn series(&self) -> &DisplacementSeries {
        &self.series
    }

    /// Feed one observation into the state machine.
    pub fn step(&mut self, input: FrameInput) -> MarktrackResult<StepOutcome> {
        if self.state.is_terminal() {
            return Ok(StepOutcome::Halted(self.state));
        }

        let next = next_state(self.state, &input);
        match input {
            FrameInput::Frame(detections) => {
                let record = self.process_frame(&detections).map_err(series_error)?;
                Ok(StepOutcome::Processed(record))
            }
            FrameInput::Cancelled => {
                tracing::info!(frames = self.next_frame_index, "Tracking cancelled");
                self.state = next;
                Ok(StepOutcome::Halted(next))
            }
            FrameInput::EndOfStream => {
                tracing::info!(frames = self.next_frame_index, "End of stream");
                self.state = next;
                Ok(StepOutcome::Halted(next))
            }
            FrameInput::ReadFailed(reason) => {
                tracing::warn!(
                    frames = self.next_frame_index,
                    %reason,
                    "Frame read failed; finishing with data captured so far"
                );
                self.state = next;
                Ok(StepOutcome::Halted(next))
            }
        }
    }

    /// Consume the tracker, yielding the finalized store and series.
    pub fn finish(self) -> TrackerOutput {
        TrackerOutput {
            state: self.state,
            frames_read: self.next_frame_index,
            store: self.store,
            series: self.series,
        }
    }

    fn process_frame(
        &mut self,
        detections: &[MarkerDetection],
    ) -> Result<FrameRecord, SeriesError> {
        let frame_index = self.next_frame_index;
        self.next_frame_index += 1;
        let timestamp = Timestamp::new(frame_index, self.config.clock.seconds_at(frame_index));

        let mut samples: BTreeMap<MarkerId, FrameSample> = BTreeMap::new();
        for detection in detections {
            let sample = build_sample(detection, self.config.scale);
            if samples.insert(sample.marker_id, sample).is_some() {
                tracing::warn!(
                    frame = frame_index,
                    marker_id = sample.marker_id,
                    "Marker detected twice in one frame; keeping the later detection"
                );
            }
        }

        let positions: FramePositions = samples
            .iter()
            .map(|(id, sample)| (*id, sample.position))
            .collect();

        let separation = self
            .extractor
            .observe(&mut self.series, timestamp, &positions)?;
        self.store.insert(timestamp, positions)?;

        let rows = samples
            .into_values()
            .map(|sample| LogRow {
                timestamp,
                sample,
                displacement: separation,
            })
            .collect();

        Ok(FrameRecord {
            timestamp,
            rows,
            separation,
        })
    }
}

fn series_error(e: SeriesError) -> MarktrackError {
    MarktrackError::Other(anyhow::Error::new(e))
}
