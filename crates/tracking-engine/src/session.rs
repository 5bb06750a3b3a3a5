//! Analysis session: one pass over a frame source.

use std::path::PathBuf;

use serde::Serialize;

use marktrack_analysis::calibration::ScaleFactor;
use marktrack_analysis::summary::{render_outcome_text, SummaryOutcome};
use marktrack_analysis::tracker::{
    FrameInput, FrameTracker, StepOutcome, TrackerConfig, TrackerState,
};
use marktrack_common::cancel::CancellationToken;
use marktrack_common::clock::{run_stamp_now, FrameClock};
use marktrack_common::error::{MarktrackError, MarktrackResult};
use marktrack_log::{log_path_for, DetectionWriter, MarkerLog};
use marktrack_model::detection::DetectionStreamHeader;
use marktrack_model::dictionary::MarkerDictionary;
use marktrack_model::sample::LengthUnit;
use marktrack_model::series::MarkerPair;
use marktrack_report::{plot_path_for, write_displacement_plot, PlotConfig};

use crate::source::{FrameSource, MarkerDetector};

/// Parameters of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Video (or detection stream) being analyzed. Its directory receives
    /// the log unless `output_dir` is set.
    pub source_path: PathBuf,

    /// Dictionary the detector was configured with.
    pub dictionary: MarkerDictionary,

    /// Pixels per millimeter. Positions are logged in pixels when absent.
    pub scale: Option<ScaleFactor>,

    /// Marker pair whose vertical separation is tracked.
    pub pair: MarkerPair,

    pub output_dir: Option<PathBuf>,

    /// Plot settings; `None` disables the plot.
    pub plot: Option<PlotConfig>,

    /// Write detector output to this JSONL file while analyzing.
    pub dump_detections: Option<PathBuf>,
}

impl AnalysisConfig {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            dictionary: MarkerDictionary::default(),
            scale: None,
            pair: MarkerPair::default(),
            output_dir: None,
            plot: Some(PlotConfig::default()),
            dump_detections: None,
        }
    }

    pub fn unit(&self) -> LengthUnit {
        if self.scale.is_some() {
            LengthUnit::Millimeters
        } else {
            LengthUnit::Pixels
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source: PathBuf,
    pub log_path: PathBuf,
    pub unit: LengthUnit,
    pub pair: MarkerPair,
    pub frames_read: u64,
    /// Frames with at least one marker.
    pub frames_with_markers: u64,
    pub rows_written: u64,
    pub state: TrackerState,
    pub summary: SummaryOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detections_path: Option<PathBuf>,
}

impl RunReport {
    /// Human-readable summary or the no-co-occurrence notice.
    pub fn summary_text(&self) -> String {
        render_outcome_text(&self.summary, self.pair, self.unit)
    }
}

/// Runs a frame source through a detector and the tracker.
///
/// The session is blocking; callers on an async runtime run it inside
/// `spawn_blocking` and cancel it through [`AnalysisSession::cancellation_token`].
pub struct AnalysisSession<S, D> {
    config: AnalysisConfig,
    source: S,
    detector: D,
    cancel: CancellationToken,
    run_stamp: Option<String>,
}

impl<S, D> AnalysisSession<S, D>
where
    S: FrameSource,
    D: MarkerDetector<S::Frame>,
{
    pub fn new(config: AnalysisConfig, source: S, detector: D) -> Self {
        Self {
            config,
            source,
            detector,
            cancel: CancellationToken::new(),
            run_stamp: None,
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Fix the stamp used in output file names instead of the current time.
    pub fn with_run_stamp(mut self, stamp: impl Into<String>) -> Self {
        self.run_stamp = Some(stamp.into());
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run to end of data or cancellation, then summarize.
    ///
    /// Fails with `SourceUnavailable` before any file is created if the
    /// source has no usable frame rate or no first frame.
    pub fn run(mut self) -> MarktrackResult<RunReport> {
        let clock = FrameClock::new(self.source.frames_per_second())?;
        let first = match self.source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                return Err(MarktrackError::source_unavailable(format!(
                    "{} yielded no frames",
                    self.source.name()
                )))
            }
            Err(e) => {
                return Err(MarktrackError::source_unavailable(format!(
                    "cannot read first frame of {}: {e}",
                    self.source.name()
                )))
            }
        };

        let pair = self.config.pair;
        let unit = self.config.unit();
        let stamp = self.run_stamp.take().unwrap_or_else(run_stamp_now);
        let log_path = log_path_for(
            &self.config.source_path,
            self.config.output_dir.as_deref(),
            &stamp,
        );

        // The dump opens first so a bad dump path leaves no orphan log.
        let mut dump = match &self.config.dump_detections {
            Some(path) => {
                let mut header = DetectionStreamHeader::new(clock.fps());
                header.dictionary = Some(self.config.dictionary);
                header.source = Some(self.config.source_path.display().to_string());
                Some(DetectionWriter::new(path.clone(), &header)?)
            }
            None => None,
        };
        let mut log = MarkerLog::create(log_path, unit)?;

        tracing::info!(
            source = %self.source.name(),
            fps = clock.fps(),
            dictionary = %self.config.dictionary,
            reference_id = pair.reference,
            target_id = pair.target,
            %unit,
            "Analysis started"
        );

        let mut tracker = FrameTracker::new(TrackerConfig {
            clock,
            scale: self.config.scale,
            pair,
        });
        let mut pending = Some(first);

        loop {
            let input = next_input(
                &mut self.source,
                &mut self.detector,
                &self.cancel,
                &mut pending,
            )?;
            if let (FrameInput::Frame(detections), Some(writer)) = (&input, dump.as_mut()) {
                writer.write_frame(detections)?;
            }
            match tracker.step(input)? {
                StepOutcome::Processed(record) => log.append_rows(&record.rows)?,
                StepOutcome::Halted(_) => break,
            }
        }

        let detections_path = match dump.as_mut() {
            Some(writer) => {
                writer.flush()?;
                Some(writer.path().clone())
            }
            None => None,
        };

        let output = tracker.finish();
        let outcome = SummaryOutcome::from_series(&output.series);
        tracing::info!(
            state = ?output.state,
            frames = output.frames_read,
            frames_with_markers = output.store.len(),
            paired_frames = output.series.len(),
            "{}",
            render_outcome_text(&outcome, pair, unit)
        );

        let mut plot_path = None;
        if let Some(summary) = outcome.summary() {
            log.append_summary(summary, pair)?;

            if let Some(plot_config) = &self.config.plot {
                let path = plot_path_for(log.path());
                match write_displacement_plot(&path, &output.series, pair, unit, plot_config) {
                    Ok(()) => plot_path = Some(path),
                    Err(e) => tracing::warn!(error = %e, "Displacement plot not written"),
                }
            }
        }

        Ok(RunReport {
            source: self.config.source_path.clone(),
            log_path: log.path().to_path_buf(),
            unit,
            pair,
            frames_read: output.frames_read,
            frames_with_markers: output.store.len() as u64,
            rows_written: log.rows_written(),
            state: output.state,
            summary: outcome,
            plot_path,
            detections_path,
        })
    }
}

/// Observe the next frame boundary. Cancellation is checked before reading;
/// read and detector failures end the stream, other errors abort the run.
fn next_input<S, D>(
    source: &mut S,
    detector: &mut D,
    cancel: &CancellationToken,
    pending: &mut Option<S::Frame>,
) -> MarktrackResult<FrameInput>
where
    S: FrameSource,
    D: MarkerDetector<S::Frame>,
{
    if cancel.is_cancelled() {
        return Ok(FrameInput::Cancelled);
    }

    let frame = match pending.take() {
        Some(frame) => frame,
        None => match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(FrameInput::EndOfStream),
            Err(e) if e.ends_stream() => return Ok(FrameInput::ReadFailed(e.to_string())),
            Err(e) => return Err(e),
        },
    };

    match detector.detect(&frame) {
        Ok(detections) => Ok(FrameInput::Frame(detections)),
        Err(e) if e.ends_stream() => Ok(FrameInput::ReadFailed(e.to_string())),
        Err(e) => Err(e),
    }
}
