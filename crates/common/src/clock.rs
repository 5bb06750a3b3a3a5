//! Frame clock and run stamp utilities.
//!
//! Marktrack never uses wall-clock time for analysis. Every timestamp is
//! derived from the frame index and the source frame rate, so a replayed
//! stream produces the same series as the original decode. Wall-clock time
//! only appears in run stamps used to name output files.

use chrono::{DateTime, Local};

use crate::error::{MarktrackError, MarktrackResult};

/// Converts frame indices into seconds for a fixed frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    fps: f64,
}

impl FrameClock {
    /// Create a clock for the given frame rate.
    ///
    /// Non-finite or non-positive rates are rejected; a source reporting
    /// such a rate cannot produce meaningful timestamps.
    pub fn new(fps: f64) -> MarktrackResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(MarktrackError::source_unavailable(format!(
                "invalid frame rate: {fps}"
            )));
        }
        Ok(Self { fps })
    }

    /// Frames per second.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Duration of a single frame in seconds.
    pub fn frame_duration_secs(&self) -> f64 {
        1.0 / self.fps
    }

    /// Seconds since stream start for the given frame index.
    pub fn seconds_at(&self, frame_index: u64) -> f64 {
        frame_index as f64 / self.fps
    }
}

/// Format a run stamp (`YYYYmmdd-HHMMSS`) used to suffix output files.
pub fn run_stamp(at: DateTime<Local>) -> String {
    at.format("%Y%m%d-%H%M%S").to_string()
}

/// Run stamp for the current local time.
pub fn run_stamp_now() -> String {
    run_stamp(Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_seconds_at_thirty_fps() {
        let clock = FrameClock::new(30.0).unwrap();
        assert_eq!(clock.seconds_at(0), 0.0);
        assert!((clock.seconds_at(30) - 1.0).abs() < 1e-12);
        assert!((clock.seconds_at(45) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_consecutive_frames_step_by_one_duration() {
        let clock = FrameClock::new(29.97).unwrap();
        for i in 0..500 {
            let step = clock.seconds_at(i + 1) - clock.seconds_at(i);
            assert!((step - clock.frame_duration_secs()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_invalid_rates_rejected() {
        assert!(FrameClock::new(0.0).is_err());
        assert!(FrameClock::new(-25.0).is_err());
        assert!(FrameClock::new(f64::NAN).is_err());
        assert!(FrameClock::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_run_stamp_format() {
        let at = Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(run_stamp(at), "20260307-090502");
    }
}
