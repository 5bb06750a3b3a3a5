//! Pixel-to-millimeter calibration.
//!
//! The operator marks two points a known distance apart on a still frame and
//! enters that distance. The resulting scale factor is
//! `pixel_distance / real_distance_mm` and converts every logged position
//! from pixels to millimeters.

use serde::{Deserialize, Serialize};

use marktrack_common::error::{MarktrackError, MarktrackResult};
use marktrack_model::geometry::Point2;
use marktrack_model::sample::LengthUnit;

/// Pixels per millimeter. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub fn new(px_per_mm: f64) -> MarktrackResult<Self> {
        if !px_per_mm.is_finite() || px_per_mm <= 0.0 {
            return Err(MarktrackError::invalid_calibration(format!(
                "scale factor must be positive, got {px_per_mm}"
            )));
        }
        Ok(Self(px_per_mm))
    }

    pub fn px_per_mm(&self) -> f64 {
        self.0
    }

    /// Convert a pixel position to millimeters.
    pub fn to_millimeters(&self, pixel: Point2) -> Point2 {
        pixel.scaled_down(self.0)
    }

    /// Convert a millimeter position back to pixels.
    pub fn to_pixels(&self, mm: Point2) -> Point2 {
        mm.scaled_up(self.0)
    }
}

/// Compute a scale factor from two pixel points and their real distance.
///
/// Fails with `InvalidCalibrationInput` when the distance is missing,
/// non-finite or non-positive, or when the points coincide.
pub fn calibrate(
    p1: Point2,
    p2: Point2,
    real_distance_mm: Option<f64>,
) -> MarktrackResult<ScaleFactor> {
    let real_mm = real_distance_mm
        .ok_or_else(|| MarktrackError::invalid_calibration("distance entry was cancelled"))?;
    if !real_mm.is_finite() || real_mm <= 0.0 {
        return Err(MarktrackError::invalid_calibration(format!(
            "real distance must be a positive number of millimeters, got {real_mm}"
        )));
    }

    let pixel_distance = p1.distance_to(&p2);
    if pixel_distance <= 0.0 {
        return Err(MarktrackError::invalid_calibration(
            "calibration points coincide",
        ));
    }

    ScaleFactor::new(pixel_distance / real_mm)
}

/// Parse the operator's answer to the distance prompt.
///
/// An empty answer counts as a cancelled prompt.
pub fn parse_distance_mm(input: &str) -> MarktrackResult<Option<f64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .map(Some)
        .map_err(|_| MarktrackError::invalid_calibration(format!("not a number: {trimmed:?}")))
}

/// Collects the two calibration clicks.
///
/// Clicks may be captured on a downscaled preview; `display_scale` is the
/// preview-to-source ratio (e.g. `0.5` when the preview is half size) and
/// captured points are mapped back to source pixels.
#[derive(Debug, Clone)]
pub struct CalibrationCapture {
    points: Vec<Point2>,
    display_scale: f64,
}

impl CalibrationCapture {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(2),
            display_scale: 1.0,
        }
    }

    /// Capture on a preview scaled by `display_scale` relative to the source.
    pub fn with_display_scale(display_scale: f64) -> MarktrackResult<Self> {
        if !display_scale.is_finite() || display_scale <= 0.0 {
            return Err(MarktrackError::invalid_calibration(format!(
                "display scale must be positive, got {display_scale}"
            )));
        }
        Ok(Self {
            points: Vec::with_capacity(2),
            display_scale,
        })
    }

    /// Record a click in display coordinates. Clicks after the second are
    /// ignored. Returns the number of points held.
    pub fn push_point(&mut self, display_point: Point2) -> usize {
        if self.points.len() < 2 {
            self.points.push(display_point.scaled_down(self.display_scale));
        }
        self.points.len()
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() == 2
    }

    /// Captured points in source pixels.
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Distance between the captured points in source pixels.
    pub fn pixel_distance(&self) -> Option<f64> {
        match self.points.as_slice() {
            [a, b] => Some(a.distance_to(b)),
            _ => None,
        }
    }

    /// Complete the capture with the distance prompt answer.
    pub fn finish(self, real_distance_mm: Option<f64>) -> MarktrackResult<ScaleFactor> {
        match self.points.as_slice() {
            [a, b] => calibrate(*a, *b, real_distance_mm),
            held => Err(MarktrackError::invalid_calibration(format!(
                "capture cancelled with {} of 2 points",
                held.len()
            ))),
        }
    }
}

impl Default for CalibrationCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the run's scale factor across calibration attempts.
///
/// A successful attempt fully replaces the previous scale; a failed attempt
/// leaves it untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calibration {
    scale: Option<ScaleFactor>,
}

impl Calibration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(scale: ScaleFactor) -> Self {
        Self { scale: Some(scale) }
    }

    /// Apply the result of a calibration attempt.
    pub fn apply(&mut self, attempt: MarktrackResult<ScaleFactor>) -> MarktrackResult<ScaleFactor> {
        match attempt {
            Ok(scale) => {
                if let Some(previous) = self.scale {
                    tracing::debug!(
                        previous = previous.px_per_mm(),
                        next = scale.px_per_mm(),
                        "Replacing scale factor"
                    );
                }
                tracing::info!(px_per_mm = scale.px_per_mm(), "Calibration complete");
                self.scale = Some(scale);
                Ok(scale)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    unit = %self.unit(),
                    "Calibration failed; keeping current units"
                );
                Err(e)
            }
        }
    }

    /// Calibrate from two points and a distance, replacing any prior scale.
    pub fn recalibrate(
        &mut self,
        p1: Point2,
        p2: Point2,
        real_distance_mm: Option<f64>,
    ) -> MarktrackResult<ScaleFactor> {
        self.apply(calibrate(p1, p2, real_distance_mm))
    }

    pub fn scale(&self) -> Option<ScaleFactor> {
        self.scale
    }

    /// Unit positions will be reported in.
    pub fn unit(&self) -> LengthUnit {
        if self.scale.is_some() {
            LengthUnit::Millimeters
        } else {
            LengthUnit::Pixels
        }
    }
}
