//! Marktrack Analysis Core
//!
//! Turns detector output into physical measurements:
//! - **Calibration:** Derive a pixels-per-millimeter scale from two points
//! - **Sample Builder:** Centroid and rotation for each detected marker
//! - **Tracker:** The per-frame state machine feeding the position store
//! - **Displacement:** Vertical separation of the tracked marker pair
//! - **Summary:** First/last/net reduction and its human-readable form
//!
//! This crate is pure computation with no file, video, or display I/O.
//! All inputs are data; all outputs are data.

pub mod calibration;
pub mod displacement;
pub mod sample_builder;
pub mod summary;
pub mod tracker;

pub use calibration::{Calibration, CalibrationCapture, ScaleFactor};
pub use displacement::DisplacementExtractor;
pub use tracker::{FrameInput, FrameTracker, TrackerState};
