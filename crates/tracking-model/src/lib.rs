//! Marktrack Tracking Model
//!
//! Defines the core data contracts shared by the analysis pipeline:
//! - **Geometry:** Points and the four-corner outline of a detected marker
//! - **Dictionary:** The predefined fiducial vocabularies a detector can decode
//! - **Samples:** Per-frame marker observations, timestamps, and length units
//! - **Series:** The time-indexed position store and the displacement series
//! - **Detections:** The JSONL stream format used to replay detector output
//!
//! This crate holds data and invariants only; it performs no I/O beyond
//! (de)serialization.

pub mod detection;
pub mod dictionary;
pub mod geometry;
pub mod sample;
pub mod series;

pub use detection::*;
pub use dictionary::*;
pub use geometry::*;
pub use sample::*;
pub use series::*;
