//! Marktrack Log
//!
//! Durable outputs of a tracking run:
//! - **CSV log:** one row per marker per frame, streamed as frames are
//!   processed, followed by an optional summary block
//! - **Detection stream:** append-only JSONL record of raw detector output
//!   that can be replayed later
//!
//! The CSV log is reopened in append mode for every write and closed
//! immediately after, so a crash never loses rows already emitted.

pub mod csv_log;
pub mod detection_writer;

pub use csv_log::*;
pub use detection_writer::DetectionWriter;
