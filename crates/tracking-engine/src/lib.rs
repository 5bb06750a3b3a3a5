//! Marktrack Tracking Engine
//!
//! Drives a frame source through a marker detector and the frame tracker,
//! streaming rows into the CSV log and producing the end-of-run summary.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 AnalysisSession                   │
//! │  ┌─────────────┐  ┌────────────────┐  ┌─────────┐ │
//! │  │ FrameSource │─▶│ MarkerDetector │─▶│ Frame   │ │
//! │  │ video/replay│  │ aruco/passthru │  │ Tracker │ │
//! │  └─────────────┘  └────────────────┘  └────┬────┘ │
//! │                                            │      │
//! │                                            ▼      │
//! │  ┌──────────────────────────────────────────────┐ │
//! │  │                 Run outputs                   │ │
//! │  │  marker_tracking_<stamp>.csv  *_displacement  │ │
//! │  │  .png  detections.jsonl (optional)            │ │
//! │  └──────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod replay;
pub mod session;
pub mod source;

pub use replay::ReplaySource;
pub use session::*;
pub use source::{FrameSource, MarkerDetector, PassthroughDetector};
