//! Video decoding and marker detection backends.
//!
//! The OpenCV backend is compiled only with the `opencv` feature. Without it
//! the engine can still analyze recorded detection streams through
//! [`crate::replay::ReplaySource`].

#[cfg(feature = "opencv")]
pub mod opencv;

#[cfg(feature = "opencv")]
pub use self::opencv::{ArucoMarkerDetector, VideoFileSource};

/// Whether this build can decode video files directly.
pub fn video_backend_available() -> bool {
    cfg!(feature = "opencv")
}
