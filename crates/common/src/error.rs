//! Error types shared across marktrack crates.

/// Top-level error type for marktrack operations.
#[derive(Debug, thiserror::Error)]
pub enum MarktrackError {
    #[error("Invalid calibration input: {message}")]
    InvalidCalibrationInput { message: String },

    #[error("Video source unavailable: {message}")]
    SourceUnavailable { message: String },

    #[error("Frame read failed: {message}")]
    StreamReadFailure { message: String },

    #[error("Marker detection error: {message}")]
    Detection { message: String },

    #[error("Report error: {message}")]
    Report { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using MarktrackError.
pub type MarktrackResult<T> = Result<T, MarktrackError>;

impl MarktrackError {
    pub fn invalid_calibration(msg: impl Into<String>) -> Self {
        Self::InvalidCalibrationInput {
            message: msg.into(),
        }
    }

    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: msg.into(),
        }
    }

    pub fn stream_read(msg: impl Into<String>) -> Self {
        Self::StreamReadFailure {
            message: msg.into(),
        }
    }

    pub fn detection(msg: impl Into<String>) -> Self {
        Self::Detection {
            message: msg.into(),
        }
    }

    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the frame loop should treat this error as end of data
    /// instead of aborting the run.
    pub fn ends_stream(&self) -> bool {
        matches!(
            self,
            Self::StreamReadFailure { .. } | Self::Detection { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_detection_failures_end_the_stream() {
        assert!(MarktrackError::stream_read("eof").ends_stream());
        assert!(MarktrackError::detection("bad frame").ends_stream());
        assert!(!MarktrackError::source_unavailable("missing").ends_stream());
        let io = std::io::Error::other("disk full");
        assert!(!MarktrackError::from(io).ends_stream());
    }

    #[test]
    fn messages_name_the_failure() {
        let err = MarktrackError::invalid_calibration("distance must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid calibration input: distance must be positive"
        );
    }
}
