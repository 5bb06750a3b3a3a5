//! Detection stream format.
//!
//! A detection stream records detector output so a run can be replayed
//! without decoding the video again. The first line is a `#`-prefixed JSON
//! header; every following non-blank line is one frame in stream order,
//! including frames in which nothing was detected.

use serde::{Deserialize, Serialize};

use crate::dictionary::MarkerDictionary;
use crate::sample::MarkerDetection;

/// Current detection stream schema version.
pub const DETECTION_SCHEMA_VERSION: &str = "1.0";

/// Header line of a detection stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionStreamHeader {
    pub schema_version: String,

    /// Frame rate of the source video.
    pub fps: f64,

    /// Dictionary the detector was configured with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<MarkerDictionary>,

    /// Path or name of the source video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl DetectionStreamHeader {
    pub fn new(fps: f64) -> Self {
        Self {
            schema_version: DETECTION_SCHEMA_VERSION.to_string(),
            fps,
            dictionary: None,
            source: None,
        }
    }

    /// Parse a `# {...}` header line. Returns `None` if the line is not a
    /// header comment.
    pub fn parse_line(line: &str) -> Option<Result<Self, serde_json::Error>> {
        let json = line.trim().strip_prefix('#')?;
        Some(serde_json::from_str(json.trim()))
    }

    /// Render as a header line (without trailing newline).
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        Ok(format!("# {}", serde_json::to_string(self)?))
    }
}

/// Markers detected in a single frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionFrame {
    #[serde(default)]
    pub markers: Vec<MarkerDetection>,
}

impl DetectionFrame {
    pub fn new(markers: Vec<MarkerDetection>) -> Self {
        Self { markers }
    }
}

/// Parse all frame lines of a detection stream, skipping the header and
/// blank lines.
pub fn parse_detection_frames(jsonl: &str) -> Result<Vec<DetectionFrame>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_line() {
        let mut header = DetectionStreamHeader::new(30.0);
        header.dictionary = Some("DICT_6X6_100".parse().unwrap());
        let line = header.to_line().unwrap();
        assert!(line.starts_with("# {"));

        let parsed = DetectionStreamHeader::parse_line(&line).unwrap().unwrap();
        assert_eq!(parsed, header);
        assert!(DetectionStreamHeader::parse_line("{\"markers\":[]}").is_none());
    }

    #[test]
    fn test_parse_frames_keeps_empty_frames() {
        let jsonl = "# {\"schema_version\":\"1.0\",\"fps\":30.0}\n\
                     {\"markers\":[{\"id\":0,\"corners\":[[0,0],[2,0],[2,2],[0,2]]}]}\n\
                     {\"markers\":[]}\n\
                     \n\
                     {}\n";
        let frames = parse_detection_frames(jsonl).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].markers[0].id, 0);
        assert!(frames[1].markers.is_empty());
        assert!(frames[2].markers.is_empty());
    }

    #[test]
    fn test_parse_frames_rejects_short_corner_list() {
        let jsonl = "{\"markers\":[{\"id\":0,\"corners\":[[0,0],[2,0],[2,2]]}]}\n";
        assert!(parse_detection_frames(jsonl).is_err());
    }
}
