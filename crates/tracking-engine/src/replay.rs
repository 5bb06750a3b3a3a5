//! Replay of a recorded detection stream.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use serde::Deserialize;

use marktrack_common::error::{MarktrackError, MarktrackResult};
use marktrack_model::detection::DetectionStreamHeader;
use marktrack_model::geometry::MarkerCorners;
use marktrack_model::sample::MarkerDetection;

use crate::source::{accept_marker_id, FrameSource};

/// Frame line as written on disk. IDs are parsed wide so negative values
/// can be dropped instead of failing the whole line.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    markers: Vec<RawMarker>,
}

#[derive(Debug, Deserialize)]
struct RawMarker {
    id: i64,
    corners: MarkerCorners,
}

/// Reads frames from a JSONL detection stream. Each frame is the list of
/// detections recorded for it.
pub struct ReplaySource {
    name: String,
    header: DetectionStreamHeader,
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl ReplaySource {
    /// Open a stream and read its header.
    pub fn open(path: &Path) -> MarktrackResult<Self> {
        let file = File::open(path).map_err(|e| {
            MarktrackError::source_unavailable(format!("cannot open {}: {e}", path.display()))
        })?;
        let mut lines = BufReader::new(file).lines();
        let mut line_number = 0;

        let header = loop {
            let Some(line) = lines.next() else {
                return Err(MarktrackError::source_unavailable(format!(
                    "{} is empty",
                    path.display()
                )));
            };
            line_number += 1;
            let line = line.map_err(|e| MarktrackError::source_unavailable(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            match DetectionStreamHeader::parse_line(&line) {
                Some(Ok(header)) => break header,
                Some(Err(e)) => {
                    return Err(MarktrackError::source_unavailable(format!(
                        "invalid detection stream header: {e}"
                    )))
                }
                None => {
                    return Err(MarktrackError::source_unavailable(
                        "detection stream has no header line",
                    ))
                }
            }
        };

        tracing::debug!(
            path = %path.display(),
            fps = header.fps,
            dictionary = ?header.dictionary.map(|d| d.to_string()),
            "Detection stream opened"
        );

        Ok(Self {
            name: path.display().to_string(),
            header,
            lines,
            line_number,
        })
    }

    pub fn header(&self) -> &DetectionStreamHeader {
        &self.header
    }
}

impl FrameSource for ReplaySource {
    type Frame = Vec<MarkerDetection>;

    fn frames_per_second(&self) -> f64 {
        self.header.fps
    }

    fn read_frame(&mut self) -> MarktrackResult<Option<Self::Frame>> {
        for line in self.lines.by_ref() {
            self.line_number += 1;
            let line = line.map_err(|e| MarktrackError::stream_read(e.to_string()))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let frame: RawFrame = serde_json::from_str(trimmed).map_err(|e| {
                MarktrackError::stream_read(format!("line {}: {e}", self.line_number))
            })?;
            let detections = frame
                .markers
                .into_iter()
                .filter_map(|m| {
                    accept_marker_id(m.id).map(|id| MarkerDetection::new(id, m.corners))
                })
                .collect();
            return Ok(Some(detections));
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_stream(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("marktrack_test_replay");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_replay_reads_frames_in_order() {
        let path = write_stream(
            "ordered.jsonl",
            concat!(
                "# {\"schema_version\":\"1.0\",\"fps\":25.0,\"dictionary\":\"DICT_5X5_100\"}\n",
                "{\"markers\":[{\"id\":0,\"corners\":[[0,0],[2,0],[2,2],[0,2]]}]}\n",
                "\n",
                "{\"markers\":[]}\n",
                "{\"markers\":[{\"id\":-4,\"corners\":[[0,0],[1,0],[1,1],[0,1]]},",
                "{\"id\":1,\"corners\":[[0,5],[2,5],[2,7],[0,7]]}]}\n",
            ),
        );

        let mut source = ReplaySource::open(&path).unwrap();
        assert_eq!(source.frames_per_second(), 25.0);
        assert_eq!(
            source.header().dictionary.map(|d| d.to_string()).as_deref(),
            Some("DICT_5X5_100")
        );

        assert_eq!(source.read_frame().unwrap().unwrap()[0].id, 0);
        assert!(source.read_frame().unwrap().unwrap().is_empty());
        let third = source.read_frame().unwrap().unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].id, 1);
        assert!(source.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let err = ReplaySource::open(Path::new("/nonexistent/marktrack.jsonl"))
            .err()
            .unwrap();
        assert!(matches!(err, MarktrackError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_headerless_stream_is_source_unavailable() {
        let path = write_stream("headerless.jsonl", "{\"markers\":[]}\n");
        let err = ReplaySource::open(&path).err().unwrap();
        assert!(matches!(err, MarktrackError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_malformed_line_is_stream_read_failure() {
        let path = write_stream(
            "malformed.jsonl",
            "# {\"schema_version\":\"1.0\",\"fps\":30.0}\n{\"markers\":[]}\nnot json\n",
        );
        let mut source = ReplaySource::open(&path).unwrap();
        assert!(source.read_frame().unwrap().is_some());
        let err = source.read_frame().unwrap_err();
        assert!(err.ends_stream());
        assert!(err.to_string().contains("line 3"));
    }
}
