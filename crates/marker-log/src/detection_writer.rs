//! Append-only detection stream writer for later replay.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use marktrack_common::error::{MarktrackError, MarktrackResult};
use marktrack_model::detection::{DetectionFrame, DetectionStreamHeader};
use marktrack_model::sample::MarkerDetection;

/// Writes detector output to a JSONL file, one line per frame.
pub struct DetectionWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    frames_written: u64,
}

impl DetectionWriter {
    /// Create a new writer, writing the header as the first line.
    pub fn new(path: PathBuf, header: &DetectionStreamHeader) -> MarktrackResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", header.to_line()?).map_err(|e| {
            MarktrackError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write detection header: {e}"),
            ))
        })?;

        Ok(Self {
            writer,
            path,
            frames_written: 0,
        })
    }

    /// Write the detections of one frame. Empty frames are written too so
    /// replay preserves frame timing.
    pub fn write_frame(&mut self, markers: &[MarkerDetection]) -> MarktrackResult<()> {
        let frame = DetectionFrame::new(markers.to_vec());
        let json = serde_json::to_string(&frame)?;
        writeln!(self.writer, "{json}")?;
        self.frames_written += 1;

        // Flush every 300 frames for crash safety
        if self.frames_written % 300 == 0 {
            self.flush()?;
        }

        Ok(())
    }

    /// Flush buffered writes to disk.
    pub fn flush(&mut self) -> MarktrackResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Drop for DetectionWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marktrack_model::detection::parse_detection_frames;

    #[test]
    fn test_detection_writer_keeps_empty_frames() {
        let dir = std::env::temp_dir().join("marktrack_test_detection_writer");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("detections.jsonl");

        {
            let mut writer =
                DetectionWriter::new(path.clone(), &DetectionStreamHeader::new(24.0)).unwrap();
            writer
                .write_frame(&[MarkerDetection::square(0, 10.0, 10.0, 2.0)])
                .unwrap();
            writer.write_frame(&[]).unwrap();
            writer
                .write_frame(&[
                    MarkerDetection::square(0, 10.0, 11.0, 2.0),
                    MarkerDetection::square(1, 10.0, 40.0, 2.0),
                ])
                .unwrap();
            assert_eq!(writer.frames_written(), 3);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let first = content.lines().next().unwrap();
        let header = DetectionStreamHeader::parse_line(first).unwrap().unwrap();
        assert_eq!(header.fps, 24.0);

        let frames = parse_detection_frames(&content).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[1].markers.is_empty());
        assert_eq!(frames[2].markers[1].id, 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
