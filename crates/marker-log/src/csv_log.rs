//! Streaming CSV tracking log.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use marktrack_analysis::tracker::LogRow;
use marktrack_common::error::MarktrackResult;
use marktrack_model::sample::LengthUnit;
use marktrack_model::series::{DisplacementSummary, MarkerPair};

/// File name prefix for tracking logs.
pub const LOG_FILE_PREFIX: &str = "marker_tracking";

/// Log location for a run: `<dir>/marker_tracking_<stamp>.csv`, where `dir`
/// is `output_dir` or the video's own directory.
pub fn log_path_for(video: &Path, output_dir: Option<&Path>, stamp: &str) -> PathBuf {
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| video.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{LOG_FILE_PREFIX}_{stamp}.csv"))
}

/// Header row for the given position unit.
pub fn header_line(unit: LengthUnit) -> String {
    format!(
        "Time (s),ID,X ({unit}),Y ({unit}),Rotation (°),Vertical displacement (mm)",
        unit = unit.label()
    )
}

/// Format one data row.
pub fn format_row(row: &LogRow) -> String {
    let displacement = row
        .displacement
        .map(|d| format!("{d:.2}"))
        .unwrap_or_default();
    format!(
        "{:.4},{},{:.2},{:.2},{:.2},{}",
        row.timestamp.seconds,
        row.sample.marker_id,
        row.sample.position.x,
        row.sample.position.y,
        row.sample.rotation_degrees,
        displacement
    )
}

/// Lines of the trailing summary block (without the separating blank line).
pub fn summary_lines(
    summary: &DisplacementSummary,
    pair: MarkerPair,
    unit: LengthUnit,
) -> Vec<String> {
    let unit = unit.label();
    vec![
        format!(
            "# Vertical displacement summary between ID {} and ID {}",
            pair.reference, pair.target
        ),
        format!("Initial time (s),{:.4}", summary.first_time_secs),
        format!("Initial displacement ({unit}),{:.2}", summary.first_separation),
        format!("Final time (s),{:.4}", summary.last_time_secs),
        format!("Final displacement ({unit}),{:.2}", summary.last_separation),
        format!("Net displacement ({unit}),{:.2}", summary.net),
    ]
}

/// Per-run CSV log.
#[derive(Debug)]
pub struct MarkerLog {
    path: PathBuf,
    unit: LengthUnit,
    rows_written: u64,
}

impl MarkerLog {
    /// Create (or truncate) the log and write the header row.
    pub fn create(path: PathBuf, unit: LengthUnit) -> MarktrackResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        writeln!(file, "{}", header_line(unit))?;

        tracing::info!(path = %path.display(), %unit, "Tracking log created");
        Ok(Self {
            path,
            unit,
            rows_written: 0,
        })
    }

    /// Append the rows of one frame. A frame without markers writes nothing.
    pub fn append_rows(&mut self, rows: &[LogRow]) -> MarktrackResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.append_lines(rows.iter().map(format_row))?;
        self.rows_written += rows.len() as u64;
        Ok(())
    }

    /// Append the summary block after a blank separator line.
    pub fn append_summary(
        &self,
        summary: &DisplacementSummary,
        pair: MarkerPair,
    ) -> MarktrackResult<()> {
        let lines = std::iter::once(String::new()).chain(summary_lines(summary, pair, self.unit));
        self.append_lines(lines)?;
        tracing::debug!(path = %self.path.display(), "Summary block appended");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn append_lines(&self, lines: impl IntoIterator<Item = String>) -> MarktrackResult<()> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        for line in lines {
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;
        Ok(())
    }
}
