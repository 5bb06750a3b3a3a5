//! Compute a scale factor from two points.

use std::io::{BufRead, Write};

use marktrack_analysis::calibration::{parse_distance_mm, CalibrationCapture};
use marktrack_common::error::{MarktrackError, MarktrackResult};
use marktrack_model::geometry::Point2;

pub fn run(
    p1: Option<String>,
    p2: Option<String>,
    distance: Option<String>,
    display_scale: f64,
) -> anyhow::Result<()> {
    let mut capture = CalibrationCapture::with_display_scale(display_scale)?;

    for (label, given) in [("first", p1), ("second", p2)] {
        let text = match given {
            Some(text) => Some(text),
            None => prompt(&format!("Click the {label} point (X,Y): "))?,
        };
        // An empty answer cancels the capture; finish() reports it.
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            break;
        };
        capture.push_point(parse_point(&text)?);
    }

    if let Some(pixels) = capture.pixel_distance() {
        println!("Pixel distance: {pixels:.2} px");
    }

    let distance = match distance {
        Some(text) => parse_distance(&text),
        None if capture.is_complete() => prompt_distance(),
        None => Ok(None),
    };

    let scale = distance.and_then(|d| capture.finish(d))?;
    tracing::info!(px_per_mm = scale.px_per_mm(), "Calibration complete");
    println!("Scale factor: {:.4} px/mm", scale.px_per_mm());
    println!("Use it with: marktrack replay <DETECTIONS> --scale {}", scale.px_per_mm());
    Ok(())
}

/// Parse a point written as `X,Y` (spaces allowed).
pub fn parse_point(text: &str) -> MarktrackResult<Point2> {
    let invalid = || MarktrackError::invalid_calibration(format!("expected X,Y, got {text:?}"));
    let (x, y) = text.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<f64>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok(Point2::new(x, y))
}

pub fn parse_distance(text: &str) -> MarktrackResult<Option<f64>> {
    parse_distance_mm(text)
}

/// Ask for the real distance on stdin. An empty answer or closed input
/// counts as cancelled.
pub fn prompt_distance() -> MarktrackResult<Option<f64>> {
    match prompt("Real distance between the points (mm): ")? {
        Some(answer) => parse_distance_mm(&answer),
        None => Ok(None),
    }
}

fn prompt(message: &str) -> MarktrackResult<Option<String>> {
    eprint!("{message}");
    std::io::stderr().flush()?;
    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    Ok((read > 0).then(|| line.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("12.5, 40").unwrap(), Point2::new(12.5, 40.0));
        assert!(parse_point("12.5").is_err());
        assert!(parse_point("a,b").is_err());
    }

    #[test]
    fn test_parse_distance_accepts_decimal_comma() {
        assert_eq!(parse_distance("12,5").unwrap(), Some(12.5));
        assert_eq!(parse_distance("  ").unwrap(), None);
    }
}
