pub mod analyze;
pub mod calibrate;
pub mod config;
pub mod dictionaries;
pub mod replay;

use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;

use marktrack_analysis::calibration::{Calibration, ScaleFactor};
use marktrack_common::config::AppConfig;
use marktrack_common::error::MarktrackError;
use marktrack_engine::{AnalysisConfig, AnalysisSession, FrameSource, MarkerDetector, RunReport};
use marktrack_model::dictionary::MarkerDictionary;
use marktrack_model::series::MarkerPair;
use marktrack_report::PlotConfig;

/// Options shared by `analyze` and `replay`. Unset options fall back to the
/// config file.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Marker dictionary (e.g. DICT_4X4_50)
    #[arg(short, long)]
    pub dictionary: Option<String>,

    /// Reference marker ID of the tracked pair
    #[arg(long)]
    pub reference_id: Option<u32>,

    /// Target marker ID of the tracked pair
    #[arg(long)]
    pub target_id: Option<u32>,

    /// Known scale in pixels per millimeter
    #[arg(long)]
    pub scale: Option<f64>,

    /// Calibrate from two points given as X1,Y1 X2,Y2
    #[arg(long, num_args = 2, value_names = ["X1,Y1", "X2,Y2"])]
    pub calibrate: Option<Vec<String>>,

    /// Real distance between the calibration points in millimeters
    /// (prompted when omitted)
    #[arg(long, requires = "calibrate")]
    pub distance: Option<String>,

    /// Directory for the CSV log and plot (default: next to the input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Skip the displacement plot
    #[arg(long)]
    pub no_plot: bool,

    /// TrueType font for plot labels (default: bundled DejaVu Sans)
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Merge CLI options over the config file into an analysis config.
    pub fn resolve(&self, source: PathBuf, app: &AppConfig) -> anyhow::Result<AnalysisConfig> {
        let defaults = &app.analysis;

        let dictionary_name = self.dictionary.as_deref().unwrap_or(&defaults.dictionary);
        let dictionary = MarkerDictionary::from_str(dictionary_name)
            .map_err(|e| MarktrackError::config(e.to_string()))?;

        let pair = MarkerPair::new(
            self.reference_id.unwrap_or(defaults.reference_id),
            self.target_id.unwrap_or(defaults.target_id),
        )?;

        let mut config = AnalysisConfig::new(source);
        config.dictionary = dictionary;
        config.pair = pair;
        config.scale = self.resolve_scale()?;
        config.output_dir = self.output_dir.clone().or_else(|| app.output_dir.clone());
        config.plot = (!self.no_plot && defaults.plot).then(|| PlotConfig {
            width: defaults.plot_width,
            height: defaults.plot_height,
            font_path: self.font.clone().or_else(|| defaults.font_path.clone()),
        });
        Ok(config)
    }

    /// `--scale` seeds the calibration; a `--calibrate` attempt replaces it on
    /// success and leaves it in place on failure.
    fn resolve_scale(&self) -> anyhow::Result<Option<ScaleFactor>> {
        let mut calibration = match self.scale {
            Some(px_per_mm) => Calibration::with_scale(ScaleFactor::new(px_per_mm)?),
            None => Calibration::new(),
        };

        if let Some(points) = &self.calibrate {
            let (p1, p2) = match points.as_slice() {
                [a, b] => (calibrate::parse_point(a)?, calibrate::parse_point(b)?),
                _ => anyhow::bail!("--calibrate takes exactly two points"),
            };
            let distance = match &self.distance {
                Some(text) => calibrate::parse_distance(text),
                None => calibrate::prompt_distance(),
            };
            if let Err(e) = distance.and_then(|d| calibration.recalibrate(p1, p2, d)) {
                eprintln!("Calibration failed: {e}");
                eprintln!("Continuing with positions in {}.", calibration.unit());
            }
        }

        Ok(calibration.scale())
    }
}

/// Run a session on a blocking worker; Ctrl-C cancels it at the next frame
/// boundary.
pub async fn run_session<S, D>(session: AnalysisSession<S, D>, json: bool) -> anyhow::Result<()>
where
    S: FrameSource + 'static,
    D: MarkerDetector<S::Frame> + 'static,
{
    let token = session.cancellation_token();
    let mut worker = tokio::task::spawn_blocking(move || session.run());

    let report = tokio::select! {
        joined = &mut worker => joined?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Stopping after the current frame...");
            token.cancel();
            worker.await?
        }
    }?;

    print_report(&report, json)
}

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{}", report.summary_text());
    println!();
    println!(
        "Frames read: {} ({} with markers, {:?})",
        report.frames_read, report.frames_with_markers, report.state
    );
    println!("Log: {}", report.log_path.display());
    if let Some(plot) = &report.plot_path {
        println!("Plot: {}", plot.display());
    }
    if let Some(detections) = &report.detections_path {
        println!("Detections: {}", detections.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        run: RunArgs,
    }

    fn args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["marktrack"];
        full.extend_from_slice(argv);
        TestCli::parse_from(full).run
    }

    #[test]
    fn test_config_defaults_apply() {
        let config = args(&[])
            .resolve(PathBuf::from("/v/clip.mp4"), &AppConfig::default())
            .unwrap();
        assert_eq!(config.dictionary, MarkerDictionary::default());
        assert_eq!(config.pair, MarkerPair::default());
        assert!(config.scale.is_none());
        assert_eq!(config.plot.unwrap().width, 800);
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut app = AppConfig::default();
        app.analysis.plot = true;
        let config = args(&[
            "--dictionary",
            "dict_6x6_250",
            "--reference-id",
            "3",
            "--target-id",
            "8",
            "--scale",
            "4",
            "--no-plot",
        ])
        .resolve(PathBuf::from("clip.mp4"), &app)
        .unwrap();
        assert_eq!(config.dictionary.to_string(), "DICT_6X6_250");
        assert_eq!(config.pair, MarkerPair::new(3, 8).unwrap());
        assert_eq!(config.scale.unwrap().px_per_mm(), 4.0);
        assert!(config.plot.is_none());
    }

    #[test]
    fn test_calibration_points_replace_scale() {
        let config = args(&[
            "--scale",
            "4",
            "--calibrate",
            "0,0",
            "30,40",
            "--distance",
            "10",
        ])
        .resolve(PathBuf::from("clip.mp4"), &AppConfig::default())
        .unwrap();
        assert!((config.scale.unwrap().px_per_mm() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_failed_calibration_keeps_scale() {
        let config = args(&[
            "--scale",
            "4",
            "--calibrate",
            "0,0",
            "30,40",
            "--distance",
            "0",
        ])
        .resolve(PathBuf::from("clip.mp4"), &AppConfig::default())
        .unwrap();
        assert_eq!(config.scale.unwrap().px_per_mm(), 4.0);
    }

    #[test]
    fn test_unknown_dictionary_is_rejected() {
        let err = args(&["--dictionary", "DICT_9X9_50"])
            .resolve(PathBuf::from("clip.mp4"), &AppConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("DICT_9X9_50"));
    }
}
