//! Track markers in a video file.

use std::path::PathBuf;

use marktrack_common::config::AppConfig;

use super::RunArgs;

#[cfg(feature = "opencv")]
pub async fn run(
    video: PathBuf,
    args: RunArgs,
    dump_detections: Option<PathBuf>,
    app: &AppConfig,
) -> anyhow::Result<()> {
    use marktrack_engine::backend::{ArucoMarkerDetector, VideoFileSource};
    use marktrack_engine::AnalysisSession;

    let mut config = args.resolve(video.clone(), app)?;
    config.dump_detections = dump_detections;

    let source = VideoFileSource::open(&video)?;
    let detector = ArucoMarkerDetector::new(config.dictionary)?;

    if !args.json {
        println!("Analyzing: {}", video.display());
        println!("  Dictionary: {}", config.dictionary);
        println!("  Units: {}", config.unit());
        println!("Press Ctrl+C to stop early...");
        println!();
    }

    super::run_session(AnalysisSession::new(config, source, detector), args.json).await
}

#[cfg(not(feature = "opencv"))]
pub async fn run(
    video: PathBuf,
    _args: RunArgs,
    _dump_detections: Option<PathBuf>,
    _app: &AppConfig,
) -> anyhow::Result<()> {
    use marktrack_common::error::MarktrackError;

    Err(MarktrackError::unsupported(format!(
        "cannot decode {}: this build has no video backend; rebuild with `--features opencv` \
         or analyze a detection stream with `marktrack replay`",
        video.display()
    ))
    .into())
}
