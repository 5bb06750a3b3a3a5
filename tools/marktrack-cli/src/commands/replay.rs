//! Analyze a recorded detection stream.

use std::path::PathBuf;

use marktrack_common::config::AppConfig;
use marktrack_engine::{AnalysisSession, PassthroughDetector, ReplaySource};

use super::RunArgs;

pub async fn run(detections: PathBuf, args: RunArgs, app: &AppConfig) -> anyhow::Result<()> {
    let source = ReplaySource::open(&detections)?;
    let mut config = args.resolve(detections.clone(), app)?;

    // The stream records which dictionary produced it.
    if let Some(recorded) = source.header().dictionary {
        if args.dictionary.is_none() {
            config.dictionary = recorded;
        } else if recorded != config.dictionary {
            tracing::warn!(
                recorded = %recorded,
                requested = %config.dictionary,
                "Detection stream was recorded with a different dictionary"
            );
        }
    }

    if !args.json {
        println!("Replaying: {}", detections.display());
        println!("  Frame rate: {} fps", source.header().fps);
        println!("  Units: {}", config.unit());
        println!();
    }

    super::run_session(
        AnalysisSession::new(config, source, PassthroughDetector),
        args.json,
    )
    .await
}
