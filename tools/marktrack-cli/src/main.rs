//! marktrack CLI: calibrate, analyze, and replay marker tracking runs.
//!
//! Usage:
//!   marktrack analyze <VIDEO>         Track markers in a video (opencv builds)
//!   marktrack replay <DETECTIONS>     Analyze a recorded detection stream
//!   marktrack calibrate               Compute a pixels-per-millimeter scale
//!   marktrack dictionaries            List supported marker dictionaries
//!   marktrack config                  Show the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use marktrack_common::config::AppConfig;

mod commands;

use commands::RunArgs;

#[derive(Parser)]
#[command(
    name = "marktrack",
    about = "Fiducial marker tracking and vertical displacement measurement",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the standard location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track markers in a video file
    Analyze {
        /// Path to the video file
        video: PathBuf,

        #[command(flatten)]
        run: RunArgs,

        /// Also write raw detections to this JSONL file for later replay
        #[arg(long)]
        dump_detections: Option<PathBuf>,
    },

    /// Analyze a recorded detection stream
    Replay {
        /// Path to the detection stream (JSONL)
        detections: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Compute a scale factor from two points and their real distance
    Calibrate {
        /// First point as X,Y (prompted when omitted)
        #[arg(long)]
        p1: Option<String>,

        /// Second point as X,Y (prompted when omitted)
        #[arg(long)]
        p2: Option<String>,

        /// Real distance between the points in millimeters (prompted when omitted)
        #[arg(long)]
        distance: Option<String>,

        /// Ratio of the preview the points were picked on to the source size
        #[arg(long, default_value = "1.0")]
        display_scale: f64,
    },

    /// List supported marker dictionaries
    Dictionaries,

    /// Show the effective configuration
    Config {
        /// Write the default configuration if no config file exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(marktrack_common::config::config_file_path);
    let app_config = AppConfig::load_from(&config_path);

    let mut logging = app_config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    marktrack_common::logging::init_logging(&logging);
    tracing::debug!(path = %config_path.display(), exists = config_path.exists(), "Configuration");

    match cli.command {
        Commands::Analyze {
            video,
            run,
            dump_detections,
        } => commands::analyze::run(video, run, dump_detections, &app_config).await,
        Commands::Replay { detections, run } => {
            commands::replay::run(detections, run, &app_config).await
        }
        Commands::Calibrate {
            p1,
            p2,
            distance,
            display_scale,
        } => commands::calibrate::run(p1, p2, distance, display_scale),
        Commands::Dictionaries => commands::dictionaries::run(&app_config),
        Commands::Config { init } => commands::config::run(&app_config, &config_path, init),
    }
}
