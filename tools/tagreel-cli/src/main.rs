//! Tagreel CLI: export tagged clips and montages from match video.
//!
//! Usage:
//!   tagreel montage <VIDEO> --tags <FILE>    Record one montage of the selected events
//!   tagreel clips <VIDEO> --tags <FILE>      Record one clip per selected event
//!   tagreel clip-at <VIDEO> --at <SECS>      Record a 4s clip around a moment
//!   tagreel snapshot <VIDEO> --at <SECS>     Save the frame at a moment as PNG
//!   tagreel filter <FILE>                    Preview which events a filter selects
//!   tagreel check                            Check ffmpeg and configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod sink;

use commands::{ExportArgs, FilterArgs};

#[derive(Parser)]
#[command(
    name = "tagreel",
    about = "Clip and montage export for tagged sports video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a montage of every selected event
    Montage {
        /// Source video
        video: PathBuf,

        /// Tag document (JSON)
        #[arg(short, long)]
        tags: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        export: ExportArgs,

        /// TrueType font for title and end cards
        #[arg(long)]
        font: Option<PathBuf>,

        /// Transition between clips: dissolve|overlay
        #[arg(long)]
        transition: Option<String>,
    },

    /// Record one clip per selected event
    Clips {
        /// Source video
        video: PathBuf,

        /// Tag document (JSON)
        #[arg(short, long)]
        tags: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Record a 4 second clip centred on a moment
    ClipAt {
        /// Source video
        video: PathBuf,

        /// Centre of the clip in seconds
        #[arg(long)]
        at: f64,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Save the frame at a moment as PNG
    Snapshot {
        /// Source video
        video: PathBuf,

        /// Time in seconds
        #[arg(long)]
        at: f64,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dataset name used as the output folder
        #[arg(long)]
        dataset: Option<String>,
    },

    /// Preview which events a filter selects
    Filter {
        /// Tag document (JSON)
        tags: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Video duration in seconds, used to clamp clip windows
        #[arg(long)]
        duration: Option<f64>,

        /// Print the preview as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check ffmpeg availability and configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = tagreel_common::config::AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    tagreel_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Montage {
            video,
            tags,
            filter,
            export,
            font,
            transition,
        } => commands::montage::run(config, video, tags, filter, export, font, transition).await,
        Commands::Clips {
            video,
            tags,
            filter,
            export,
        } => commands::clips::run(config, video, tags, filter, export).await,
        Commands::ClipAt { video, at, export } => {
            commands::clips::run_at(config, video, at, export).await
        }
        Commands::Snapshot {
            video,
            at,
            output,
            dataset,
        } => commands::snapshot::run(config, video, at, output, dataset).await,
        Commands::Filter {
            tags,
            filter,
            duration,
            json,
        } => commands::filter::run(tags, filter, duration, json),
        Commands::Check => commands::check::run(config).await,
    }
}
