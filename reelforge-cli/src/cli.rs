// reelforge-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Reelforge: short-form video scene composer",
    long_about = "Renders a JSON composition request (scenes, narration, subtitles, background music) \
                  into a single video file using ffmpeg via reelforge-core."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Renders every scene and writes the composed video
    Compose(ComposeArgs),

    /// Checks a request and its referenced files without rendering anything
    Validate(RequestArgs),

    /// Prints the ffmpeg command each scene would run (dry run)
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
pub struct RequestArgs {
    /// Composition request JSON file
    #[arg(short = 'r', long = "request", required = true, value_name = "REQUEST_JSON")]
    pub request: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ComposeArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Optional: Override the request's outputPath
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_FILE")]
    pub output: Option<PathBuf>,

    // --- Renderer ---
    /// Optional: ffmpeg binary to run (defaults to `ffmpeg` on PATH)
    #[arg(long, value_name = "FFMPEG_PATH", env = "REELFORGE_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Optional: Base directory for the per-run workspace (defaults to the system temp dir)
    #[arg(long, value_name = "DIR", env = "REELFORGE_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Maximum number of scenes rendered at once
    #[arg(short = 'j', long, value_name = "N", env = "REELFORGE_JOBS", default_value_t = 1)]
    pub jobs: usize,

    /// Optional: Kill any single ffmpeg stage running longer than this many seconds
    #[arg(long, value_name = "SECS", env = "REELFORGE_STAGE_TIMEOUT")]
    pub stage_timeout: Option<u64>,

    /// Render unknown Ken Burns types as a static crop instead of rejecting them
    #[arg(long, default_value_t = false)]
    pub lenient_effects: bool,

    /// Emit progress as one JSON object per line on stdout
    #[arg(long, default_value_t = false)]
    pub json_progress: bool,
}

#[derive(Parser, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Optional: Only print the plan for this sceneId
    #[arg(long, value_name = "SCENE_ID")]
    pub scene: Option<String>,

    /// Plan unknown Ken Burns types as a static crop instead of rejecting them
    #[arg(long, default_value_t = false)]
    pub lenient_effects: bool,
}
