// splitter-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use splitter_core::config::{
    DEFAULT_CLI_SIMILARITY_THRESHOLD, DEFAULT_CONFIRMATION_THRESHOLD, DEFAULT_EMBEDDING_DIM,
    DEFAULT_MIN_SEGMENT_FRAMES,
};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Video splitter: scene-cut detection and segmentation",
    long_about = "Splits a video into scene segments using a perceptual-hash filter confirmed by an ONNX embedding model."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug) logging on the console
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Optional: Directory for a log file of the run
    #[arg(long, global = true, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detects scene changes in a video and writes one file per scene
    Split(SplitArgs),
}

#[derive(Parser, Debug)]
pub struct SplitArgs {
    /// Video file to split
    #[arg(required = true, value_name = "VIDEO_PATH")]
    pub video_path: PathBuf,

    /// Directory for segment files (defaults to a new timestamped temp directory)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Perceptual-hash similarity below which a frame pair is a cut candidate (0-1)
    #[arg(
        short = 't',
        long = "threshold",
        value_name = "F",
        default_value_t = DEFAULT_CLI_SIMILARITY_THRESHOLD,
        allow_negative_numbers = true
    )]
    pub threshold: f64,

    /// Minimum segment length in frames (recorded, not enforced)
    #[arg(
        short = 'm',
        long = "min-frames",
        value_name = "N",
        default_value_t = DEFAULT_MIN_SEGMENT_FRAMES,
        allow_negative_numbers = true
    )]
    pub min_frames: i64,

    /// ONNX embedding model used to confirm cuts.
    /// Can also be set via the VIDEO_SPLITTER_MODEL environment variable.
    #[arg(long, value_name = "PATH", env = "VIDEO_SPLITTER_MODEL")]
    pub model: Option<PathBuf>,

    /// Width of the model's output embedding (1024 for DINOv2-large, 768 for DINOv2-base)
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_EMBEDDING_DIM,
        env = "VIDEO_SPLITTER_EMBEDDING_DIM"
    )]
    pub embedding_dim: usize,

    /// Embedding cosine similarity at or above which a candidate is rejected (-1 to 1)
    #[arg(
        long,
        value_name = "F",
        default_value_t = DEFAULT_CONFIRMATION_THRESHOLD,
        allow_negative_numbers = true
    )]
    pub confirm_threshold: f32,

    /// Only detect cuts; do not write segment files
    #[arg(long, default_value_t = false)]
    pub analyze_only: bool,

    /// Print the analysis result as JSON on stdout
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
