//! Configuration structures and constants for the splitter-core library.
//!
//! This module provides the validated configuration for one splitting run:
//! the input and output locations, the two detection thresholds, the
//! embedding model settings and the segment output format.

mod builder;

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::progress_reporting::ProgressCallback;

pub use builder::SplitterConfigBuilder;

// Default constants

/// Library default for the fast perceptual-hash stage.
/// Frame pairs scoring below this value become cut candidates.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.70;

/// Default used by the command-line front end for the fast stage.
pub const DEFAULT_CLI_SIMILARITY_THRESHOLD: f64 = 0.80;

/// Cosine similarity at or above which the embedding stage calls two
/// frames "similar" and suppresses the candidate cut.
pub const DEFAULT_CONFIRMATION_THRESHOLD: f32 = 0.92;

/// Minimum segment length in frames. Accepted and validated, not enforced.
pub const DEFAULT_MIN_SEGMENT_FRAMES: i64 = 0;

/// Number of frames between two progress callback invocations.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Video encoder used for segment files (ffmpeg's MPEG-4 part 2, the
/// equivalent of the `mp4v` fourcc).
pub const DEFAULT_OUTPUT_CODEC: &str = "mpeg4";

/// Container extension for segment files.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "mp4";

/// Square input resolution expected by the embedding model.
pub const DEFAULT_MODEL_INPUT_SIZE: u32 = 224;

/// Shortest edge after the first resize, before center cropping.
pub const DEFAULT_MODEL_RESIZE_EDGE: u32 = 256;

/// Length of the embedding vector produced by the model.
pub const DEFAULT_EMBEDDING_DIM: usize = 1024;

/// ImageNet channel means used for input normalization.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations used for input normalization.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Settings for the ONNX embedding model used by the confirmation stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Path to the exported ONNX model (vision transformer with a
    /// `last_hidden_state` output, or a pooled `[1, D]` output)
    pub model_path: PathBuf,

    /// Side of the square center crop fed to the model
    pub input_size: u32,

    /// Shortest edge of the image after resizing, before cropping
    pub resize_shortest_edge: u32,

    /// Expected embedding length; inference output is checked against it
    pub embedding_dim: usize,

    /// Per-channel normalization mean (RGB)
    pub mean: [f32; 3],

    /// Per-channel normalization standard deviation (RGB)
    pub std: [f32; 3],
}

impl ModelConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.input_size == 0 {
            return Err(CoreError::Validation(
                "model input size must be greater than zero".to_string(),
            ));
        }
        if self.resize_shortest_edge < self.input_size {
            return Err(CoreError::Validation(format!(
                "model resize edge ({}) must not be smaller than the crop size ({})",
                self.resize_shortest_edge, self.input_size
            )));
        }
        if self.embedding_dim == 0 {
            return Err(CoreError::Validation(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        if self.std.iter().any(|s| *s <= 0.0) {
            return Err(CoreError::Validation(
                "normalization standard deviations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            input_size: DEFAULT_MODEL_INPUT_SIZE,
            resize_shortest_edge: DEFAULT_MODEL_RESIZE_EDGE,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }
}

/// Main configuration structure for one splitting run.
///
/// Built with [`SplitterConfigBuilder`] or by filling the public fields
/// directly; either way [`SplitterConfig::validate`] must pass before the
/// configuration is handed to [`crate::VideoSplitter`], which calls it for
/// you.
///
/// # Examples
///
/// ```rust,no_run
/// use splitter_core::config::SplitterConfigBuilder;
///
/// let config = SplitterConfigBuilder::new()
///     .video_path("/videos/input.mp4")
///     .output_dir("/videos/segments")
///     .similarity_threshold(0.8)
///     .model_path("/models/dinov2.onnx")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Video file to analyze
    pub video_path: PathBuf,

    /// Directory for segment files (a timestamped temporary directory is
    /// created when `None`)
    pub output_dir: Option<PathBuf>,

    /// Fast-stage threshold in [0, 1]
    pub similarity_threshold: f64,

    /// Confirmation-stage cosine threshold in [-1, 1]
    pub confirmation_threshold: f32,

    /// Minimum segment length in frames; must be >= 0, currently not enforced
    pub min_segment_frames: i64,

    /// Frames between progress callback invocations (>= 1)
    pub progress_interval: u64,

    /// ffmpeg encoder name for segment files
    pub output_codec: String,

    /// File extension (container) for segment files
    pub output_extension: String,

    /// Embedding model settings
    pub model: ModelConfig,

    /// Optional observer for `(frames_processed, total_frames)`
    pub progress_callback: Option<ProgressCallback>,
}

impl SplitterConfig {
    /// Creates a configuration with default settings for the given video.
    pub fn new(video_path: impl Into<PathBuf>) -> Self {
        Self {
            video_path: video_path.into(),
            ..Self::default()
        }
    }

    /// Checks every field. Called before any frame is read or any model is
    /// loaded, so a bad configuration never costs decoding time.
    pub fn validate(&self) -> CoreResult<()> {
        validate_video_path(&self.video_path)?;

        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(CoreError::Validation(format!(
                "similarity threshold must be between 0 and 1, got {}",
                self.similarity_threshold
            )));
        }

        if !(-1.0..=1.0).contains(&self.confirmation_threshold) {
            return Err(CoreError::Validation(format!(
                "confirmation threshold must be between -1 and 1, got {}",
                self.confirmation_threshold
            )));
        }

        if self.min_segment_frames < 0 {
            return Err(CoreError::Validation(format!(
                "minimum segment frames must be >= 0, got {}",
                self.min_segment_frames
            )));
        }

        if self.progress_interval == 0 {
            return Err(CoreError::Validation(
                "progress interval must be at least 1 frame".to_string(),
            ));
        }

        if self.output_codec.trim().is_empty() {
            return Err(CoreError::Validation("output codec must not be empty".to_string()));
        }

        if self.output_extension.trim().is_empty() || self.output_extension.contains('.') {
            return Err(CoreError::Validation(format!(
                "output extension must be a bare extension like 'mp4', got '{}'",
                self.output_extension
            )));
        }

        self.model.validate()
    }
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            video_path: PathBuf::new(),
            output_dir: None,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            confirmation_threshold: DEFAULT_CONFIRMATION_THRESHOLD,
            min_segment_frames: DEFAULT_MIN_SEGMENT_FRAMES,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            output_codec: DEFAULT_OUTPUT_CODEC.to_string(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            model: ModelConfig::default(),
            progress_callback: None,
        }
    }
}

fn validate_video_path(path: &Path) -> CoreResult<()> {
    if path.as_os_str().is_empty() {
        return Err(CoreError::NotFound("no video path given".to_string()));
    }
    if !path.is_file() {
        return Err(CoreError::NotFound(format!(
            "video file does not exist or is not a file: {}",
            path.display()
        )));
    }
    Ok(())
}
