// ============================================================================
// splitter-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for SplitterConfig
//
// This module implements the builder pattern for the SplitterConfig
// structure, providing a fluent API with the library defaults pre-filled.
// `build()` validates the result, so a builder never hands out a
// configuration that would fail later.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{ModelConfig, SplitterConfig};
use crate::error::{CoreError, CoreResult};
use crate::progress_reporting::ProgressCallback;

/// Builder for creating SplitterConfig instances.
///
/// # Examples
///
/// ```rust,no_run
/// use splitter_core::config::SplitterConfigBuilder;
///
/// let config = SplitterConfigBuilder::new()
///     .video_path("/videos/input.mp4")
///     .similarity_threshold(0.8)
///     .min_segment_frames(0)
///     .model_path("/models/dinov2.onnx")
///     .on_progress(|done, total| println!("{done}/{total}"))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct SplitterConfigBuilder {
    video_path: Option<PathBuf>,
    config: SplitterConfig,
}

impl SplitterConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the video to analyze (required).
    pub fn video_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.video_path = Some(path.into());
        self
    }

    /// Sets the directory that receives the segment files.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    /// Sets the fast-stage similarity threshold (0-1).
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Sets the embedding confirmation threshold (-1 to 1).
    pub fn confirmation_threshold(mut self, threshold: f32) -> Self {
        self.config.confirmation_threshold = threshold;
        self
    }

    /// Sets the minimum segment length in frames.
    ///
    /// The value is validated and reported but not used to merge segments.
    pub fn min_segment_frames(mut self, frames: i64) -> Self {
        self.config.min_segment_frames = frames;
        self
    }

    /// Sets how many frames pass between progress callback invocations.
    pub fn progress_interval(mut self, frames: u64) -> Self {
        self.config.progress_interval = frames;
        self
    }

    /// Sets the ffmpeg encoder used for segment files.
    pub fn output_codec(mut self, codec: &str) -> Self {
        self.config.output_codec = codec.to_string();
        self
    }

    /// Sets the container extension for segment files.
    pub fn output_extension(mut self, extension: &str) -> Self {
        self.config.output_extension = extension.to_string();
        self
    }

    /// Sets the path of the ONNX embedding model, keeping the other model
    /// settings.
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.model.model_path = path.into();
        self
    }

    /// Sets the embedding width the model must produce.
    pub fn embedding_dim(mut self, dim: usize) -> Self {
        self.config.model.embedding_dim = dim;
        self
    }

    /// Replaces the whole model configuration.
    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    /// Registers a progress observer called with `(frames_processed, total_frames)`.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(u64, u64) + Send + Sync + 'static,
    {
        self.config.progress_callback = Some(ProgressCallback::new(callback));
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// * `CoreError::NotFound` if no video path was set or the file is missing
    /// * `CoreError::Validation` if any numeric setting is out of range
    pub fn build(self) -> CoreResult<SplitterConfig> {
        let video_path = self
            .video_path
            .ok_or_else(|| CoreError::NotFound("no video path given".to_string()))?;

        let config = SplitterConfig {
            video_path,
            ..self.config
        };
        config.validate()?;
        Ok(config)
    }
}
