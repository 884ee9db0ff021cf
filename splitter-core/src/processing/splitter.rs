//! Splitting orchestration.
//!
//! [`VideoSplitter`] ties the pieces together: it validates the
//! configuration, runs the detection pass, derives segments and, on request,
//! materializes them. The embedding model is borrowed from the caller.

use std::path::PathBuf;

use log::{info, warn};

use super::materialize::SegmentMaterializer;
use super::segments::derive_segments;
use crate::config::SplitterConfig;
use crate::detection::SceneDetector;
use crate::error::CoreResult;
use crate::external::{FrameSource, SidecarBackend, VideoBackend};
use crate::progress_reporting;
use crate::reporting::AnalysisResult;
use crate::similarity::FrameEmbedder;
use crate::temp_files::prepare_output_dir;
use crate::utils::format_duration;

/// Splits one video into scene segments.
///
/// # Examples
///
/// ```rust,no_run
/// use splitter_core::{ModelConfig, OnnxEmbedder, SplitterConfigBuilder, VideoSplitter};
///
/// # fn main() -> splitter_core::CoreResult<()> {
/// let config = SplitterConfigBuilder::new()
///     .video_path("/videos/input.mp4")
///     .output_dir("/videos/segments")
///     .model_path("/models/dinov2.onnx")
///     .build()?;
/// let embedder = OnnxEmbedder::load(&config.model)?;
/// let splitter = VideoSplitter::new(config, &embedder)?;
/// let result = splitter.process()?;
/// println!("{} segments", result.segment_count());
/// # Ok(())
/// # }
/// ```
pub struct VideoSplitter<'e, E: ?Sized, B = SidecarBackend> {
    config: SplitterConfig,
    embedder: &'e E,
    backend: B,
}

impl<'e, E: FrameEmbedder + ?Sized> VideoSplitter<'e, E, SidecarBackend> {
    /// Splitter decoding and encoding through ffmpeg.
    pub fn new(config: SplitterConfig, embedder: &'e E) -> CoreResult<Self> {
        Self::with_backend(config, embedder, SidecarBackend::new())
    }
}

impl<'e, E: FrameEmbedder + ?Sized, B: VideoBackend> VideoSplitter<'e, E, B> {
    /// Validates `config` before anything is read or written.
    pub fn with_backend(config: SplitterConfig, embedder: &'e E, backend: B) -> CoreResult<Self> {
        config.validate()?;
        if config.min_segment_frames > 0 {
            info!(
                "Minimum segment length of {} frames is recorded but not applied",
                config.min_segment_frames
            );
            progress_reporting::info(&format!(
                "Minimum segment length {} is recorded only; segments are not merged",
                config.min_segment_frames
            ));
        }
        Ok(Self {
            config,
            embedder,
            backend,
        })
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs detection and returns the segments without writing anything.
    pub fn analyze(&self) -> CoreResult<AnalysisResult> {
        self.backend.check_available()?;
        let video_path = &self.config.video_path;

        progress_reporting::section("Analysis");
        let mut source = self.backend.open_source(video_path, 0)?;
        let metadata = source.metadata().clone();

        progress_reporting::status("Input", &video_path.display().to_string(), false);
        progress_reporting::status(
            "Resolution",
            &format!("{}x{}", metadata.width, metadata.height),
            false,
        );
        progress_reporting::status(
            "Frames",
            &format!("{} at {:.3} fps", metadata.total_frames, metadata.fps),
            false,
        );
        progress_reporting::status("Duration", &format_duration(metadata.duration), false);

        let detector = SceneDetector::from_config(&self.config, self.embedder);
        let outcome = detector.detect(&mut source)?;
        drop(source);
        progress_reporting::clear_progress();

        let frames_read = outcome.stats.frames_read;
        let (total_frames, duration) = if frames_read == metadata.total_frames {
            (metadata.total_frames, metadata.duration)
        } else {
            if frames_read > 0 {
                warn!(
                    "Container reports {} frames but {} were decoded; using decoded count",
                    metadata.total_frames, frames_read
                );
                progress_reporting::warning(&format!(
                    "Decoded {} of {} reported frames",
                    frames_read, metadata.total_frames
                ));
            }
            let duration = if metadata.fps > 0.0 {
                frames_read as f64 / metadata.fps
            } else {
                0.0
            };
            (frames_read, duration)
        };

        let segments = derive_segments(&outcome.split_points, total_frames, metadata.fps);
        progress_reporting::success(&format!(
            "Found {} scene changes, {} segments",
            outcome.split_points.len(),
            segments.len()
        ));

        Ok(AnalysisResult {
            video_path: video_path.clone(),
            output_dir: self.config.output_dir.clone(),
            total_frames,
            fps: metadata.fps,
            frame_rate: metadata.frame_rate,
            duration,
            width: metadata.width,
            height: metadata.height,
            split_points: outcome.split_points,
            segments,
            min_segment_frames: self.config.min_segment_frames,
            stats: outcome.stats,
        })
    }

    /// Writes the segments of `result`, creating the output directory first.
    /// Fills `output_dir` and every segment's `output_path`.
    pub fn materialize(&self, result: &mut AnalysisResult) -> CoreResult<Vec<PathBuf>> {
        let output_dir = prepare_output_dir(result.output_dir.as_deref())?;
        result.output_dir = Some(output_dir.clone());

        progress_reporting::section("Segments");
        progress_reporting::status("Output", &output_dir.display().to_string(), false);

        let metadata = result.metadata();
        let materializer = SegmentMaterializer::new(
            &self.backend,
            output_dir,
            self.config.output_codec.as_str(),
            self.config.output_extension.as_str(),
        );
        let paths = materializer.materialize(&result.video_path, &metadata, &mut result.segments)?;

        progress_reporting::success(&format!("Wrote {} segments", paths.len()));
        Ok(paths)
    }

    /// Analysis followed by materialization.
    pub fn process(&self) -> CoreResult<AnalysisResult> {
        let mut result = self.analyze()?;
        self.materialize(&mut result)?;
        Ok(result)
    }
}
