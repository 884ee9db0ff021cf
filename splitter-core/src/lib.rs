//! Core library for splitting videos into scenes using ffmpeg, ffprobe and
//! an ONNX vision model.
//!
//! Detection is two-staged: a DCT perceptual hash flags frame pairs that
//! might be a scene change, and an embedding model confirms or vetoes each
//! candidate. Confirmed cut points are turned into contiguous segments which
//! can be written to individual files.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use splitter_core::{OnnxEmbedder, SplitterConfigBuilder, VideoSplitter};
//!
//! let config = SplitterConfigBuilder::new()
//!     .video_path("/path/to/input.mp4")
//!     .output_dir("/path/to/segments")
//!     .similarity_threshold(0.8)
//!     .model_path("/path/to/dinov2.onnx")
//!     .build()
//!     .unwrap();
//!
//! let embedder = OnnxEmbedder::load(&config.model).unwrap();
//! let splitter = VideoSplitter::new(config, &embedder).unwrap();
//! let result = splitter.process().unwrap();
//!
//! for line in result.summary_lines() {
//!     println!("{line}");
//! }
//! ```

pub mod config;
pub mod detection;
pub mod error;
pub mod external;
pub mod media;
pub mod processing;
pub mod progress_reporting;
pub mod reporting;
pub mod similarity;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use config::{ModelConfig, SplitterConfig, SplitterConfigBuilder};
pub use detection::{DetectionOutcome, DetectionStats, SceneDetector};
pub use error::{CoreError, CoreResult};
pub use external::{
    FrameSink, FrameSource, MemoryBackend, MemoryVideo, SidecarBackend, VideoBackend,
};
pub use media::{ChannelOrder, Frame, ImageInput, VideoMetadata, probe_video};
pub use processing::{Segment, SegmentMaterializer, VideoSplitter, derive_segments};
pub use progress_reporting::ProgressCallback;
pub use reporting::AnalysisResult;
pub use similarity::{
    ConfirmationEstimator, Embedding, Fingerprint, FrameEmbedder, OnnxEmbedder,
    PerceptualHasher, embedding_similarity, phash_similarity,
};
pub use temp_files::prepare_output_dir;
pub use utils::{format_duration, format_timestamp};
