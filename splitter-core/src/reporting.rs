//! Analysis results.
//!
//! [`AnalysisResult`] is built once per run by the analysis pass and carries
//! everything the materialization pass and the front ends need: source
//! properties, cut points, the derived segments and detection counters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::detection::DetectionStats;
use crate::media::VideoMetadata;
use crate::processing::segments::Segment;
use crate::utils::{format_duration, format_timestamp};

/// Outcome of analyzing one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub video_path: PathBuf,
    /// Segment directory; set once segments have a destination
    pub output_dir: Option<PathBuf>,
    /// Frames covered by the segments
    pub total_frames: u64,
    pub fps: f64,
    /// Frame rate string handed to the encoder
    pub frame_rate: String,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Frames starting a new segment, strictly increasing
    pub split_points: Vec<u64>,
    pub segments: Vec<Segment>,
    /// Carried from the configuration; not applied to the segments
    pub min_segment_frames: i64,
    pub stats: DetectionStats,
}

impl AnalysisResult {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Source properties as used for writing segments.
    pub fn metadata(&self) -> VideoMetadata {
        VideoMetadata {
            width: self.width,
            height: self.height,
            fps: self.fps,
            frame_rate: self.frame_rate.clone(),
            total_frames: self.total_frames,
            duration: self.duration,
        }
    }

    /// Paths of the written segment files, in order.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.segments
            .iter()
            .filter_map(|s| s.output_path.clone())
            .collect()
    }

    /// Human-readable summary, one line per entry.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Video: {}", self.video_path.display()),
            format!(
                "Frames: {} at {:.3} fps ({}), {}x{}",
                self.total_frames,
                self.fps,
                format_duration(self.duration),
                self.width,
                self.height
            ),
            format!(
                "Candidates: {} ({} confirmed, {} suppressed)",
                self.stats.candidates, self.stats.confirmed, self.stats.suppressed
            ),
            format!("Segments: {}", self.segment_count()),
        ];

        for segment in &self.segments {
            let mut line = format!(
                "  [{:03}] frames {}..{} ({} frames, {} - {})",
                segment.index,
                segment.start_frame,
                segment.end_frame,
                segment.frame_count,
                format_timestamp(segment.start_time),
                format_timestamp(segment.end_time)
            );
            if let Some(path) = &segment.output_path {
                line.push_str(&format!(" -> {}", path.display()));
            }
            lines.push(line);
        }

        if let Some(dir) = &self.output_dir {
            lines.push(format!("Output directory: {}", dir.display()));
        }
        lines
    }
}
