//! Segment derivation from split points.
//!
//! Split points are bookended with `0` and the total frame count; each
//! consecutive pair becomes one half-open segment `[start, end)`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A contiguous frame range of the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of the segment in the output, starting at 0
    pub index: usize,
    /// First frame (inclusive)
    pub start_frame: u64,
    /// End frame (exclusive)
    pub end_frame: u64,
    pub start_time: f64,
    pub end_time: f64,
    pub frame_count: u64,
    /// Written file, filled in by materialization
    pub output_path: Option<PathBuf>,
}

/// Returns `[0, s1, ..., sn, total_frames]`.
///
/// Points outside `(0, total_frames)` and duplicates are dropped so the
/// boundaries are always strictly increasing. With zero frames the result is
/// empty.
pub fn bookend(split_points: &[u64], total_frames: u64) -> Vec<u64> {
    if total_frames == 0 {
        return Vec::new();
    }
    let mut boundaries = Vec::with_capacity(split_points.len() + 2);
    boundaries.push(0);
    for &point in split_points {
        if point > 0 && point < total_frames && boundaries.last().is_some_and(|last| point > *last) {
            boundaries.push(point);
        }
    }
    boundaries.push(total_frames);
    boundaries
}

/// Builds the ordered segment list covering `[0, total_frames)`.
pub fn derive_segments(split_points: &[u64], total_frames: u64, fps: f64) -> Vec<Segment> {
    let to_seconds = |frame: u64| {
        if fps > 0.0 {
            frame as f64 / fps
        } else {
            0.0
        }
    };

    bookend(split_points, total_frames)
        .windows(2)
        .enumerate()
        .map(|(index, pair)| Segment {
            index,
            start_frame: pair[0],
            end_frame: pair[1],
            start_time: to_seconds(pair[0]),
            end_time: to_seconds(pair[1]),
            frame_count: pair[1] - pair[0],
            output_path: None,
        })
        .collect()
}

/// File name of the segment at `index`, e.g. `segment_003.mp4`.
pub fn segment_file_name(index: usize, extension: &str) -> String {
    format!("segment_{index:03}.{extension}")
}
