//! Container metadata through ffprobe.
//!
//! The splitter needs four numbers from the container before it decodes
//! anything: resolution, frame rate, frame count and duration. Containers
//! that do not store a frame count (Matroska, most streams) get one derived
//! from duration and frame rate.

use std::path::Path;

use ffprobe::{FfProbeError, ffprobe};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Video container properties used for detection and segment writing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Frames per second as a float, for time arithmetic
    pub fps: f64,
    /// Frame rate exactly as ffprobe reported it (e.g. "30000/1001"),
    /// passed back to ffmpeg when writing segments
    pub frame_rate: String,
    /// Frame count reported (or derived) from the container
    pub total_frames: u64,
    /// Duration in seconds
    pub duration: f64,
}

impl VideoMetadata {
    /// Builds metadata from a frame rate and count, deriving the duration.
    pub fn from_counts(width: u32, height: u32, fps: f64, total_frames: u64) -> Self {
        let duration = if fps > 0.0 {
            total_frames as f64 / fps
        } else {
            0.0
        };
        Self {
            width,
            height,
            fps,
            frame_rate: format_frame_rate(fps),
            total_frames,
            duration,
        }
    }
}

/// Probes a video file for its first video stream's properties.
pub fn probe_video(input_path: &Path) -> CoreResult<VideoMetadata> {
    log::debug!(
        "Running ffprobe (via crate) for video metadata on: {}",
        input_path.display()
    );

    let metadata = ffprobe(input_path).map_err(|err| {
        log::error!("ffprobe failed on {}: {:?}", input_path.display(), err);
        map_ffprobe_error(err, input_path)
    })?;

    let video_stream = metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            CoreError::Ffprobe(format!("No video stream found in {}", input_path.display()))
        })?;

    let width = video_stream.width.unwrap_or(0);
    let height = video_stream.height.unwrap_or(0);
    if width <= 0 || height <= 0 {
        return Err(CoreError::Ffprobe(format!(
            "Invalid dimensions in {}: width={width}, height={height}",
            input_path.display()
        )));
    }

    let (fps, frame_rate) = [&video_stream.avg_frame_rate, &video_stream.r_frame_rate]
        .into_iter()
        .find_map(|rate| parse_frame_rate(rate).map(|fps| (fps, rate.clone())))
        .ok_or_else(|| {
            CoreError::Ffprobe(format!(
                "Could not determine frame rate for {}",
                input_path.display()
            ))
        })?;

    let duration = metadata
        .format
        .duration
        .as_deref()
        .or(video_stream.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0);

    let total_frames = video_stream
        .nb_frames
        .as_deref()
        .and_then(|f| f.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .or_else(|| duration.map(|d| (d * fps).round() as u64))
        .unwrap_or(0);

    let duration = duration.unwrap_or(total_frames as f64 / fps);

    log::debug!(
        "Video metadata for {}: {}x{}, {:.3} fps ({}), {} frames, {:.2}s",
        input_path.display(),
        width,
        height,
        fps,
        frame_rate,
        total_frames,
        duration
    );

    Ok(VideoMetadata {
        width: width as u32,
        height: height as u32,
        fps,
        frame_rate,
        total_frames,
        duration,
    })
}

/// Parses a frame rate string ("30000/1001", "25/1" or "29.97").
/// Returns `None` for zero, negative or malformed rates.
#[must_use]
pub fn parse_frame_rate(frame_rate: &str) -> Option<f64> {
    let fps = match frame_rate.split_once('/') {
        Some((num, den)) => {
            let numerator: f64 = num.trim().parse().ok()?;
            let denominator: f64 = den.trim().parse().ok()?;
            if denominator == 0.0 {
                return None;
            }
            numerator / denominator
        }
        None => frame_rate.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

fn format_frame_rate(fps: f64) -> String {
    if fps.fract() == 0.0 {
        format!("{}", fps as u64)
    } else {
        format!("{fps}")
    }
}

fn map_ffprobe_error(err: FfProbeError, input_path: &Path) -> CoreError {
    match err {
        FfProbeError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
            CoreError::DependencyNotFound("ffprobe".to_string())
        }
        FfProbeError::Io(io_err) => CoreError::Io(io_err),
        FfProbeError::Status(output) => CoreError::Ffprobe(format!(
            "ffprobe exited with {} for {}: {}",
            output.status,
            input_path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )),
        FfProbeError::Deserialize(err) => {
            CoreError::Ffprobe(format!("ffprobe output deserialization: {err}"))
        }
        other => CoreError::Ffprobe(format!("Unknown ffprobe error: {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rate_parsing() {
        assert_eq!(parse_frame_rate("30"), Some(30.0));
        assert_eq!(parse_frame_rate("29.97"), Some(29.97));
        assert_eq!(parse_frame_rate("30000/1001"), Some(30000.0 / 1001.0));
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("30/0"), None);
        assert_eq!(parse_frame_rate("invalid"), None);
    }

    #[test]
    fn test_metadata_from_counts() {
        let meta = VideoMetadata::from_counts(640, 360, 25.0, 100);
        assert_eq!(meta.duration, 4.0);
        assert_eq!(meta.frame_rate, "25");

        let meta = VideoMetadata::from_counts(640, 360, 0.0, 100);
        assert_eq!(meta.duration, 0.0);
    }
}
