//! Segment materialization.
//!
//! Writes every segment of an analysis to its own file in one forward pass
//! over the video, independent of the detection pass. The reader starts at
//! the first segment's start frame and each frame is routed to the segment
//! whose range holds its index. A segment file is only kept once its sink
//! has finished.

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use super::segments::{Segment, segment_file_name};
use crate::error::CoreResult;
use crate::external::{FrameSink, FrameSource, VideoBackend, remove_incomplete_output};
use crate::media::{Frame, VideoMetadata};
use crate::progress_reporting;

/// Deletes its file on drop unless marked complete.
struct IncompleteSegment<'p> {
    path: &'p Path,
    complete: bool,
}

impl<'p> IncompleteSegment<'p> {
    fn new(path: &'p Path) -> Self {
        Self {
            path,
            complete: false,
        }
    }
}

impl Drop for IncompleteSegment<'_> {
    fn drop(&mut self) {
        if !self.complete {
            remove_incomplete_output(self.path);
        }
    }
}

/// Forward reader that can hand a frame back for the next segment.
struct FrameCursor<S> {
    source: S,
    pending: Option<Frame>,
}

impl<S: FrameSource> FrameCursor<S> {
    fn next(&mut self) -> Option<Frame> {
        self.pending.take().or_else(|| self.source.next_frame())
    }

    fn push_back(&mut self, frame: Frame) {
        self.pending = Some(frame);
    }
}

/// Writes segments through a [`VideoBackend`].
pub struct SegmentMaterializer<'a, B> {
    backend: &'a B,
    output_dir: PathBuf,
    codec: String,
    extension: String,
}

impl<'a, B: VideoBackend> SegmentMaterializer<'a, B> {
    pub fn new(
        backend: &'a B,
        output_dir: impl Into<PathBuf>,
        codec: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            output_dir: output_dir.into(),
            codec: codec.into(),
            extension: extension.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path the segment at `index` is written to.
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(segment_file_name(index, &self.extension))
    }

    /// Writes all segments in order and records their paths.
    ///
    /// Segments must be sorted by start frame. Stops at the first segment
    /// that cannot be opened or written and removes that segment's file. A
    /// source that ends early truncates the current segment; segments it
    /// never reaches get no file.
    pub fn materialize(
        &self,
        video_path: &Path,
        metadata: &VideoMetadata,
        segments: &mut [Segment],
    ) -> CoreResult<Vec<PathBuf>> {
        let total = segments.len();
        let mut written = Vec::with_capacity(total);
        let Some(first) = segments.first() else {
            info!("No segments to write");
            return Ok(written);
        };

        let mut cursor = FrameCursor {
            source: self.backend.open_source(video_path, first.start_frame)?,
            pending: None,
        };

        for segment in segments.iter_mut() {
            let path = self.segment_path(segment.index);
            progress_reporting::processing(&format!(
                "Writing segment {}/{}: frames {}..{}",
                segment.index + 1,
                total,
                segment.start_frame,
                segment.end_frame
            ));

            let frames = self.write_segment(&mut cursor, metadata, segment, &path)?;
            if frames == 0 {
                warn!(
                    "Segment {} skipped: video ended before frame {}",
                    segment.index, segment.start_frame
                );
                progress_reporting::warning(&format!(
                    "Segment {} has no decodable frames, not written",
                    segment.index
                ));
                continue;
            }
            if frames < segment.frame_count {
                warn!(
                    "Segment {} truncated: wrote {} of {} frames to {}",
                    segment.index,
                    frames,
                    segment.frame_count,
                    path.display()
                );
                progress_reporting::warning(&format!(
                    "Segment {} truncated to {} of {} frames",
                    segment.index, frames, segment.frame_count
                ));
            } else {
                debug!("Wrote {} frames to {}", frames, path.display());
            }

            segment.output_path = Some(path.clone());
            written.push(path);
        }

        info!("Wrote {} segments to {}", written.len(), self.output_dir.display());
        Ok(written)
    }

    /// Routes frames `[start_frame, end_frame)` into a new file at `path`.
    /// The sink is created on the first frame, so an exhausted source leaves
    /// nothing behind.
    fn write_segment<S: FrameSource>(
        &self,
        cursor: &mut FrameCursor<S>,
        metadata: &VideoMetadata,
        segment: &Segment,
        path: &Path,
    ) -> CoreResult<u64> {
        // Declared before the sink so the sink is closed first on drop.
        let mut guard = IncompleteSegment::new(path);
        let mut sink: Option<B::Sink> = None;
        let mut frames = 0;

        while frames < segment.frame_count {
            let Some(frame) = cursor.next() else {
                break;
            };
            if frame.index < segment.start_frame {
                continue;
            }
            if frame.index >= segment.end_frame {
                cursor.push_back(frame);
                break;
            }

            if sink.is_none() {
                sink = Some(
                    self.backend
                        .create_sink(path, metadata, &self.codec)
                        .inspect_err(|e| error!("Cannot open segment {}: {e}", path.display()))?,
                );
            }
            if let Some(writer) = sink.as_mut() {
                writer
                    .write_frame(&frame)
                    .inspect_err(|e| error!("Segment {} failed: {e}", segment.index))?;
                frames += 1;
            }
        }

        if let Some(mut writer) = sink {
            writer
                .finish()
                .inspect_err(|e| error!("Segment {} failed to finalize: {e}", segment.index))?;
            guard.complete = true;
        }
        Ok(frames)
    }
}
