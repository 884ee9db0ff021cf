// ============================================================================
// splitter-core/src/external/memory.rs
// ============================================================================
//
// IN-MEMORY BACKEND: frames held in memory, segments recorded in memory
//
// Used by the test suites and by callers that already hold decoded frames.
// Videos are registered under a path; every `open_source` call is counted so
// callers can check how many read passes a run needed.
//
// AI-ASSISTANT-INFO: In-memory VideoBackend for tests and embedding callers

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use image::RgbImage;

use super::{FrameSink, FrameSource, VideoBackend};
use crate::error::{CoreResult, sink_open_error, sink_write_error, source_open_error};
use crate::media::{Frame, VideoMetadata};

/// A video held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryVideo {
    pub metadata: VideoMetadata,
    pub frames: Vec<RgbImage>,
    /// Number of frames a reader gets before a simulated read failure
    pub readable_frames: Option<usize>,
}

impl MemoryVideo {
    /// Wraps frames with metadata whose frame count matches the frames.
    pub fn new(frames: Vec<RgbImage>, fps: f64) -> Self {
        let (width, height) = frames.first().map_or((0, 0), |f| f.dimensions());
        let metadata = VideoMetadata::from_counts(width, height, fps, frames.len() as u64);
        Self {
            metadata,
            frames,
            readable_frames: None,
        }
    }

    /// Overrides the frame count the container claims to have.
    pub fn with_reported_frames(mut self, total_frames: u64) -> Self {
        self.metadata.total_frames = total_frames;
        self
    }

    /// Makes every read pass stop after `count` frames.
    pub fn with_read_failure_after(mut self, count: usize) -> Self {
        self.readable_frames = Some(count);
        self
    }
}

#[derive(Debug, Default)]
struct MemoryStore {
    videos: HashMap<PathBuf, MemoryVideo>,
    segments: HashMap<PathBuf, Vec<Frame>>,
    failing_sinks: Vec<PathBuf>,
    sources_opened: usize,
}

/// Backend serving registered in-memory videos.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Mutex<MemoryStore>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, MemoryStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a video under `path`.
    pub fn insert_video(&self, path: impl Into<PathBuf>, video: MemoryVideo) {
        self.store().videos.insert(path.into(), video);
    }

    /// Makes sinks created at `path` fail on their first write.
    pub fn fail_writes_to(&self, path: impl Into<PathBuf>) {
        self.store().failing_sinks.push(path.into());
    }

    /// Frames written to a finished segment, if any.
    pub fn segment_frames(&self, path: &Path) -> Option<Vec<Frame>> {
        self.store().segments.get(path).cloned()
    }

    /// Paths of all finished segments, sorted.
    pub fn segment_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.store().segments.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of read passes opened so far.
    pub fn sources_opened(&self) -> usize {
        self.store().sources_opened
    }
}

impl VideoBackend for MemoryBackend {
    type Source = MemorySource;
    type Sink = MemorySink;

    fn probe(&self, path: &Path) -> CoreResult<VideoMetadata> {
        self.store()
            .videos
            .get(path)
            .map(|video| video.metadata.clone())
            .ok_or_else(|| source_open_error(path, "no in-memory video registered"))
    }

    fn open_source(&self, path: &Path, start_frame: u64) -> CoreResult<MemorySource> {
        let mut store = self.store();
        let video = store
            .videos
            .get(path)
            .cloned()
            .ok_or_else(|| source_open_error(path, "no in-memory video registered"))?;
        store.sources_opened += 1;

        // A start beyond the addressable range yields an empty reader.
        let skip = usize::try_from(start_frame).unwrap_or(usize::MAX);
        let end = video
            .readable_frames
            .map_or(video.frames.len(), |n| n.min(video.frames.len()));
        let frames = video
            .frames
            .into_iter()
            .take(end)
            .enumerate()
            .skip(skip)
            .map(|(index, image)| Frame::new(index as u64, image))
            .collect::<Vec<_>>()
            .into_iter();

        Ok(MemorySource {
            metadata: video.metadata,
            frames,
        })
    }

    fn create_sink(
        &self,
        path: &Path,
        metadata: &VideoMetadata,
        _codec: &str,
    ) -> CoreResult<MemorySink> {
        if path.as_os_str().is_empty() {
            return Err(sink_open_error(path, "empty segment path"));
        }
        let fail_on_write = self.store().failing_sinks.iter().any(|p| p == path);
        Ok(MemorySink {
            path: path.to_path_buf(),
            width: metadata.width,
            height: metadata.height,
            frames: Vec::new(),
            fail_on_write,
            store: Arc::clone(&self.store),
        })
    }
}

/// Reader over an in-memory video.
#[derive(Debug)]
pub struct MemorySource {
    metadata: VideoMetadata,
    frames: std::vec::IntoIter<Frame>,
}

impl FrameSource for MemorySource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> Option<Frame> {
        self.frames.next()
    }
}

/// Segment writer that stores frames in the owning backend on finish.
#[derive(Debug)]
pub struct MemorySink {
    path: PathBuf,
    width: u32,
    height: u32,
    frames: Vec<Frame>,
    fail_on_write: bool,
    store: Arc<Mutex<MemoryStore>>,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &Frame) -> CoreResult<()> {
        if self.fail_on_write {
            return Err(sink_write_error(&self.path, "simulated write failure"));
        }
        if frame.width() != self.width || frame.height() != self.height {
            return Err(sink_write_error(
                &self.path,
                format!(
                    "frame {} is {}x{}, segment is {}x{}",
                    frame.index,
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                ),
            ));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> CoreResult<()> {
        let frames = std::mem::take(&mut self.frames);
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .segments
            .insert(self.path.clone(), frames);
        Ok(())
    }
}
