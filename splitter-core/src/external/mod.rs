// ============================================================================
// splitter-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Frame decoding and segment encoding backends
//
// This module hides where frames come from and where segments go. The
// detector and the materializer only see the traits below; the default
// implementation drives ffmpeg/ffprobe as child processes, and an in-memory
// implementation backs tests and callers that already hold decoded frames.
//
// KEY COMPONENTS:
// - FrameSource: forward-only reader of decoded frames
// - FrameSink: writer for one segment file
// - VideoBackend: opens sources and sinks, probes metadata
// - SidecarBackend: ffmpeg-sidecar + ffprobe implementation
// - MemoryBackend: in-memory implementation
//
// AI-ASSISTANT-INFO: Decode/encode abstractions for the splitter pipeline

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::media::{Frame, VideoMetadata};

// ---- Standard library imports ----
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// In-memory backend
pub mod memory;

/// ffmpeg-sidecar backed decoding and encoding
pub mod sidecar;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use memory::{MemoryBackend, MemorySink, MemorySource, MemoryVideo};
pub use sidecar::{SidecarBackend, SidecarSink, SidecarSource};

// ============================================================================
// TRAITS
// ============================================================================

/// Sequential reader of decoded frames in presentation order.
pub trait FrameSource {
    /// Container metadata for the stream being read.
    fn metadata(&self) -> &VideoMetadata;

    /// Returns the next frame, or `None` once the stream is exhausted.
    ///
    /// A frame that fails to decode ends the stream: implementations log the
    /// failure and return `None` from then on instead of an error.
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Writer for one segment file.
pub trait FrameSink {
    /// Appends one frame to the segment.
    fn write_frame(&mut self, frame: &Frame) -> CoreResult<()>;

    /// Flushes and closes the segment. Must be called exactly once.
    fn finish(&mut self) -> CoreResult<()>;
}

/// Something that can open frame sources and segment sinks.
pub trait VideoBackend {
    type Source: FrameSource;
    type Sink: FrameSink;

    /// Verifies that the backend's external requirements are present.
    fn check_available(&self) -> CoreResult<()> {
        Ok(())
    }

    /// Reads container metadata without decoding frames.
    fn probe(&self, path: &Path) -> CoreResult<VideoMetadata>;

    /// Opens an independent reader whose first frame is `start_frame`.
    fn open_source(&self, path: &Path, start_frame: u64) -> CoreResult<Self::Source>;

    /// Opens a segment writer with the given resolution and frame rate.
    fn create_sink(
        &self,
        path: &Path,
        metadata: &VideoMetadata,
        codec: &str,
    ) -> CoreResult<Self::Sink>;
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs the command with `-version` and discards its output.
///
/// # Errors
///
/// * `CoreError::DependencyNotFound` - If the command is not found
/// * `CoreError::Io` - If the command exists but fails to start
pub(crate) fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::Io(e))
        }
    }
}

// ============================================================================
// OUTPUT CLEANUP
// ============================================================================

/// Deletes a segment file that was not finished. A missing file is fine;
/// any other failure is logged and otherwise ignored.
pub(crate) fn remove_incomplete_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("Removed incomplete segment {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove incomplete segment {}: {}", path.display(), e),
    }
}
