// ============================================================================
// splitter-core/src/external/sidecar.rs
// ============================================================================
//
// FFMPEG SIDECAR BACKEND: decoding and encoding through ffmpeg child processes
//
// Frames are decoded by an ffmpeg process writing packed RGB24 to stdout,
// parsed by ffmpeg-sidecar into OutputVideoFrame events. Segments are written
// by a second ffmpeg process reading packed RGB24 from stdin.
//
// Every source is an independent decode pass. Opening at a non-zero start
// frame uses a `select` filter on the frame counter so the first frame handed
// out is exactly the requested one, regardless of keyframe placement.
// A sink owns its output file until `finish` succeeds; a sink that is
// dropped unfinished, or fails to start, deletes the file.
//
// AI-ASSISTANT-INFO: ffmpeg-sidecar implementation of the VideoBackend traits

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ChildStdin;
use std::thread::JoinHandle;

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;
use log::{debug, trace, warn};

use super::{FrameSink, FrameSource, VideoBackend, check_dependency, remove_incomplete_output};
use crate::error::{CoreError, CoreResult, sink_open_error, sink_write_error, source_open_error};
use crate::media::{Frame, VideoMetadata, probe_video};

/// Messages ffmpeg prints at error level that do not affect decoded frames.
const NON_CRITICAL_MESSAGES: &[&str] = &[
    "deprecated pixel format used",
    "Last message repeated",
    "non monotonically increasing dts",
];

fn is_non_critical_ffmpeg_message(message: &str) -> bool {
    NON_CRITICAL_MESSAGES
        .iter()
        .any(|pattern| message.contains(pattern))
}

fn spawn_error(path: &Path, err: io::Error, open_error: fn(&Path, String) -> CoreError) -> CoreError {
    if err.kind() == io::ErrorKind::NotFound {
        CoreError::DependencyNotFound("ffmpeg".to_string())
    } else {
        open_error(path, format!("failed to start ffmpeg: {err}"))
    }
}

/// Decoder command: first video stream of `path` as RGB24 on stdout, starting
/// at `start_frame`.
fn decoder_command(path: &Path, start_frame: u64) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new();
    cmd.hide_banner()
        .input(path.to_string_lossy().as_ref())
        .args(["-map", "0:v:0"]);
    if start_frame > 0 {
        cmd.args(["-vf", &format!("select=gte(n\\,{start_frame})")]);
    }
    cmd.args(["-fps_mode", "passthrough"]).rawvideo();
    cmd
}

/// Encoder command: RGB24 frames of the source size and exact frame rate on
/// stdin, encoded with `codec` into `path`.
fn encoder_command(path: &Path, metadata: &VideoMetadata, codec: &str) -> FfmpegCommand {
    let size = format!("{}x{}", metadata.width, metadata.height);
    let mut cmd = FfmpegCommand::new();
    cmd.hide_banner()
        .args(["-loglevel", "error", "-nostats"])
        .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
        .args(["-s", &size, "-r", &metadata.frame_rate])
        .input("-")
        .args(["-c:v", codec, "-q:v", "2", "-pix_fmt", "yuv420p"])
        .overwrite()
        .output(path.to_string_lossy().as_ref());
    cmd
}

/// Backend that shells out to ffmpeg and ffprobe.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarBackend;

impl SidecarBackend {
    pub fn new() -> Self {
        Self
    }
}

impl VideoBackend for SidecarBackend {
    type Source = SidecarSource;
    type Sink = SidecarSink;

    fn check_available(&self) -> CoreResult<()> {
        check_dependency("ffmpeg")?;
        check_dependency("ffprobe")
    }

    fn probe(&self, path: &Path) -> CoreResult<VideoMetadata> {
        probe_video(path).map_err(|err| match err {
            CoreError::Ffprobe(reason) => source_open_error(path, reason),
            other => other,
        })
    }

    fn open_source(&self, path: &Path, start_frame: u64) -> CoreResult<SidecarSource> {
        let metadata = self.probe(path)?;
        SidecarSource::open(path, metadata, start_frame)
    }

    fn create_sink(
        &self,
        path: &Path,
        metadata: &VideoMetadata,
        codec: &str,
    ) -> CoreResult<SidecarSink> {
        SidecarSink::create(path, metadata, codec)
    }
}

// ============================================================================
// SOURCE
// ============================================================================

/// Decoding ffmpeg process yielding RGB24 frames.
pub struct SidecarSource {
    path: PathBuf,
    metadata: VideoMetadata,
    child: FfmpegChild,
    events: FfmpegIterator,
    next_index: u64,
    finished: bool,
}

impl SidecarSource {
    fn open(path: &Path, metadata: VideoMetadata, start_frame: u64) -> CoreResult<Self> {
        let mut cmd = decoder_command(path, start_frame);
        debug!("Opening frame source: {:?}", cmd.as_inner());

        let mut child = cmd
            .spawn()
            .map_err(|e| spawn_error(path, e, |p, r| source_open_error(p, r)))?;
        let events = child
            .iter()
            .map_err(|e| source_open_error(path, format!("failed to read ffmpeg output: {e}")))?;

        Ok(Self {
            path: path.to_path_buf(),
            metadata,
            child,
            events,
            next_index: start_frame,
            finished: false,
        })
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        match self.child.wait() {
            Ok(status) if !status.success() => {
                debug!("ffmpeg decoder for {} exited with {status}", self.path.display());
            }
            Err(e) => debug!("Failed to reap ffmpeg decoder: {e}"),
            Ok(_) => {}
        }
    }
}

impl FrameSource for SidecarSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if self.finished {
            return None;
        }

        while let Some(event) = self.events.next() {
            match event {
                FfmpegEvent::OutputFrame(output) => {
                    let index = self.next_index;
                    match Frame::from_rgb24(index, output.width, output.height, output.data) {
                        Ok(frame) => {
                            self.next_index += 1;
                            return Some(frame);
                        }
                        Err(e) => {
                            warn!("Stopping read of {} at frame {index}: {e}", self.path.display());
                            let _ = self.child.kill();
                            self.finish();
                            return None;
                        }
                    }
                }
                FfmpegEvent::Error(message) | FfmpegEvent::Log(LogLevel::Error, message) => {
                    if !is_non_critical_ffmpeg_message(&message) {
                        warn!("ffmpeg ({}): {message}", self.path.display());
                    }
                }
                FfmpegEvent::Log(_, message) => trace!("ffmpeg: {message}"),
                FfmpegEvent::Done => break,
                _ => {}
            }
        }

        self.finish();
        None
    }
}

impl Drop for SidecarSource {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            self.finish();
        }
    }
}

// ============================================================================
// SINK
// ============================================================================

/// Encoding ffmpeg process fed RGB24 frames through stdin.
pub struct SidecarSink {
    path: PathBuf,
    width: u32,
    height: u32,
    child: FfmpegChild,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    finished: bool,
}

impl SidecarSink {
    fn create(path: &Path, metadata: &VideoMetadata, codec: &str) -> CoreResult<Self> {
        // ffmpeg only opens its output after the first frame arrives; check
        // writability up front so an unusable path fails before decoding.
        File::create(path).map_err(|e| sink_open_error(path, e))?;

        let mut cmd = encoder_command(path, metadata, codec);
        debug!("Opening segment sink: {:?}", cmd.as_inner());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                remove_incomplete_output(path);
                return Err(spawn_error(path, e, |p, r| sink_open_error(p, r)));
            }
        };

        let Some(stdin) = child.take_stdin() else {
            let _ = child.kill();
            let _ = child.wait();
            remove_incomplete_output(path);
            return Err(sink_open_error(path, "ffmpeg stdin unavailable"));
        };
        let stderr = child.take_stderr().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buffer = String::new();
                let _ = stderr.read_to_string(&mut buffer);
                buffer
            })
        });

        Ok(Self {
            path: path.to_path_buf(),
            width: metadata.width,
            height: metadata.height,
            child,
            stdin: Some(stdin),
            stderr,
            finished: false,
        })
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .map(|text| {
                text.lines()
                    .filter(|line| !is_non_critical_ffmpeg_message(line))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }
}

impl FrameSink for SidecarSink {
    fn write_frame(&mut self, frame: &Frame) -> CoreResult<()> {
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

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| sink_write_error(&self.path, "segment already finished"))?;

        if let Err(e) = stdin.write_all(frame.as_rgb24()) {
            self.stdin = None;
            let _ = self.child.wait();
            let stderr = self.collect_stderr();
            let reason = if stderr.is_empty() {
                e.to_string()
            } else {
                format!("{e}: {stderr}")
            };
            return Err(sink_write_error(&self.path, reason));
        }
        Ok(())
    }

    fn finish(&mut self) -> CoreResult<()> {
        if self.finished {
            return Ok(());
        }
        let Some(mut stdin) = self.stdin.take() else {
            return Err(sink_write_error(&self.path, "segment encoder already failed"));
        };
        stdin.flush().map_err(|e| sink_write_error(&self.path, e))?;
        drop(stdin);

        let status = self
            .child
            .wait()
            .map_err(|e| sink_write_error(&self.path, e))?;
        let stderr = self.collect_stderr();

        if status.success() {
            self.finished = true;
            Ok(())
        } else {
            let reason = if stderr.is_empty() {
                format!("ffmpeg exited with {status}")
            } else {
                format!("ffmpeg exited with {status}: {stderr}")
            };
            Err(sink_write_error(&self.path, reason))
        }
    }
}

impl Drop for SidecarSink {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if self.stdin.take().is_some() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        remove_incomplete_output(&self.path);
    }
}
