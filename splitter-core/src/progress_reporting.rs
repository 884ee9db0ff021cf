//! Progress Reporting API
//!
//! This module lets the core library report progress and phase messages
//! without depending on any terminal formatting. Two channels exist:
//!
//! - [`ProgressCallback`]: the per-run frame counter observer carried in the
//!   configuration and invoked with `(frames_processed, total_frames)`.
//! - [`ProgressReporter`]: a front end registered once per process that
//!   renders sections, status lines and a progress bar. With no reporter
//!   registered every call is a no-op.
//!
//! Both are advisory. Nothing the observer does can change detection
//! results.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Represents different levels of output for structured reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLevel {
    /// Major workflow phases (===== SECTION =====)
    Section,
    /// Processing steps (» Processing)
    Processing,
    /// Success messages (✓ Success)
    Success,
    /// Warning messages
    Warning,
    /// General information
    Info,
}

/// A trait for front ends that render core progress
pub trait ProgressReporter: Send + Sync {
    /// Output a message at a specific level
    fn output(&self, level: OutputLevel, text: &str);

    /// Output a key-value status pair
    fn output_status(&self, label: &str, value: &str, highlight: bool);

    /// Report frame progress
    fn frame_progress(&self, processed: u64, total: u64);

    /// Clear any active progress bar
    fn clear_progress_bar(&self);
}

/// Global progress reporter instance
static PROGRESS_REPORTER: Mutex<Option<Box<dyn ProgressReporter>>> = Mutex::new(None);

/// Set the global progress reporter
pub fn set_progress_reporter(reporter: Box<dyn ProgressReporter>) {
    if let Ok(mut r) = PROGRESS_REPORTER.lock() {
        *r = Some(reporter);
    }
}

/// Remove the global progress reporter
pub fn clear_progress_reporter() {
    if let Ok(mut r) = PROGRESS_REPORTER.lock() {
        *r = None;
    }
}

/// Execute a function with the progress reporter if available
#[inline]
pub fn with_reporter<F>(f: F)
where
    F: FnOnce(&dyn ProgressReporter),
{
    if let Ok(guard) = PROGRESS_REPORTER.lock() {
        if let Some(reporter) = guard.as_ref() {
            f(reporter.as_ref());
        }
    }
}

/// Output a section header
pub fn section(title: &str) {
    with_reporter(|r| r.output(OutputLevel::Section, title));
}

/// Output a processing step
pub fn processing(message: &str) {
    with_reporter(|r| r.output(OutputLevel::Processing, message));
}

/// Output a status line
pub fn status(label: &str, value: &str, highlight: bool) {
    with_reporter(|r| r.output_status(label, value, highlight));
}

/// Output a success message
pub fn success(message: &str) {
    with_reporter(|r| r.output(OutputLevel::Success, message));
}

/// Output a warning message
pub fn warning(message: &str) {
    with_reporter(|r| r.output(OutputLevel::Warning, message));
}

/// Output general information
pub fn info(message: &str) {
    with_reporter(|r| r.output(OutputLevel::Info, message));
}

/// Report frame progress
pub fn frame_progress(processed: u64, total: u64) {
    with_reporter(|r| r.frame_progress(processed, total));
}

/// Clear progress bar
pub fn clear_progress() {
    with_reporter(|r| r.clear_progress_bar());
}

/// Shareable observer for `(frames_processed, total_frames)` updates.
#[derive(Clone)]
pub struct ProgressCallback(Arc<dyn Fn(u64, u64) + Send + Sync>);

impl ProgressCallback {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(u64, u64) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    pub fn call(&self, processed: u64, total: u64) {
        (self.0)(processed, total);
    }
}

impl fmt::Debug for ProgressCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressCallback(..)")
    }
}

/// Sends a progress update to the configured callback and the registered
/// reporter.
pub(crate) fn report_frames(callback: Option<&ProgressCallback>, processed: u64, total: u64) {
    if let Some(callback) = callback {
        callback.call(processed, total);
    }
    frame_progress(processed, total);
}
