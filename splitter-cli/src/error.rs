// ============================================================================
// splitter-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: context wrapping and user-facing hints
//
// Every failure the binary reports is a splitter-core CoreError. This module
// adds two things on top: a context wrapper for the few fallible steps the
// CLI owns (log files, JSON output), and a short hint printed under the error
// line for failures a user can fix from the command line.
//
// KEY COMPONENTS:
// - CliResult: Type alias for CLI operations
// - CliErrorContext: context for Results converting into CoreError
// - recovery_hint: next step for the user, by error kind
// - cli_error!: formatted CoreError construction
//
// AI-ASSISTANT-INFO: CLI error handling utilities

// ---- Internal crate imports ----
use splitter_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Type alias for CLI results using CoreError.
///
/// Every failure the CLI reports is a CoreError, which keeps the exit code
/// mapping in one place.
pub type CliResult<T> = CoreResult<T>;

// ============================================================================
// ERROR CONTEXT
// ============================================================================

/// Prefixes errors from CLI-owned steps with what the CLI was doing.
pub trait CliErrorContext<T> {
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display;

    /// Lazy variant of [`CliErrorContext::cli_context`].
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display,
    {
        self.cli_with_context(|| context)
    }

    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", f(), core_error))
        })
    }
}

// ============================================================================
// USER HINTS
// ============================================================================

/// What the user can change to get past `err`, if anything.
pub fn recovery_hint(err: &CoreError) -> Option<&'static str> {
    match err {
        CoreError::DependencyNotFound(_) => {
            Some("Install ffmpeg and ffprobe and make sure both are on PATH.")
        }
        CoreError::ModelInit(reason) if reason.contains("-dimensional") => Some(
            "Set --embedding-dim to the model's output width (1024 for DINOv2-large, 768 for DINOv2-base).",
        ),
        CoreError::ModelInit(_) => {
            Some("Pass an ONNX image model with --model or VIDEO_SPLITTER_MODEL.")
        }
        CoreError::NotFound(_) | CoreError::SourceOpen { .. } => {
            Some("Check that the input path points to a readable video file.")
        }
        CoreError::SinkOpen { .. } => {
            Some("Check that the output directory exists and is writable, or pick another with --output.")
        }
        _ => None,
    }
}

/// Creates a CLI error with a formatted message.
///
/// This is a convenience macro similar to anyhow! but creates a CoreError.
#[macro_export]
macro_rules! cli_error {
    ($($arg:tt)*) => {
        $crate::splitter_core::CoreError::OperationFailed(format!($($arg)*))
    };
}
