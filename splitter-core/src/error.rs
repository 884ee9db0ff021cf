//! Error types for the splitter-core library.
//!
//! Every fallible operation in the crate returns [`CoreResult`]. The variants
//! are grouped by how the caller is expected to react: input validation
//! errors are raised before any work starts, resource-open errors abort the
//! current run, and model errors are never recovered from.

use std::path::Path;
use thiserror::Error;

/// Custom error types for the splitter
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Failed to open video source '{path}': {reason}")]
    SourceOpen { path: String, reason: String },

    #[error("Failed to open segment output '{path}': {reason}")]
    SinkOpen { path: String, reason: String },

    #[error("Failed to write segment output '{path}': {reason}")]
    SinkWrite { path: String, reason: String },

    #[error("Failed to initialize embedding model: {0}")]
    ModelInit(String),

    #[error("Embedding inference failed: {0}")]
    Inference(String),

    #[error("ffprobe error: {0}")]
    Ffprobe(String),

    #[error("Required dependency '{0}' not found")]
    DependencyNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for splitter operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

pub(crate) fn source_open_error(path: &Path, reason: impl ToString) -> CoreError {
    CoreError::SourceOpen {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

pub(crate) fn sink_open_error(path: &Path, reason: impl ToString) -> CoreError {
    CoreError::SinkOpen {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

pub(crate) fn sink_write_error(path: &Path, reason: impl ToString) -> CoreError {
    CoreError::SinkWrite {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Flattens a tract error chain into a [`CoreError::ModelInit`].
pub(crate) fn model_init_error(err: anyhow::Error) -> CoreError {
    CoreError::ModelInit(format!("{err:#}"))
}

/// Flattens a tract error chain into a [`CoreError::Inference`].
pub(crate) fn inference_error(err: anyhow::Error) -> CoreError {
    CoreError::Inference(format!("{err:#}"))
}
