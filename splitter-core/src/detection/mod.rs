//! Scene-change detection
//!
//! This module contains the two-stage detector that turns a frame stream
//! into an ordered list of cut points.

pub mod scene;

// Re-export scene detection types
pub use scene::{DetectionOutcome, DetectionStats, SceneDetector};
