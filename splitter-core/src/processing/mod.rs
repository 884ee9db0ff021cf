//! Core splitting logic and orchestration.
//!
//! This module organizes the steps after detection: deriving segments from
//! cut points, writing them out, and the [`VideoSplitter`] that runs the
//! whole pipeline.

/// Segment derivation from split points
pub mod segments;

/// Writing segments to files
pub mod materialize;

/// Pipeline orchestration
pub mod splitter;

pub use materialize::SegmentMaterializer;
pub use segments::{Segment, bookend, derive_segments, segment_file_name};
pub use splitter::VideoSplitter;
