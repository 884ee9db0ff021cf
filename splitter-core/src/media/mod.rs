//! Media types and probing
//!
//! Decoded frames, the image input variants accepted by the similarity
//! helpers, and container metadata obtained through ffprobe.

pub mod frame;
pub mod probe;

// Re-export commonly used types
pub use frame::{ChannelOrder, Frame, ImageInput};
pub use probe::{VideoMetadata, parse_frame_rate, probe_video};
