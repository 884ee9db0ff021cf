// Shared helpers for splitter-core integration tests.
#![allow(dead_code)]

use std::cell::Cell;
use std::fs::File;
use std::path::PathBuf;

use image::{Rgb, RgbImage};
use splitter_core::{CoreResult, Embedding, FrameEmbedder, MemoryBackend, MemoryVideo};
use tempfile::TempDir;

pub const GRAY: [bool; 3] = [true, true, true];
pub const RED: [bool; 3] = [true, false, false];
pub const BLUE: [bool; 3] = [false, false, true];

/// 8x8 grid of pseudo-random levels in the selected channels. Different
/// seeds give unrelated perceptual hashes.
pub fn blocks(seed: u32, channels: [bool; 3]) -> RgbImage {
    let mut state = seed;
    let mut levels = [0u8; 64];
    for level in levels.iter_mut() {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        *level = 40 + ((state >> 16) % 160) as u8;
    }
    RgbImage::from_fn(64, 64, |x, y| {
        let v = levels[((y / 8) * 8 + x / 8) as usize];
        Rgb(channels.map(|on| if on { v } else { 0 }))
    })
}

/// A shot: `len` identical frames.
pub fn shot(seed: u32, channels: [bool; 3], len: usize) -> Vec<RgbImage> {
    vec![blocks(seed, channels); len]
}

/// Embeds a frame as its mean color; counts calls.
#[derive(Default)]
pub struct MeanColor {
    pub calls: Cell<usize>,
}

impl FrameEmbedder for MeanColor {
    fn embed(&self, image: &RgbImage) -> CoreResult<Embedding> {
        self.calls.set(self.calls.get() + 1);
        let count = (image.width() * image.height()).max(1) as f32;
        let mut sums = [1.0f32; 3];
        for pixel in image.pixels() {
            for (sum, c) in sums.iter_mut().zip(pixel.0) {
                *sum += f32::from(c) / count;
            }
        }
        Embedding::from_raw(sums.to_vec())
    }
}

/// A placeholder video file plus an in-memory backend serving `frames`
/// under its path.
pub struct Fixture {
    pub dir: TempDir,
    pub video_path: PathBuf,
    pub backend: MemoryBackend,
}

impl Fixture {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self::with_video(|video| video, frames)
    }

    pub fn with_video(adjust: impl FnOnce(MemoryVideo) -> MemoryVideo, frames: Vec<RgbImage>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let video_path = dir.path().join("input.mp4");
        File::create(&video_path).unwrap();
        let backend = MemoryBackend::new();
        backend.insert_video(&video_path, adjust(MemoryVideo::new(frames, 25.0)));
        Self {
            dir,
            video_path,
            backend,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("segments")
    }
}
