//! DCT perceptual hash.
//!
//! The fast stage of the detector. A frame is reduced to luma, shrunk to a
//! small square, transformed with a 2-D DCT-II, and the low-frequency corner
//! of the spectrum is thresholded against its median. Two frames of the same
//! shot produce hashes a few bits apart; a hard cut flips roughly half.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use rustdct::DctPlanner;

use crate::error::{CoreError, CoreResult};
use crate::media::ImageInput;

/// Side of the square hash matrix.
pub const DEFAULT_HASH_SIDE: usize = 8;

/// Ratio between the resized image side and the hash side.
pub const DEFAULT_HIGHFREQ_FACTOR: usize = 4;

/// A square bit matrix produced by [`PerceptualHasher`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bits: Vec<bool>,
    side: usize,
}

impl Fingerprint {
    /// Side `L` of the hash matrix.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Bits in row-major order.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Hamming distance to another fingerprint of the same side.
    pub fn distance(&self, other: &Fingerprint) -> CoreResult<u32> {
        if self.side != other.side {
            return Err(CoreError::Validation(format!(
                "cannot compare a {0}x{0} fingerprint with a {1}x{1} one",
                self.side, other.side
            )));
        }
        Ok(self.hamming(other))
    }

    /// `1 - hamming / L²`.
    pub fn similarity(&self, other: &Fingerprint) -> CoreResult<f64> {
        let distance = self.distance(other)?;
        Ok(self.score(distance))
    }

    fn hamming(&self, other: &Fingerprint) -> u32 {
        self.bits
            .iter()
            .zip(&other.bits)
            .filter(|(a, b)| a != b)
            .count() as u32
    }

    fn score(&self, distance: u32) -> f64 {
        let cells = (self.side * self.side) as f64;
        1.0 - f64::from(distance) / cells
    }
}

/// Computes DCT perceptual hashes of a fixed size.
#[derive(Debug, Clone, Copy)]
pub struct PerceptualHasher {
    side: usize,
    highfreq_factor: usize,
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self {
            side: DEFAULT_HASH_SIDE,
            highfreq_factor: DEFAULT_HIGHFREQ_FACTOR,
        }
    }
}

impl PerceptualHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher with a custom hash side (at least 2) and resize factor (at
    /// least 1).
    pub fn with_size(side: usize, highfreq_factor: usize) -> CoreResult<Self> {
        if side < 2 || highfreq_factor == 0 {
            return Err(CoreError::Validation(format!(
                "invalid hash size {side} with factor {highfreq_factor}"
            )));
        }
        Ok(Self {
            side,
            highfreq_factor,
        })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn fingerprint(&self, image: &RgbImage) -> Fingerprint {
        let n = self.side * self.highfreq_factor;
        let luma = to_luma(image);
        let small = imageops::resize(&luma, n as u32, n as u32, FilterType::Lanczos3);

        let mut pixels: Vec<f32> = small.as_raw().iter().map(|p| f32::from(*p)).collect();
        dct_2d(&mut pixels, n);

        let low: Vec<f32> = (0..self.side)
            .flat_map(|row| pixels[row * n..row * n + self.side].iter().copied())
            .collect();
        let median = median(&mut low.clone());
        let bits = low.iter().map(|c| *c > median).collect();

        Fingerprint {
            bits,
            side: self.side,
        }
    }

    /// Similarity of two images in [0, 1].
    pub fn similarity(&self, a: &RgbImage, b: &RgbImage) -> f64 {
        let fa = self.fingerprint(a);
        let fb = self.fingerprint(b);
        fa.score(fa.hamming(&fb))
    }
}

/// pHash similarity of two pictures given in any supported form.
pub fn phash_similarity(a: impl Into<ImageInput>, b: impl Into<ImageInput>) -> CoreResult<f64> {
    let a = a.into().to_rgb()?;
    let b = b.into().to_rgb()?;
    Ok(PerceptualHasher::default().similarity(&a, &b))
}

/// ITU-R 601 luma, integer weights.
fn to_luma(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000;
        Luma([luma as u8])
    })
}

/// In-place separable DCT-II over an `n x n` row-major matrix.
fn dct_2d(data: &mut [f32], n: usize) {
    let mut planner = DctPlanner::new();
    let dct = planner.plan_dct2(n);

    for row in data.chunks_exact_mut(n) {
        dct.process_dct2(row);
    }

    let mut column = vec![0f32; n];
    for x in 0..n {
        for (y, value) in column.iter_mut().enumerate() {
            *value = data[y * n + x];
        }
        dct.process_dct2(&mut column);
        for (y, value) in column.iter().enumerate() {
            data[y * n + x] = *value;
        }
    }
}

/// Median with the even-length convention (mean of the two middle values).
fn median(values: &mut [f32]) -> f32 {
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32, horizontal: bool) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = if horizontal {
                (x * 255 / width.max(1)) as u8
            } else {
                (y * 255 / height.max(1)) as u8
            };
            Rgb([v, v / 2, 255 - v])
        })
    }

    fn checkerboard(size: u32, cell: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn test_fingerprint_has_side_squared_bits() {
        let hasher = PerceptualHasher::new();
        let fp = hasher.fingerprint(&gradient(64, 48, true));
        assert_eq!(fp.side(), 8);
        assert_eq!(fp.bits().len(), 64);
    }

    #[test]
    fn test_identical_images_score_one() {
        let hasher = PerceptualHasher::new();
        let image = checkerboard(64, 8);
        assert_eq!(hasher.similarity(&image, &image), 1.0);
    }

    #[test]
    fn test_similarity_is_symmetric_and_bounded() {
        let hasher = PerceptualHasher::new();
        let a = gradient(64, 64, true);
        let b = checkerboard(64, 16);
        let ab = hasher.similarity(&a, &b);
        let ba = hasher.similarity(&b, &a);
        assert_eq!(ab, ba);
        assert!((0.0..=1.0).contains(&ab));
    }

    /// 8x8 grid of pseudo-random gray levels kept away from 0 and 255.
    fn blocks(seed: u32) -> RgbImage {
        let mut state = seed;
        let mut levels = [0u8; 64];
        for level in levels.iter_mut() {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            *level = 40 + ((state >> 16) % 160) as u8;
        }
        RgbImage::from_fn(64, 64, |x, y| {
            let v = levels[((y / 8) * 8 + x / 8) as usize];
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_brightness_shift_keeps_hash_while_new_scene_changes_it() {
        let hasher = PerceptualHasher::new();
        let shot = blocks(7);
        let mut brighter = shot.clone();
        for pixel in brighter.pixels_mut() {
            pixel.0 = pixel.0.map(|c| c + 3);
        }
        let other_shot = blocks(91);

        let same = hasher.similarity(&shot, &brighter);
        let different = hasher.similarity(&shot, &other_shot);
        assert!(same >= 0.95, "same shot scored {same}");
        assert!(different < same, "new scene scored {different}");
    }

    #[test]
    fn test_score_uses_side_squared() {
        let a = Fingerprint {
            bits: vec![false; 64],
            side: 8,
        };
        let mut flipped = vec![false; 64];
        flipped[..16].fill(true);
        let b = Fingerprint {
            bits: flipped,
            side: 8,
        };
        assert_eq!(a.similarity(&b).unwrap(), 0.75);
    }

    #[test]
    fn test_mismatched_sides_are_rejected() {
        let small = PerceptualHasher::with_size(4, 4).unwrap();
        let image = gradient(32, 32, true);
        let a = small.fingerprint(&image);
        let b = PerceptualHasher::new().fingerprint(&image);
        assert!(matches!(a.similarity(&b), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_phash_similarity_accepts_mixed_inputs() {
        let image = checkerboard(32, 4);
        let buffer = ImageInput::FromDecodedBuffer {
            width: 32,
            height: 32,
            data: image.as_raw().clone(),
            order: crate::media::ChannelOrder::Rgb,
        };
        let handle = image::DynamicImage::ImageRgb8(image);
        assert_eq!(phash_similarity(buffer, handle).unwrap(), 1.0);
    }
}
