//! Learned-embedding confirmation.
//!
//! A candidate cut from the hash stage is only kept when the two frames also
//! look different to a pretrained vision model. Embeddings are unit vectors,
//! so cosine similarity is a dot product.

use image::RgbImage;

use crate::config::DEFAULT_CONFIRMATION_THRESHOLD;
use crate::error::{CoreError, CoreResult};
use crate::media::ImageInput;

/// Norms below this are treated as zero and left unscaled.
const NORM_EPSILON: f32 = 1e-12;

/// An L2-normalized feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Normalizes `values` to unit length. An all-zero vector stays zero.
    pub fn from_raw(mut values: Vec<f32>) -> CoreResult<Self> {
        if values.is_empty() {
            return Err(CoreError::Inference("empty embedding".to_string()));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::Inference(
                "embedding contains non-finite values".to_string(),
            ));
        }
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > NORM_EPSILON {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(Self(values))
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Cosine similarity clamped to [-1, 1].
    pub fn cosine(&self, other: &Embedding) -> CoreResult<f32> {
        if self.dim() != other.dim() {
            return Err(CoreError::Validation(format!(
                "embedding dimensions differ: {} vs {}",
                self.dim(),
                other.dim()
            )));
        }
        let dot: f32 = self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum();
        Ok(dot.clamp(-1.0, 1.0))
    }
}

/// Anything that maps a picture to an embedding.
///
/// Implementations must be deterministic: the same pixels always produce the
/// same vector.
pub trait FrameEmbedder {
    fn embed(&self, image: &RgbImage) -> CoreResult<Embedding>;
}

impl<E: FrameEmbedder + ?Sized> FrameEmbedder for &E {
    fn embed(&self, image: &RgbImage) -> CoreResult<Embedding> {
        (**self).embed(image)
    }
}

impl<E: FrameEmbedder + ?Sized> FrameEmbedder for Box<E> {
    fn embed(&self, image: &RgbImage) -> CoreResult<Embedding> {
        (**self).embed(image)
    }
}

/// Decides whether two frames show the same content.
#[derive(Debug, Clone)]
pub struct ConfirmationEstimator<E> {
    embedder: E,
    threshold: f32,
}

impl<E: FrameEmbedder> ConfirmationEstimator<E> {
    /// Estimator with the default threshold of 0.92.
    pub fn new(embedder: E) -> Self {
        Self::with_threshold(embedder, DEFAULT_CONFIRMATION_THRESHOLD)
    }

    pub fn with_threshold(embedder: E, threshold: f32) -> Self {
        Self {
            embedder,
            threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Cosine similarity of the two frames' embeddings.
    pub fn similarity(&self, a: &RgbImage, b: &RgbImage) -> CoreResult<f32> {
        let ea = self.embedder.embed(a)?;
        let eb = self.embedder.embed(b)?;
        ea.cosine(&eb)
    }

    /// `(score >= threshold, score)` using the configured threshold.
    pub fn is_similar(&self, a: &RgbImage, b: &RgbImage) -> CoreResult<(bool, f32)> {
        self.is_similar_with(a, b, self.threshold)
    }

    /// `(score >= threshold, score)` for an explicit threshold.
    pub fn is_similar_with(
        &self,
        a: &RgbImage,
        b: &RgbImage,
        threshold: f32,
    ) -> CoreResult<(bool, f32)> {
        let score = self.similarity(a, b)?;
        Ok((score >= threshold, score))
    }
}

/// Embedding cosine similarity of two pictures given in any supported form.
pub fn embedding_similarity<E: FrameEmbedder + ?Sized>(
    embedder: &E,
    a: impl Into<ImageInput>,
    b: impl Into<ImageInput>,
) -> CoreResult<f32> {
    let a = embedder.embed(&a.into().to_rgb()?)?;
    let b = embedder.embed(&b.into().to_rgb()?)?;
    a.cosine(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Embeds a frame as its mean color, offset so black is not a zero vector.
    struct MeanColor;

    impl FrameEmbedder for MeanColor {
        fn embed(&self, image: &RgbImage) -> CoreResult<Embedding> {
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

    fn solid(rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(4, 4, Rgb(rgb))
    }

    #[test]
    fn test_embedding_is_unit_length() {
        let e = Embedding::from_raw(vec![3.0, 4.0]).unwrap();
        assert_eq!(e.as_slice(), &[0.6, 0.8]);
        let norm: f32 = e.as_slice().iter().map(|v| v * v).sum();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stays_zero() {
        let e = Embedding::from_raw(vec![0.0; 4]).unwrap();
        let other = Embedding::from_raw(vec![1.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(e.cosine(&other).unwrap(), 0.0);
    }

    #[test]
    fn test_rejects_bad_vectors() {
        assert!(Embedding::from_raw(Vec::new()).is_err());
        assert!(Embedding::from_raw(vec![f32::NAN, 1.0]).is_err());
    }

    #[test]
    fn test_cosine_range_and_dimension_check() {
        let a = Embedding::from_raw(vec![1.0, 0.0]).unwrap();
        let b = Embedding::from_raw(vec![-1.0, 0.0]).unwrap();
        let score = a.cosine(&b).unwrap();
        assert!((-1.0..=1.0).contains(&score));
        assert_eq!(score, -1.0);

        let c = Embedding::from_raw(vec![1.0, 0.0, 0.0]).unwrap();
        assert!(matches!(a.cosine(&c), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_threshold_rule() {
        let estimator = ConfirmationEstimator::new(MeanColor);
        assert_eq!(estimator.threshold(), 0.92);

        let red = solid([255, 0, 0]);
        let (similar, score) = estimator.is_similar(&red, &red).unwrap();
        assert!(similar);
        assert!((score - 1.0).abs() < 1e-6);

        let blue = solid([0, 0, 255]);
        let (similar, score) = estimator.is_similar(&red, &blue).unwrap();
        assert!(!similar);
        assert!(score < 0.92);

        let (similar, _) = estimator.is_similar_with(&red, &blue, -1.0).unwrap();
        assert!(similar);
    }

    #[test]
    fn test_estimator_borrows_embedder() {
        let embedder = MeanColor;
        let estimator = ConfirmationEstimator::new(&embedder);
        let gray = solid([128, 128, 128]);
        assert!(estimator.is_similar(&gray, &gray).unwrap().0);
    }

    #[test]
    fn test_embedding_similarity_helper() {
        let score = embedding_similarity(
            &MeanColor,
            image::DynamicImage::ImageRgb8(solid([10, 200, 10])),
            image::DynamicImage::ImageRgb8(solid([10, 200, 10])),
        )
        .unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }
}
