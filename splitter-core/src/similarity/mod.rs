//! Frame similarity estimators.
//!
//! - [`phash`]: the fast DCT perceptual hash used on every frame pair
//! - [`embedding`]: unit-vector embeddings and the confirmation rule
//! - [`onnx`]: the tract-backed ONNX embedder used in production

pub mod embedding;
pub mod onnx;
pub mod phash;

pub use embedding::{ConfirmationEstimator, Embedding, FrameEmbedder, embedding_similarity};
pub use onnx::OnnxEmbedder;
pub use phash::{Fingerprint, PerceptualHasher, phash_similarity};
