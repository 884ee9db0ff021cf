//! ONNX vision-model embedder backed by tract.
//!
//! Expects a ViT-style model taking a `[1, 3, S, S]` float tensor and
//! returning either `last_hidden_state` (`[1, tokens, D]`, the CLS token is
//! used) or a pooled `[1, D]` vector. `D` must match
//! [`ModelConfig::embedding_dim`]: 1024 for DINOv2-large, 768 for
//! DINOv2-base. Loading runs one inference on a blank frame, so a model of
//! the wrong width is rejected before any video is decoded.

use image::RgbImage;
use image::imageops::{self, FilterType};
use log::{debug, info};
use tract_onnx::prelude::*;

use super::embedding::{Embedding, FrameEmbedder};
use crate::config::ModelConfig;
use crate::error::{CoreError, CoreResult, inference_error, model_init_error};

type Runnable = TypedRunnableModel<TypedModel>;

/// Embedder running an ONNX model on the CPU.
///
/// Load once per run and pass it by reference to everything that needs it.
pub struct OnnxEmbedder {
    model: Runnable,
    config: ModelConfig,
}

impl std::fmt::Debug for OnnxEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbedder")
            .field("model_path", &self.config.model_path)
            .field("input_size", &self.config.input_size)
            .field("embedding_dim", &self.config.embedding_dim)
            .finish()
    }
}

impl OnnxEmbedder {
    /// Loads and optimizes the model described by `config`.
    ///
    /// # Errors
    ///
    /// `CoreError::ModelInit` if the file is missing, tract cannot load,
    /// type or optimize it, or its output does not have the configured
    /// embedding width.
    pub fn load(config: &ModelConfig) -> CoreResult<Self> {
        config.validate()?;
        let path = &config.model_path;
        if !path.is_file() {
            return Err(CoreError::ModelInit(format!(
                "model file not found: {}",
                path.display()
            )));
        }

        info!("Loading embedding model from {}", path.display());
        let size = config.input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, 3, size, size]).into()))
            .and_then(|model| model.into_typed())
            .map_err(|err| {
                log::error!("Failed to load model {}: {err:#}", path.display());
                model_init_error(err)
            })?;

        Self::from_typed(model, config)
    }

    /// Optimizes an already typed model and checks it against `config`.
    pub fn from_typed(model: TypedModel, config: &ModelConfig) -> CoreResult<Self> {
        config.validate()?;
        let model = model
            .into_optimized()
            .and_then(|model| model.into_runnable())
            .map_err(model_init_error)?;

        let embedder = Self {
            model,
            config: config.clone(),
        };
        embedder.verify()?;
        debug!(
            "Embedding model ready ({0}x{0} input, {1}-dimensional output)",
            config.input_size, config.embedding_dim
        );
        Ok(embedder)
    }

    /// Runs one blank frame through the model so shape problems surface now
    /// instead of at the first candidate cut.
    fn verify(&self) -> CoreResult<()> {
        let side = self.config.input_size;
        match self.embed(&RgbImage::new(side, side)) {
            Ok(_) => Ok(()),
            Err(CoreError::Inference(reason)) => {
                log::error!("Embedding model rejected: {reason}");
                Err(CoreError::ModelInit(reason))
            }
            Err(other) => Err(other),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl FrameEmbedder for OnnxEmbedder {
    fn embed(&self, image: &RgbImage) -> CoreResult<Embedding> {
        let input: Tensor = preprocess(image, &self.config).into();
        let outputs = self.model.run(tvec!(input.into())).map_err(inference_error)?;
        let output = outputs
            .first()
            .ok_or_else(|| CoreError::Inference("model produced no outputs".to_string()))?;
        let view = output.to_array_view::<f32>().map_err(inference_error)?;
        let values = pooled_output(view, self.config.embedding_dim)?;

        Embedding::from_raw(values)
    }
}

/// Picks the embedding out of the first model output: the CLS token of a
/// `[1, tokens, D]` tensor or the row of a `[1, D]` tensor.
fn pooled_output(view: tract_ndarray::ArrayViewD<'_, f32>, expected_dim: usize) -> CoreResult<Vec<f32>> {
    let values: Vec<f32> = match view.ndim() {
        3 => view
            .index_axis(tract_ndarray::Axis(0), 0)
            .index_axis(tract_ndarray::Axis(0), 0)
            .iter()
            .copied()
            .collect(),
        2 => view
            .index_axis(tract_ndarray::Axis(0), 0)
            .iter()
            .copied()
            .collect(),
        _ => {
            return Err(CoreError::Inference(format!(
                "unexpected output shape {:?}",
                view.shape()
            )));
        }
    };

    if values.len() != expected_dim {
        return Err(CoreError::Inference(format!(
            "model produces {}-dimensional embeddings, configured for {}",
            values.len(),
            expected_dim
        )));
    }
    Ok(values)
}

/// Resizes the shortest edge, center-crops and normalizes into NCHW.
pub(crate) fn preprocess(image: &RgbImage, config: &ModelConfig) -> tract_ndarray::Array4<f32> {
    let (width, height) = image.dimensions();
    let edge = config.resize_shortest_edge;
    let (resized_w, resized_h) = if width <= height {
        (edge, scale_edge(height, edge, width))
    } else {
        (scale_edge(width, edge, height), edge)
    };
    let resized = imageops::resize(image, resized_w, resized_h, FilterType::CatmullRom);

    let crop = config.input_size;
    let left = (resized_w.saturating_sub(crop) as f32 / 2.0).round() as u32;
    let top = (resized_h.saturating_sub(crop) as f32 / 2.0).round() as u32;
    let cropped = imageops::crop_imm(&resized, left, top, crop, crop).to_image();

    let side = crop as usize;
    tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        let value = f32::from(cropped.get_pixel(x as u32, y as u32)[c]) / 255.0;
        (value - config.mean[c]) / config.std[c]
    })
}

/// Scales `long` by `edge / short`, never below `edge`.
fn scale_edge(long: u32, edge: u32, short: u32) -> u32 {
    let scaled = (u64::from(long) * u64::from(edge)) / u64::from(short.max(1));
    (scaled as u32).max(edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tract_onnx::tract_core::ops::change_axes::AxisOp;
    use tract_onnx::tract_core::ops::nn::{Reduce, Reducer};

    /// Small config so the test graphs stay cheap.
    fn small_config(embedding_dim: usize) -> ModelConfig {
        ModelConfig {
            input_size: 8,
            resize_shortest_edge: 8,
            embedding_dim,
            ..ModelConfig::default()
        }
    }

    /// `[1, 3, S, S]` -> `[1, 3]`: per-channel sums, a pooled output.
    fn channel_sum_model(side: usize) -> TypedModel {
        let mut model = TypedModel::default();
        let input = model
            .add_source("pixel_values", f32::fact([1, 3, side, side]))
            .unwrap();
        let summed = model
            .wire_node(
                "pool",
                Reduce {
                    axes: tvec!(2, 3),
                    reducer: Reducer::Sum,
                },
                &[input],
            )
            .unwrap();
        let squeezed = model.wire_node("squeeze_w", AxisOp::Rm(3), &summed).unwrap();
        let pooled = model.wire_node("squeeze_h", AxisOp::Rm(2), &squeezed).unwrap();
        model.set_output_outlets(&pooled).unwrap();
        model
    }

    #[test]
    fn test_missing_model_is_init_error() {
        let config = ModelConfig::new("/no/such/model.onnx");
        let err = OnnxEmbedder::load(&config).unwrap_err();
        assert!(matches!(err, CoreError::ModelInit(_)));
    }

    #[test]
    fn test_garbage_model_is_init_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"definitely not protobuf").unwrap();
        let err = OnnxEmbedder::load(&ModelConfig::new(&path)).unwrap_err();
        assert!(matches!(err, CoreError::ModelInit(_)));
    }

    #[test]
    fn test_output_width_mismatch_fails_at_load() {
        let err = OnnxEmbedder::from_typed(channel_sum_model(8), &small_config(768)).unwrap_err();
        match err {
            CoreError::ModelInit(reason) => assert!(reason.contains("3-dimensional"), "{reason}"),
            other => panic!("expected ModelInit, got {other:?}"),
        }
    }

    #[test]
    fn test_matching_model_embeds_frames() {
        let embedder = OnnxEmbedder::from_typed(channel_sum_model(8), &small_config(3)).unwrap();
        let red = RgbImage::from_pixel(16, 12, Rgb([255, 0, 0]));
        let blue = RgbImage::from_pixel(16, 12, Rgb([0, 0, 255]));

        let a = embedder.embed(&red).unwrap();
        assert_eq!(a.dim(), 3);
        assert!((a.cosine(&embedder.embed(&red).unwrap()).unwrap() - 1.0).abs() < 1e-5);
        assert!(a.cosine(&embedder.embed(&blue).unwrap()).unwrap() < 0.92);
    }

    #[test]
    fn test_pooled_output_takes_cls_token() {
        let tokens = tract_ndarray::Array3::from_shape_fn((1, 4, 2), |(_, t, d)| (t * 10 + d) as f32);
        assert_eq!(pooled_output(tokens.view().into_dyn(), 2).unwrap(), vec![0.0, 1.0]);

        let pooled = tract_ndarray::arr2(&[[0.5f32, 0.25, 0.125]]);
        assert_eq!(pooled_output(pooled.view().into_dyn(), 3).unwrap().len(), 3);
    }

    #[test]
    fn test_pooled_output_rejects_bad_shapes() {
        let pooled = tract_ndarray::arr2(&[[0.5f32, 0.25, 0.125]]);
        assert!(matches!(
            pooled_output(pooled.view().into_dyn(), 1024),
            Err(CoreError::Inference(_))
        ));

        let image = tract_ndarray::Array4::<f32>::zeros((1, 3, 2, 2));
        assert!(matches!(
            pooled_output(image.view().into_dyn(), 12),
            Err(CoreError::Inference(_))
        ));
    }

    #[test]
    fn test_preprocess_shape_and_normalization() {
        let config = ModelConfig::default();
        let image = RgbImage::from_pixel(320, 240, Rgb([255, 255, 255]));
        let tensor = preprocess(&image, &config);
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);

        let expected = (1.0 - config.mean[0]) / config.std[0];
        assert!((tensor[[0, 0, 112, 112]] - expected).abs() < 1e-4);
    }

    #[test]
    fn test_shortest_edge_scaling() {
        assert_eq!(scale_edge(640, 256, 480), 341);
        assert_eq!(scale_edge(100, 256, 100), 256);
    }
}
