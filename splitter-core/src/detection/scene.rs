//! Two-stage scene-change detection.
//!
//! Every consecutive frame pair is scored with the perceptual hash. Pairs
//! scoring below the fast threshold are candidates; a candidate becomes a cut
//! only if the embedding model also finds the two frames dissimilar. The
//! embedding stage therefore runs on a small fraction of the frames.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_CONFIRMATION_THRESHOLD, DEFAULT_PROGRESS_INTERVAL, DEFAULT_SIMILARITY_THRESHOLD,
    SplitterConfig,
};
use crate::error::CoreResult;
use crate::external::FrameSource;
use crate::progress_reporting::{ProgressCallback, report_frames};
use crate::similarity::{ConfirmationEstimator, FrameEmbedder, PerceptualHasher};

/// Counters collected during one detection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStats {
    /// Frames successfully decoded
    pub frames_read: u64,
    /// Pairs that fell below the fast threshold
    pub candidates: u64,
    /// Candidates the embedding stage confirmed as cuts
    pub confirmed: u64,
    /// Candidates the embedding stage rejected
    pub suppressed: u64,
}

/// Split points and counters from one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionOutcome {
    /// Strictly increasing indices of frames that start a new segment
    pub split_points: Vec<u64>,
    pub stats: DetectionStats,
}

/// Sequential scene-change detector.
///
/// Borrows the embedder; the caller owns the model and decides its lifetime.
pub struct SceneDetector<'a, E: ?Sized> {
    hasher: PerceptualHasher,
    confirmation: ConfirmationEstimator<&'a E>,
    similarity_threshold: f64,
    progress_interval: u64,
    progress_callback: Option<ProgressCallback>,
}

impl<'a, E: FrameEmbedder + ?Sized> SceneDetector<'a, E> {
    /// Detector with library defaults (0.70 fast, 0.92 confirmation).
    pub fn new(embedder: &'a E) -> Self {
        Self {
            hasher: PerceptualHasher::default(),
            confirmation: ConfirmationEstimator::with_threshold(
                embedder,
                DEFAULT_CONFIRMATION_THRESHOLD,
            ),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            progress_callback: None,
        }
    }

    /// Detector using the thresholds, interval and callback of `config`.
    pub fn from_config(config: &SplitterConfig, embedder: &'a E) -> Self {
        Self {
            hasher: PerceptualHasher::default(),
            confirmation: ConfirmationEstimator::with_threshold(
                embedder,
                config.confirmation_threshold,
            ),
            similarity_threshold: config.similarity_threshold,
            progress_interval: config.progress_interval.max(1),
            progress_callback: config.progress_callback.clone(),
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Reports progress every `interval` frames; 0 is treated as 1.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Reads `source` to the end and returns the confirmed cut indices.
    ///
    /// An empty source yields no split points. Embedding failures abort the
    /// pass.
    pub fn detect<S: FrameSource + ?Sized>(&self, source: &mut S) -> CoreResult<DetectionOutcome> {
        let total_frames = source.metadata().total_frames;
        let mut outcome = DetectionOutcome::default();

        let Some(first) = source.next_frame() else {
            info!("No frames decoded; nothing to split");
            return Ok(outcome);
        };
        outcome.stats.frames_read = 1;

        let mut previous_hash = self.hasher.fingerprint(first.image());
        let mut previous = first;
        let mut index: u64 = 1;

        while let Some(current) = source.next_frame() {
            outcome.stats.frames_read += 1;
            let current_hash = self.hasher.fingerprint(current.image());
            let fast_score = previous_hash.similarity(&current_hash)?;

            if fast_score < self.similarity_threshold {
                outcome.stats.candidates += 1;
                let (similar, embedding_score) = self
                    .confirmation
                    .is_similar(previous.image(), current.image())?;

                if similar {
                    outcome.stats.suppressed += 1;
                    debug!(
                        "Suppressed candidate at frame {index} (phash {fast_score:.3}, embedding {embedding_score:.3})"
                    );
                } else {
                    outcome.stats.confirmed += 1;
                    outcome.split_points.push(index);
                    debug!(
                        "Scene change at frame {index} (phash {fast_score:.3}, embedding {embedding_score:.3})"
                    );
                }
            }

            previous = current;
            previous_hash = current_hash;
            index += 1;

            if index % self.progress_interval == 0 {
                report_frames(self.progress_callback.as_ref(), index, total_frames);
            }
        }

        info!(
            "Detection finished: {} frames, {} candidates, {} cuts, {} suppressed",
            outcome.stats.frames_read,
            outcome.stats.candidates,
            outcome.stats.confirmed,
            outcome.stats.suppressed
        );

        Ok(outcome)
    }
}
