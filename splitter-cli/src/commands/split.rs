// ============================================================================
// splitter-cli/src/commands/split.rs
// ============================================================================
//
// SPLIT COMMAND: scene detection and segment writing
//
// Order of work: the configuration is validated first (bad thresholds or a
// missing video fail before anything expensive happens), then the embedding
// model is loaded, then the video is analyzed and optionally split. The model
// is owned here and released when the command returns.
//
// AI-ASSISTANT-INFO: Split command implementation

use std::time::Instant;

use log::{debug, info};
use splitter_core::{
    AnalysisResult, CoreError, OnnxEmbedder, SplitterConfig, SplitterConfigBuilder, VideoSplitter,
    format_duration, progress_reporting,
};

use crate::cli::SplitArgs;
use crate::error::{CliErrorContext, CliResult};

/// Builds and validates the core configuration from the arguments.
pub fn build_config(args: &SplitArgs) -> CliResult<SplitterConfig> {
    let mut builder = SplitterConfigBuilder::new()
        .video_path(&args.video_path)
        .similarity_threshold(args.threshold)
        .confirmation_threshold(args.confirm_threshold)
        .min_segment_frames(args.min_frames)
        .embedding_dim(args.embedding_dim);

    if let Some(dir) = &args.output {
        builder = builder.output_dir(dir);
    }
    if let Some(model) = &args.model {
        builder = builder.model_path(model);
    }

    builder.build()
}

/// Runs the split command and returns the analysis.
pub fn run_split(args: &SplitArgs) -> CliResult<AnalysisResult> {
    let started = Instant::now();
    let config = build_config(args)?;
    debug!("Split configuration: {config:?}");

    if args.model.is_none() {
        return Err(CoreError::ModelInit(
            "no embedding model given; pass --model or set VIDEO_SPLITTER_MODEL".to_string(),
        ));
    }

    progress_reporting::section("Model");
    progress_reporting::processing(&format!(
        "Loading {}",
        config.model.model_path.display()
    ));
    let embedder = OnnxEmbedder::load(&config.model)?;
    progress_reporting::success("Model ready");

    let splitter = VideoSplitter::new(config, &embedder)?;
    let result = if args.analyze_only {
        splitter.analyze()?
    } else {
        splitter.process()?
    };
    drop(splitter);
    drop(embedder);

    info!(
        "Split {} into {} segments in {}",
        result.video_path.display(),
        result.segment_count(),
        format_duration(started.elapsed().as_secs_f64())
    );
    Ok(result)
}

/// Serializes the analysis for `--json`.
pub fn result_json(result: &AnalysisResult) -> CliResult<String> {
    serde_json::to_string_pretty(result).cli_context("Failed to serialize analysis result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs::File;

    fn split_args(extra: &[&str], video: &std::path::Path) -> SplitArgs {
        let mut argv = vec!["video-splitter", "split"];
        let video = video.to_string_lossy().into_owned();
        argv.push(&video);
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Split(args) => args,
        }
    }

    #[test]
    fn test_arguments_flow_into_config() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("input.mp4");
        File::create(&video).unwrap();

        let args = split_args(
            &[
                "-t",
                "0.75",
                "-m",
                "12",
                "-o",
                "segments",
                "--confirm-threshold",
                "0.5",
                "--embedding-dim",
                "768",
            ],
            &video,
        );
        let config = build_config(&args).unwrap();

        assert_eq!(config.similarity_threshold, 0.75);
        assert_eq!(config.confirmation_threshold, 0.5);
        assert_eq!(config.min_segment_frames, 12);
        assert_eq!(config.model.embedding_dim, 768);
        assert_eq!(config.output_dir.as_deref(), Some(std::path::Path::new("segments")));
    }

    #[test]
    fn test_cli_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("input.mp4");
        File::create(&video).unwrap();

        let config = build_config(&split_args(&[], &video)).unwrap();
        assert_eq!(config.similarity_threshold, 0.80);
        assert_eq!(config.confirmation_threshold, 0.92);
        assert_eq!(config.min_segment_frames, 0);
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_validation_precedes_model_loading() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("input.mp4");
        File::create(&video).unwrap();

        let args = split_args(&["-t", "1.5", "--model", "/no/such/model.onnx"], &video);
        assert!(matches!(run_split(&args), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_missing_model_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("input.mp4");
        File::create(&video).unwrap();

        let args = split_args(&["--model", "/no/such/model.onnx"], &video);
        assert!(matches!(run_split(&args), Err(CoreError::ModelInit(_))));
    }
}
