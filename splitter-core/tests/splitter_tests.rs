mod common;

use std::sync::{Arc, Mutex};

use common::{BLUE, Fixture, GRAY, MeanColor, RED, blocks, shot};
use splitter_core::*;

fn config_for(fixture: &Fixture) -> SplitterConfigBuilder {
    SplitterConfigBuilder::new()
        .video_path(&fixture.video_path)
        .output_dir(fixture.output_dir())
}

fn analyze(fixture: &Fixture, builder: SplitterConfigBuilder) -> AnalysisResult {
    let embedder = MeanColor::default();
    let splitter =
        VideoSplitter::with_backend(builder.build().unwrap(), &embedder, fixture.backend.clone())
            .unwrap();
    splitter.analyze().unwrap()
}

#[test]
fn test_single_confirmed_cut_in_two_frame_video() {
    let fixture = Fixture::new(vec![blocks(1, GRAY), blocks(2, BLUE)]);
    let result = analyze(&fixture, config_for(&fixture));

    assert_eq!(result.split_points, vec![1]);
    assert_eq!(result.segment_count(), 2);
    assert_eq!(
        (result.segments[0].start_frame, result.segments[0].end_frame),
        (0, 1)
    );
    assert_eq!(
        (result.segments[1].start_frame, result.segments[1].end_frame),
        (1, 2)
    );
}

#[test]
fn test_false_positive_is_suppressed() {
    // Every frame pair differs structurally but the colors match, so the
    // embedding stage vetoes each candidate.
    let frames = (1..=4).map(|seed| blocks(seed, GRAY)).collect();
    let fixture = Fixture::new(frames);
    let result = analyze(&fixture, config_for(&fixture));

    assert!(result.split_points.is_empty());
    assert_eq!(result.segment_count(), 1);
    assert_eq!(result.stats.candidates, 3);
    assert_eq!(result.stats.suppressed, 3);
}

#[test]
fn test_embedding_stage_only_runs_on_candidates() {
    let mut frames = shot(1, GRAY, 20);
    frames.extend(shot(2, RED, 20));
    let fixture = Fixture::new(frames);

    let embedder = MeanColor::default();
    let config = config_for(&fixture).build().unwrap();
    let splitter = VideoSplitter::with_backend(config, &embedder, fixture.backend.clone()).unwrap();
    let result = splitter.analyze().unwrap();

    assert_eq!(result.split_points, vec![20]);
    // One candidate, two frames embedded.
    assert_eq!(embedder.calls.get(), 2);
}

#[test]
fn test_segments_partition_multi_scene_video() {
    let mut frames = shot(1, GRAY, 7);
    frames.extend(shot(2, RED, 5));
    frames.extend(shot(3, BLUE, 9));
    let fixture = Fixture::new(frames);
    let result = analyze(&fixture, config_for(&fixture));

    assert_eq!(result.total_frames, 21);
    assert_eq!(result.split_points, vec![7, 12]);
    assert!(result.split_points.windows(2).all(|w| w[0] < w[1]));
    assert!(result
        .split_points
        .iter()
        .all(|p| *p > 0 && *p < result.total_frames));

    assert_eq!(result.segments.first().unwrap().start_frame, 0);
    assert_eq!(result.segments.last().unwrap().end_frame, 21);
    for pair in result.segments.windows(2) {
        assert_eq!(pair[0].end_frame, pair[1].start_frame);
    }
    let covered: u64 = result.segments.iter().map(|s| s.frame_count).sum();
    assert_eq!(covered, result.total_frames);
}

#[test]
fn test_empty_video_has_no_segments() {
    let fixture = Fixture::new(Vec::new());
    let result = analyze(&fixture, config_for(&fixture));

    assert_eq!(result.total_frames, 0);
    assert!(result.split_points.is_empty());
    assert_eq!(result.segment_count(), 0);
}

#[test]
fn test_analysis_is_deterministic() {
    let mut frames = shot(4, GRAY, 6);
    frames.extend(shot(5, BLUE, 6));
    frames.extend((6..10).map(|seed| blocks(seed, BLUE)));
    let fixture = Fixture::new(frames);

    let first = analyze(&fixture, config_for(&fixture));
    let second = analyze(&fixture, config_for(&fixture));
    assert_eq!(first, second);
}

#[test]
fn test_invalid_thresholds_fail_before_reading() {
    let fixture = Fixture::new(vec![blocks(1, GRAY)]);

    for builder in [
        config_for(&fixture).similarity_threshold(1.5),
        config_for(&fixture).similarity_threshold(-1.0),
        config_for(&fixture).min_segment_frames(-1),
    ] {
        let result = builder.build();
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    let mut config = SplitterConfig::new(&fixture.video_path);
    config.similarity_threshold = 1.5;
    let embedder = MeanColor::default();
    let result = VideoSplitter::with_backend(config, &embedder, fixture.backend.clone());
    assert!(matches!(result, Err(CoreError::Validation(_))));
    assert_eq!(fixture.backend.sources_opened(), 0);
}

#[test]
fn test_missing_video_is_not_found() {
    let embedder = MeanColor::default();
    let config = SplitterConfig::new("/definitely/missing/video.mp4");
    let result = VideoSplitter::with_backend(config, &embedder, MemoryBackend::new());
    assert!(matches!(result, Err(CoreError::NotFound(_))));
}

#[test]
fn test_min_segment_frames_is_carried_not_applied() {
    let mut frames = shot(1, GRAY, 2);
    frames.extend(shot(2, BLUE, 10));
    let fixture = Fixture::new(frames);
    let result = analyze(&fixture, config_for(&fixture).min_segment_frames(5));

    assert_eq!(result.min_segment_frames, 5);
    assert_eq!(result.split_points, vec![2]);
    assert_eq!(result.segments[0].frame_count, 2);
}

#[test]
fn test_progress_reported_every_interval() {
    let fixture = Fixture::new(shot(1, GRAY, 10));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    analyze(
        &fixture,
        config_for(&fixture)
            .progress_interval(3)
            .on_progress(move |done, total| sink.lock().unwrap().push((done, total))),
    );

    assert_eq!(*seen.lock().unwrap(), vec![(3, 10), (6, 10), (9, 10)]);
}

#[test]
fn test_decoded_count_wins_over_container_count() {
    let fixture = Fixture::with_video(|video| video.with_reported_frames(50), shot(1, GRAY, 8));
    let result = analyze(&fixture, config_for(&fixture));

    assert_eq!(result.total_frames, 8);
    assert_eq!(result.segments.last().unwrap().end_frame, 8);
}

#[test]
fn test_read_failure_ends_stream() {
    let mut frames = shot(1, GRAY, 5);
    frames.extend(shot(2, BLUE, 5));
    let fixture = Fixture::with_video(|video| video.with_read_failure_after(4), frames);
    let result = analyze(&fixture, config_for(&fixture));

    assert!(result.split_points.is_empty());
    assert_eq!(result.total_frames, 4);
    assert_eq!(result.stats.frames_read, 4);
}

#[test]
fn test_analyze_writes_nothing() {
    let mut frames = shot(1, GRAY, 3);
    frames.extend(shot(2, BLUE, 3));
    let fixture = Fixture::new(frames);
    let result = analyze(&fixture, config_for(&fixture));

    assert!(result.output_paths().is_empty());
    assert!(fixture.backend.segment_paths().is_empty());
    assert!(!fixture.output_dir().exists());
}

#[test]
fn test_process_writes_one_file_per_segment() {
    let mut frames = shot(1, GRAY, 4);
    frames.extend(shot(2, RED, 3));
    let fixture = Fixture::new(frames);

    let embedder = MeanColor::default();
    let config = config_for(&fixture).build().unwrap();
    let splitter = VideoSplitter::with_backend(config, &embedder, fixture.backend.clone()).unwrap();
    let result = splitter.process().unwrap();

    let output_dir = fixture.output_dir();
    assert!(output_dir.is_dir());
    assert_eq!(result.output_dir.as_deref(), Some(output_dir.as_path()));
    assert_eq!(
        result.output_paths(),
        vec![
            output_dir.join("segment_000.mp4"),
            output_dir.join("segment_001.mp4")
        ]
    );

    let second = fixture
        .backend
        .segment_frames(&output_dir.join("segment_001.mp4"))
        .unwrap();
    assert_eq!(second.iter().map(|f| f.index).collect::<Vec<_>>(), vec![4, 5, 6]);
}

#[test]
fn test_materialize_without_output_dir_uses_timestamped_dir() {
    let fixture = Fixture::new(shot(1, GRAY, 3));
    let embedder = MeanColor::default();
    let config = SplitterConfigBuilder::new()
        .video_path(&fixture.video_path)
        .build()
        .unwrap();
    let splitter = VideoSplitter::with_backend(config, &embedder, fixture.backend.clone()).unwrap();

    let mut result = splitter.analyze().unwrap();
    assert!(result.output_dir.is_none());
    let paths = splitter.materialize(&mut result).unwrap();

    let dir = result.output_dir.clone().unwrap();
    assert!(
        dir.file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("video_segments_")
    );
    assert_eq!(paths, vec![dir.join("segment_000.mp4")]);
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_custom_extension_names_segments() {
    let fixture = Fixture::new(shot(1, GRAY, 2));
    let embedder = MeanColor::default();
    let config = config_for(&fixture)
        .output_extension("mkv")
        .output_codec("libx264")
        .build()
        .unwrap();
    let splitter = VideoSplitter::with_backend(config, &embedder, fixture.backend.clone()).unwrap();
    let result = splitter.process().unwrap();

    assert_eq!(
        result.output_paths(),
        vec![fixture.output_dir().join("segment_000.mkv")]
    );
}
