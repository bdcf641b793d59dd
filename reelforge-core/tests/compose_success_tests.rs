// reelforge-core/tests/compose_success_tests.rs

mod common;

use common::{EventRecorder, config_in, create_dummy_file, leftover_entries, solid_scene};
use reelforge_core::config::CoreConfigBuilder;
use reelforge_core::events::Event;
use reelforge_core::external::mocks::{MockFfmpegSpawner, MockFfprobeExecutor};
use reelforge_core::{
    ComposeState, Composer, CompositionRequest, KenBurnsEffect, KenBurnsKind, SceneInput,
    SceneVisual, SubtitleOverlay,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_two_scene_composition_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let assets = tempdir()?;
    let work = tempdir()?;
    let out_dir = tempdir()?;

    let image = create_dummy_file(assets.path(), "b.png");
    let subtitle = create_dummy_file(assets.path(), "b_sub0.png");
    let output_path = out_dir.path().join("final.mp4");

    let scene_a = solid_scene("a", 1000);
    let scene_b = SceneInput::new(
        "b",
        2000,
        SceneVisual::Image {
            file_path: image,
            ken_burns: Some(KenBurnsEffect::new(KenBurnsKind::ZoomIn)),
        },
    )
    .with_subtitle(SubtitleOverlay::new(&subtitle, 500, 1500));
    let request = CompositionRequest::new(vec![scene_a, scene_b], 1080, 1920, output_path.clone());

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("scene_0.mp4", vec![], true);
    spawner.add_success_expectation("scene_1.mp4", vec![], true);
    spawner.add_success_expectation("concatenated.mp4", vec![], true);

    let prober = MockFfprobeExecutor::new();
    prober.expect_duration(&output_path, 3.0);

    let recorder = Arc::new(EventRecorder::default());
    let composer = Composer::new(spawner.clone(), prober.clone(), config_in(work.path()))
        .with_event_handler(recorder.clone());

    let result = composer.compose(&request)?;

    // --- Result ---
    assert_eq!(result.output_path, output_path);
    assert!((result.duration_seconds - 3.0).abs() < 0.1);
    assert_eq!(result.file_size_bytes, b"mock media".len() as u64);
    assert!(output_path.exists());
    assert_eq!(prober.get_probed_paths(), vec![output_path.clone()]);

    // --- Stage invocations: two scene renders, one concat, no mix ---
    let calls = spawner.get_received_calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].last().unwrap().ends_with("scene_0.mp4"));
    assert!(calls[1].last().unwrap().ends_with("scene_1.mp4"));
    assert!(calls[2].windows(2).any(|w| w[0] == "-f" && w[1] == "concat"));
    assert!(!calls.iter().flatten().any(|arg| arg.contains("amix")));

    let scene_b_graph = calls[1]
        .windows(2)
        .find(|w| w[0] == "-filter_complex")
        .map(|w| w[1].clone())
        .unwrap();
    assert!(scene_b_graph.contains("zoompan"));
    assert!(scene_b_graph.contains("enable='between(t,0.5,1.5)'"));
    assert!(calls[0].iter().any(|arg| arg.starts_with("anullsrc=")));

    // --- Concat list follows request order ---
    let lists = spawner.get_concat_lists();
    assert_eq!(lists.len(), 1);
    let lines: Vec<&str> = lists[0].lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("file '") && lines[0].ends_with("scene_0.mp4'"));
    assert!(lines[1].ends_with("scene_1.mp4'"));

    // --- Workspace removed ---
    assert_eq!(leftover_entries(work.path()), 0);

    // --- Events ---
    assert_eq!(
        recorder.stages(),
        vec![
            ComposeState::Validating.to_string(),
            ComposeState::CheckingFiles.to_string(),
            ComposeState::RenderingScenes.to_string(),
            ComposeState::Concatenating.to_string(),
            ComposeState::Finalizing.to_string(),
            ComposeState::Done.to_string(),
        ]
    );
    assert!(recorder.failures().is_empty());
    assert!(matches!(
        recorder.events().last(),
        Some(Event::ComposeComplete { file_size_bytes: 10, .. })
    ));

    Ok(())
}

#[test]
fn test_single_scene_skips_concat_process() -> Result<(), Box<dyn std::error::Error>> {
    let work = tempdir()?;
    let out_dir = tempdir()?;
    let output_path = out_dir.path().join("nested").join("single.mp4");

    let request = CompositionRequest::new(vec![solid_scene("only", 1500)], 720, 1280, output_path.clone());

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("scene_0.mp4", vec![], true);

    let composer = Composer::new(
        spawner.clone(),
        MockFfprobeExecutor::with_default_duration(1.5),
        config_in(work.path()),
    );
    let result = composer.compose(&request)?;

    let calls = spawner.get_received_calls();
    assert_eq!(calls.len(), 1, "only the scene render may spawn ffmpeg");
    assert!(spawner.get_concat_lists().is_empty());
    assert!(output_path.exists());
    assert_eq!(result.duration_seconds, 1.5);
    assert_eq!(leftover_entries(work.path()), 0);

    Ok(())
}

#[test]
fn test_background_music_is_mixed() -> Result<(), Box<dyn std::error::Error>> {
    let assets = tempdir()?;
    let work = tempdir()?;
    let out_dir = tempdir()?;

    let voice = create_dummy_file(assets.path(), "voice.mp3");
    let bgm = create_dummy_file(assets.path(), "bgm.mp3");
    let output_path = out_dir.path().join("with_music.mp4");

    let mut request = CompositionRequest::new(
        vec![solid_scene("a", 1000).with_audio(&voice), solid_scene("b", 1000)],
        1080,
        1920,
        output_path.clone(),
    );
    request.bgm_path = Some(bgm.clone());
    request.bgm_volume = 0.25;

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("scene_0.mp4", vec![], true);
    spawner.add_success_expectation("scene_1.mp4", vec![], true);
    spawner.add_success_expectation("-safe", vec![], true);
    spawner.add_success_expectation("with_bgm.mp4", vec![], true);

    let recorder = Arc::new(EventRecorder::default());
    let composer = Composer::new(
        spawner.clone(),
        MockFfprobeExecutor::with_default_duration(2.0),
        config_in(work.path()),
    )
    .with_event_handler(recorder.clone());
    composer.compose(&request)?;

    let calls = spawner.get_received_calls();
    assert_eq!(calls.len(), 4);
    let mix = &calls[3];
    assert!(mix.last().unwrap().ends_with("with_bgm.mp4"));
    assert!(mix.iter().any(|a| a == &bgm.to_string_lossy()));
    let graph = mix
        .windows(2)
        .find(|w| w[0] == "-filter_complex")
        .map(|w| w[1].clone())
        .unwrap();
    assert!(graph.contains("[1:a]volume=0.25[bgm]"));
    assert!(graph.contains("duration=first"));
    assert!(calls[0].iter().any(|a| a == &voice.to_string_lossy()));

    assert!(recorder.stages().contains(&ComposeState::MixingAudio.to_string()));
    assert_eq!(spawner.remaining_expectations(), 0);
    assert_eq!(leftover_entries(work.path()), 0);

    Ok(())
}

#[test]
fn test_parallel_rendering_preserves_scene_order() -> Result<(), Box<dyn std::error::Error>> {
    let work = tempdir()?;
    let out_dir = tempdir()?;
    let output_path = out_dir.path().join("parallel.mp4");

    let scenes = (0..3).map(|i| solid_scene(&format!("s{i}"), 1000)).collect();
    let request = CompositionRequest::new(scenes, 720, 1280, output_path);

    // Scene 0 finishes last, scene 2 first.
    let spawner = MockFfmpegSpawner::new();
    spawner.add_delayed_success_expectation("scene_0.mp4", Duration::from_millis(300));
    spawner.add_delayed_success_expectation("scene_1.mp4", Duration::from_millis(150));
    spawner.add_success_expectation("scene_2.mp4", vec![], true);
    spawner.add_success_expectation("concatenated.mp4", vec![], true);

    let config = CoreConfigBuilder::new()
        .temp_dir(work.path().to_path_buf())
        .parallel_jobs(3)
        .build();
    let recorder = Arc::new(EventRecorder::default());
    let composer = Composer::new(
        spawner.clone(),
        MockFfprobeExecutor::with_default_duration(3.0),
        config,
    )
    .with_event_handler(recorder.clone());
    composer.compose(&request)?;

    let lists = spawner.get_concat_lists();
    assert_eq!(lists.len(), 1);
    let order: Vec<PathBuf> = lists[0]
        .lines()
        .map(|l| PathBuf::from(l.trim_start_matches("file '").trim_end_matches('\'')))
        .collect();
    let names: Vec<String> = order
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["scene_0.mp4", "scene_1.mp4", "scene_2.mp4"]);

    let mut completed: Vec<usize> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::SceneRendered { completed, total, .. } => {
                assert_eq!(total, 3);
                Some(completed)
            }
            _ => None,
        })
        .collect();
    completed.sort_unstable();
    assert_eq!(completed, vec![1, 2, 3]);

    Ok(())
}
