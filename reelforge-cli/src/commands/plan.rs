//! Implementation of the 'plan' subcommand.
//!
//! Prints the exact ffmpeg command line of each scene-render stage. Scene
//! outputs are shown as workspace-relative names because no workspace exists
//! during a dry run.

use crate::cli::PlanArgs;
use crate::commands::load_request;
use crate::error::CliResult;

use reelforge_core::config::CoreConfigBuilder;
use reelforge_core::external::FfmpegCommandBuilder;
use reelforge_core::{CoreConfig, CoreError, CompositionRequest, plan_scene};
use std::path::PathBuf;

pub fn run_plan(args: &PlanArgs) -> CliResult<()> {
    let request = load_request(&args.request.request)?;
    let config = CoreConfigBuilder::new()
        .strict_effects(!args.lenient_effects)
        .build();

    for line in plan_lines(&request, &config, args.scene.as_deref())? {
        println!("{line}");
    }
    Ok(())
}

/// Builds the printed plan: a comment header and one command per scene.
pub fn plan_lines(
    request: &CompositionRequest,
    config: &CoreConfig,
    only_scene: Option<&str>,
) -> CliResult<Vec<String>> {
    request.validate(config.strict_effects)?;
    let (width, height) = request.dimensions()?;

    if let Some(id) = only_scene {
        if !request.scenes.iter().any(|s| s.scene_id == id) {
            return Err(CoreError::InvalidRequest(format!("no scene with id '{id}'")));
        }
    }

    let mut lines = Vec::new();
    for (index, scene) in request.scenes.iter().enumerate() {
        if only_scene.is_some_and(|id| id != scene.scene_id) {
            continue;
        }
        let plan = plan_scene(scene, width, height, request.frame_rate, config.strict_effects)?;
        let output = PathBuf::from(format!("scene_{index}.mp4"));
        let command = FfmpegCommandBuilder::new()
            .with_program(config.ffmpeg_path.as_deref())
            .args(plan.to_args(config, &output))
            .display_command();

        lines.push(format!(
            "# scene {} ('{}'): {}, {:.3}s, {} subtitle(s)",
            index,
            scene.scene_id,
            scene.visual.kind_name(),
            plan.duration_secs,
            plan.subtitle_count()
        ));
        lines.push(command);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_core::{SceneInput, SceneVisual};

    fn request() -> CompositionRequest {
        let scene = |id: &str| {
            SceneInput::new(
                id,
                1000,
                SceneVisual::SolidColor {
                    color: "#102030".to_string(),
                },
            )
        };
        CompositionRequest::new(
            vec![scene("a"), scene("b")],
            720,
            1280,
            PathBuf::from("/out/final.mp4"),
        )
    }

    #[test]
    fn test_plan_lines_cover_every_scene() {
        let lines = plan_lines(&request(), &CoreConfig::default(), None).unwrap();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("# scene 0 ('a')"));
        assert!(lines[1].starts_with("ffmpeg -hide_banner"));
        assert!(lines[1].ends_with("scene_0.mp4"));
        assert!(lines[3].ends_with("scene_1.mp4"));
    }

    #[test]
    fn test_plan_lines_single_scene() {
        let lines = plan_lines(&request(), &CoreConfig::default(), Some("b")).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("('b')"));
    }

    #[test]
    fn test_plan_lines_unknown_scene() {
        let err = plan_lines(&request(), &CoreConfig::default(), Some("zzz")).unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
    }
}
