use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::json;
use std::error::Error;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn reelforge_cmd() -> Command {
    Command::cargo_bin("reelforge").expect("Failed to find reelforge binary")
}

fn write_request(dir: &Path, request: &serde_json::Value) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join("request.json");
    std::fs::write(&path, serde_json::to_string_pretty(request)?)?;
    Ok(path)
}

/// Two scenes: a solid color and a zooming still with one subtitle.
fn sample_request(dir: &Path, image: &Path, subtitle: &Path) -> serde_json::Value {
    json!({
        "scenes": [
            {
                "sceneId": "intro",
                "durationMs": 1000,
                "visual": { "type": "solid_color", "color": "#1E1E2E" }
            },
            {
                "sceneId": "body",
                "durationMs": 2000,
                "visual": {
                    "type": "image",
                    "filePath": image,
                    "kenBurns": { "type": "zoom_in" }
                },
                "subtitles": [
                    { "imagePath": subtitle, "startMs": 500, "endMs": 1500 }
                ]
            }
        ],
        "width": 1080,
        "height": 1920,
        "outputPath": dir.join("final.mp4")
    })
}

#[test]
fn test_validate_accepts_complete_request() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let image = dir.path().join("body.png");
    let subtitle = dir.path().join("body_sub0.png");
    std::fs::write(&image, "dummy content")?;
    std::fs::write(&subtitle, "dummy content")?;
    let request = write_request(dir.path(), &sample_request(dir.path(), &image, &subtitle))?;

    reelforge_cmd()
        .arg("validate")
        .arg("--request")
        .arg(&request)
        .assert()
        .success()
        .stdout(contains("1080x1920"))
        .stdout(contains("Request is valid"));

    Ok(())
}

#[test]
fn test_validate_reports_missing_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let image = dir.path().join("body.png");
    let subtitle = dir.path().join("missing_sub.png");
    std::fs::write(&image, "dummy content")?;
    let request = write_request(dir.path(), &sample_request(dir.path(), &image, &subtitle))?;

    reelforge_cmd()
        .arg("validate")
        .arg("-r")
        .arg(&request)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("error[FILE_NOT_FOUND]"))
        .stderr(contains("missing_sub.png"));

    Ok(())
}

#[test]
fn test_validate_rejects_empty_scene_list() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let request = write_request(
        dir.path(),
        &json!({ "scenes": [], "width": 1080, "height": 1920, "outputPath": "out.mp4" }),
    )?;

    reelforge_cmd()
        .args(["validate", "--request"])
        .arg(&request)
        .assert()
        .failure()
        .stderr(contains("error[INVALID_SCENES]"));

    Ok(())
}

#[test]
fn test_malformed_request_json() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("request.json");
    std::fs::write(&path, "{ \"scenes\": [")?;

    reelforge_cmd()
        .args(["validate", "--request"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("error[INVALID_REQUEST]"));

    Ok(())
}

#[test]
fn test_plan_prints_scene_commands_without_files() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    // Assets are never opened by a dry run.
    let request = write_request(
        dir.path(),
        &sample_request(
            dir.path(),
            &dir.path().join("absent.png"),
            &dir.path().join("absent_sub.png"),
        ),
    )?;

    reelforge_cmd()
        .args(["plan", "--request"])
        .arg(&request)
        .assert()
        .success()
        .stdout(contains("# scene 0 ('intro')"))
        .stdout(contains("# scene 1 ('body')"))
        .stdout(contains("-filter_complex"))
        .stdout(contains("zoompan"))
        .stdout(contains("between(t,0.5,1.5)"))
        .stdout(contains("anullsrc"));

    assert!(!dir.path().join("final.mp4").exists());
    Ok(())
}

#[test]
fn test_plan_single_scene_filter() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let request = write_request(
        dir.path(),
        &sample_request(dir.path(), Path::new("a.png"), Path::new("b.png")),
    )?;

    reelforge_cmd()
        .args(["plan", "--scene", "intro", "--request"])
        .arg(&request)
        .assert()
        .success()
        .stdout(contains("('intro')"))
        .stdout(contains("('body')").not());

    reelforge_cmd()
        .args(["plan", "--scene", "outro", "--request"])
        .arg(&request)
        .assert()
        .failure()
        .stderr(contains("no scene with id 'outro'"));

    Ok(())
}

#[test]
fn test_plan_unknown_effect_strict_and_lenient() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let request = write_request(
        dir.path(),
        &json!({
            "scenes": [{
                "sceneId": "spin",
                "durationMs": 1000,
                "visual": {
                    "type": "image",
                    "filePath": "still.png",
                    "kenBurns": { "type": "spiral" }
                }
            }],
            "width": 720,
            "height": 1280,
            "outputPath": "out.mp4"
        }),
    )?;

    reelforge_cmd()
        .args(["plan", "--request"])
        .arg(&request)
        .assert()
        .failure()
        .stderr(contains("error[INVALID_SCENES]"))
        .stderr(contains("spin"));

    reelforge_cmd()
        .args(["plan", "--lenient-effects", "--request"])
        .arg(&request)
        .assert()
        .success()
        .stdout(contains("crop="));

    Ok(())
}

#[test]
fn test_compose_fails_before_rendering_on_missing_audio() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let work = dir.path().join("work");
    let request = write_request(
        dir.path(),
        &json!({
            "scenes": [{
                "sceneId": "intro",
                "durationMs": 1000,
                "visual": { "type": "solid_color", "color": "000000" },
                "audioPath": dir.path().join("narration.mp3")
            }],
            "width": 1080,
            "height": 1920,
            "outputPath": dir.path().join("final.mp4")
        }),
    )?;

    reelforge_cmd()
        .args(["compose", "--request"])
        .arg(&request)
        .arg("--temp-dir")
        .arg(&work)
        .assert()
        .failure()
        .stderr(contains("error[FILE_NOT_FOUND]"))
        .stderr(contains("narration.mp3"));

    assert!(!work.exists());
    assert!(!dir.path().join("final.mp4").exists());
    Ok(())
}

#[test]
fn test_missing_request_argument() {
    reelforge_cmd()
        .arg("validate")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("--request"));
}
