// ============================================================================
// reelforge-core/src/planner.rs
// ============================================================================
//
// SCENE RENDER PLANNER: Scene Validation and Declarative Render Plans
//
// Turns one `SceneInput` into a `RenderPlan`: the ordered ffmpeg inputs, the
// filter graph that produces a single `[vout]` video stream and a single
// `[aout]` audio stream, and the output mapping. The planner is pure; it never
// touches the filesystem. File existence is checked by the orchestrator.
//
// INPUT LAYOUT (per scene):
//   0        background (color source, image, or video)
//   1..=k    subtitle images, in layering order
//   k+1      narration audio, or a synthesized silent track
//
// The concat and audio-mix stages use fixed plans built by `plan_concat` and
// `plan_audio_mix`.

use crate::config::{AUDIO_SAMPLE_RATE, CoreConfig};
use crate::effects::{self, fmt_num};
use crate::error::{CoreError, CoreResult};
use crate::model::{KenBurnsKind, SceneInput, SceneVisual, SubtitleOverlay};

use std::path::{Path, PathBuf};

/// Label of the background stream inside the scene filter graph.
const BACKGROUND_LABEL: &str = "bg";

/// Label of the final composited video stream.
pub const VIDEO_OUT_LABEL: &str = "vout";

/// Label of the final audio stream.
pub const AUDIO_OUT_LABEL: &str = "aout";

/// Seconds over which the BGM fades when it ends before the narration.
pub const BGM_DROPOUT_TRANSITION_SECS: u32 = 3;

// ============================================================================
// PLAN TYPES
// ============================================================================

/// One ffmpeg input and the options that precede its `-i`.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    /// Generated by a lavfi source filter, optionally cut to `duration`
    Lavfi { graph: String, duration: Option<f64> },
    /// Still image repeated at the scene frame rate for `duration` seconds
    LoopedImage { path: PathBuf, frame_rate: u32, duration: f64 },
    /// Video looped indefinitely; the filter graph trims it
    LoopedVideo { path: PathBuf },
    /// Plain file input
    File { path: PathBuf },
}

impl InputSource {
    /// Input options followed by `-i <source>`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        let source = match self {
            Self::Lavfi { graph, duration } => {
                args.extend(["-f".to_string(), "lavfi".to_string()]);
                if let Some(d) = duration {
                    args.extend(["-t".to_string(), fmt_num(*d)]);
                }
                graph.clone()
            }
            Self::LoopedImage {
                path,
                frame_rate,
                duration,
            } => {
                args.extend([
                    "-loop".to_string(),
                    "1".to_string(),
                    "-framerate".to_string(),
                    frame_rate.to_string(),
                    "-t".to_string(),
                    fmt_num(*duration),
                ]);
                path.to_string_lossy().into_owned()
            }
            Self::LoopedVideo { path } => {
                args.extend(["-stream_loop".to_string(), "-1".to_string()]);
                path.to_string_lossy().into_owned()
            }
            Self::File { path } => path.to_string_lossy().into_owned(),
        };
        args.push("-i".to_string());
        args.push(source);
        args
    }
}

/// Fully resolved render description for one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub scene_id: String,
    /// Inputs in ffmpeg index order
    pub inputs: Vec<InputSource>,
    /// Background chain ending in `[bg]`
    pub video_chain: String,
    /// Subtitle overlays ending in `[vout]`; a pass-through when there are none
    pub subtitle_chain: String,
    /// Index into `inputs` of the selected audio source
    pub audio_input_index: usize,
    /// Audio normalization ending in `[aout]`
    pub audio_chain: String,
    pub duration_secs: f64,
    pub frame_rate: u32,
}

impl RenderPlan {
    /// The complete `-filter_complex` graph.
    pub fn filter_complex(&self) -> String {
        [
            self.video_chain.as_str(),
            self.subtitle_chain.as_str(),
            self.audio_chain.as_str(),
        ]
        .join(";")
    }

    /// Number of subtitle overlays layered by this plan.
    pub fn subtitle_count(&self) -> usize {
        self.audio_input_index - 1
    }

    /// Materializes the scene-render stage arguments (without global flags).
    pub fn to_args(&self, config: &CoreConfig, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = self.inputs.iter().flat_map(InputSource::to_args).collect();
        args.extend([
            "-filter_complex".to_string(),
            self.filter_complex(),
            "-map".to_string(),
            format!("[{VIDEO_OUT_LABEL}]"),
            "-map".to_string(),
            format!("[{AUDIO_OUT_LABEL}]"),
            "-c:v".to_string(),
            config.video_codec.clone(),
            "-preset".to_string(),
            config.video_preset.clone(),
            "-crf".to_string(),
            config.video_crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            self.frame_rate.to_string(),
            "-c:a".to_string(),
            config.audio_codec.clone(),
            "-b:a".to_string(),
            format!("{}k", config.audio_bitrate_kbps),
            "-ar".to_string(),
            AUDIO_SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            "2".to_string(),
            "-t".to_string(),
            fmt_num(self.duration_secs),
            output.to_string_lossy().into_owned(),
        ]);
        args
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

fn invalid(scene: &SceneInput, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidScene {
        scene_id: scene.scene_id.clone(),
        reason: reason.into(),
    }
}

/// Parses a `RRGGBB` or `#RRGGBB` color into ffmpeg's `0xRRGGBB` form.
pub fn parse_hex_color(color: &str) -> Option<String> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some(format!("0x{}", hex.to_ascii_uppercase()))
    } else {
        None
    }
}

/// The scene's solid color in ffmpeg form, or the scene-level error.
fn scene_color(scene: &SceneInput, color: &str) -> CoreResult<String> {
    parse_hex_color(color)
        .ok_or_else(|| invalid(scene, format!("color '{color}' is not a 6-digit hex color")))
}

/// Checks one scene descriptor without touching the filesystem.
///
/// With `strict_effects`, an unrecognized Ken Burns type is rejected instead
/// of falling back to a static crop.
pub fn validate_scene(scene: &SceneInput, strict_effects: bool) -> CoreResult<()> {
    if scene.duration_ms <= 0 {
        return Err(invalid(
            scene,
            format!("durationMs must be greater than 0, got {}", scene.duration_ms),
        ));
    }

    match &scene.visual {
        SceneVisual::SolidColor { color } => {
            scene_color(scene, color)?;
        }
        SceneVisual::Image {
            file_path,
            ken_burns,
        } => {
            if file_path.as_os_str().is_empty() {
                return Err(invalid(scene, "image visual has an empty filePath"));
            }
            if let Some(effect) = ken_burns {
                if strict_effects {
                    if let KenBurnsKind::Unrecognized(name) = &effect.kind {
                        return Err(invalid(scene, format!("unknown Ken Burns type '{name}'")));
                    }
                }
            }
        }
        SceneVisual::Video { file_path } => {
            if file_path.as_os_str().is_empty() {
                return Err(invalid(scene, "video visual has an empty filePath"));
            }
        }
    }

    if scene
        .audio_path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(invalid(scene, "audioPath must not be empty when present"));
    }

    for (i, overlay) in scene.subtitles.iter().enumerate() {
        validate_subtitle(scene, i, overlay)?;
    }

    Ok(())
}

fn validate_subtitle(scene: &SceneInput, index: usize, overlay: &SubtitleOverlay) -> CoreResult<()> {
    if overlay.image_path.as_os_str().is_empty() {
        return Err(invalid(scene, format!("subtitle {index} has an empty imagePath")));
    }
    if overlay.start_ms < 0 || overlay.start_ms >= overlay.end_ms || overlay.end_ms > scene.duration_ms
    {
        return Err(invalid(
            scene,
            format!(
                "subtitle {index} window [{}, {}] must satisfy 0 <= start < end <= {}",
                overlay.start_ms, overlay.end_ms, scene.duration_ms
            ),
        ));
    }
    Ok(())
}

// ============================================================================
// PLANNING
// ============================================================================

/// Validates `scene` and builds its render plan.
pub fn plan_scene(
    scene: &SceneInput,
    width: u32,
    height: u32,
    frame_rate: u32,
    strict_effects: bool,
) -> CoreResult<RenderPlan> {
    validate_scene(scene, strict_effects)?;

    let duration = scene.duration_secs();
    let (background, video_chain) = plan_background(scene, width, height, frame_rate, duration)?;

    let mut inputs = vec![background];
    inputs.extend(scene.subtitles.iter().map(|s| InputSource::File {
        path: s.image_path.clone(),
    }));
    let subtitle_chain = plan_subtitles(&scene.subtitles);

    let audio_input_index = inputs.len();
    inputs.push(match &scene.audio_path {
        Some(path) => InputSource::File { path: path.clone() },
        None => InputSource::Lavfi {
            graph: format!("anullsrc=channel_layout=stereo:sample_rate={AUDIO_SAMPLE_RATE}"),
            duration: Some(duration),
        },
    });
    let audio_chain = format!(
        "[{audio_input_index}:a]aformat=sample_rates={AUDIO_SAMPLE_RATE}:channel_layouts=stereo,apad[{AUDIO_OUT_LABEL}]"
    );

    log::debug!(
        "Planned scene '{}': {} visual, {} subtitle(s), {} audio",
        scene.scene_id,
        scene.visual.kind_name(),
        scene.subtitles.len(),
        if scene.audio_path.is_some() { "narration" } else { "silent" }
    );

    Ok(RenderPlan {
        scene_id: scene.scene_id.clone(),
        inputs,
        video_chain,
        subtitle_chain,
        audio_input_index,
        audio_chain,
        duration_secs: duration,
        frame_rate,
    })
}

/// Background input and the chain that turns it into `[bg]`.
fn plan_background(
    scene: &SceneInput,
    width: u32,
    height: u32,
    frame_rate: u32,
    duration: f64,
) -> CoreResult<(InputSource, String)> {
    let fit = format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,\
         pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,fps={frame_rate}"
    );

    let planned = match &scene.visual {
        SceneVisual::SolidColor { color } => {
            // Already checked by validate_scene; shared so both agree on the error.
            let hex = scene_color(scene, color)?;
            (
                InputSource::Lavfi {
                    graph: format!(
                        "color=c={hex}:s={width}x{height}:r={frame_rate}:d={}",
                        fmt_num(duration)
                    ),
                    duration: None,
                },
                format!("[0:v]format=yuv420p,setsar=1[{BACKGROUND_LABEL}]"),
            )
        }
        SceneVisual::Image {
            file_path,
            ken_burns,
        } => {
            let input = InputSource::LoopedImage {
                path: file_path.clone(),
                frame_rate,
                duration,
            };
            let chain = match ken_burns {
                Some(effect) => {
                    if let KenBurnsKind::Unrecognized(name) = &effect.kind {
                        log::warn!(
                            "Scene '{}': unknown Ken Burns type '{}', rendering a static centered crop",
                            scene.scene_id,
                            name
                        );
                    }
                    let expression =
                        effects::compute_effect(effect, width, height, duration, frame_rate);
                    format!(
                        "[0:v]{},setsar=1,format=yuv420p[{BACKGROUND_LABEL}]",
                        expression.to_filter()
                    )
                }
                None => format!("[0:v]{fit},format=yuv420p[{BACKGROUND_LABEL}]"),
            };
            (input, chain)
        }
        SceneVisual::Video { file_path } => (
            InputSource::LoopedVideo {
                path: file_path.clone(),
            },
            format!(
                "[0:v]{fit},trim=duration={},setpts=PTS-STARTPTS,format=yuv420p[{BACKGROUND_LABEL}]",
                fmt_num(duration)
            ),
        ),
    };
    Ok(planned)
}

/// Overlay chain from `[bg]` to `[vout]`, one overlay per subtitle.
fn plan_subtitles(subtitles: &[SubtitleOverlay]) -> String {
    if subtitles.is_empty() {
        return format!("[{BACKGROUND_LABEL}]null[{VIDEO_OUT_LABEL}]");
    }

    let last = subtitles.len();
    let mut stages = Vec::with_capacity(last);
    let mut previous = BACKGROUND_LABEL.to_string();
    for (i, overlay) in subtitles.iter().enumerate() {
        let input_index = i + 1;
        let label = if input_index == last {
            VIDEO_OUT_LABEL.to_string()
        } else {
            format!("v{input_index}")
        };
        stages.push(format!(
            "[{previous}][{input_index}:v]overlay=(main_w-overlay_w)/2:(main_h-overlay_h)/2:\
             enable='between(t,{},{})'[{label}]",
            fmt_num(overlay.start_ms as f64 / 1000.0),
            fmt_num(overlay.end_ms as f64 / 1000.0),
        ));
        previous = label;
    }
    stages.join(";")
}

// ============================================================================
// FIXED PLANS
// ============================================================================

/// Concat-demuxer list: one `file '<path>'` line per scene, in order.
pub fn concat_list_contents(scene_files: &[PathBuf]) -> String {
    scene_files
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}

/// Stream-copy concatenation of the files named in `list_path`.
pub fn plan_concat(list_path: &Path, output: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_path.to_string_lossy().into_owned(),
        "-c".to_string(),
        "copy".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Mixes background music under the narration of `input`.
///
/// Output duration follows the narration; the video stream is copied.
pub fn plan_audio_mix(
    input: &Path,
    bgm: &Path,
    voice_volume: f64,
    bgm_volume: f64,
    config: &CoreConfig,
    output: &Path,
) -> Vec<String> {
    let graph = format!(
        "[0:a]volume={}[voice];[1:a]volume={}[bgm];\
         [voice][bgm]amix=inputs=2:duration=first:dropout_transition={BGM_DROPOUT_TRANSITION_SECS}[{AUDIO_OUT_LABEL}]",
        fmt_num(voice_volume),
        fmt_num(bgm_volume),
    );
    vec![
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-i".to_string(),
        bgm.to_string_lossy().into_owned(),
        "-filter_complex".to_string(),
        graph,
        "-map".to_string(),
        "0:v".to_string(),
        "-map".to_string(),
        format!("[{AUDIO_OUT_LABEL}]"),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        config.audio_codec.clone(),
        "-b:a".to_string(),
        format!("{}k", config.audio_bitrate_kbps),
        "-ar".to_string(),
        AUDIO_SAMPLE_RATE.to_string(),
        output.to_string_lossy().into_owned(),
    ]
}
