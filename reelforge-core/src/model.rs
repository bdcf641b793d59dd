// ============================================================================
// reelforge-core/src/model.rs
// ============================================================================
//
// DATA MODEL: Composition Request, Scenes, and Result
//
// These types describe one composition run. A `CompositionRequest` is built
// by the caller (usually deserialized from JSON supplied by the scene/asset
// repository), validated once on entry, and then treated as immutable for
// the rest of the run.
//
// Field names serialize as camelCase so the JSON shape matches the asset
// repository's scene descriptors.

use crate::error::{CoreError, CoreResult};
use crate::planner;

use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Frame rate used when the request does not specify one.
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Background music gain used when the request does not specify one.
pub const DEFAULT_BGM_VOLUME: f64 = 0.3;

/// Narration gain used when the request does not specify one.
pub const DEFAULT_VOICE_VOLUME: f64 = 1.0;

/// Ken Burns zoom used when the effect does not specify one.
pub const DEFAULT_ZOOM_SCALE: f64 = 1.3;

/// Ken Burns pan travel used when the effect does not specify one.
pub const DEFAULT_PAN_AMOUNT: f64 = 0.2;

fn default_frame_rate() -> u32 {
    DEFAULT_FRAME_RATE
}

fn default_bgm_volume() -> f64 {
    DEFAULT_BGM_VOLUME
}

fn default_voice_volume() -> f64 {
    DEFAULT_VOICE_VOLUME
}

fn default_zoom_scale() -> f64 {
    DEFAULT_ZOOM_SCALE
}

fn default_pan_amount() -> f64 {
    DEFAULT_PAN_AMOUNT
}

// ============================================================================
// REQUEST
// ============================================================================

/// Top-level input to one composition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionRequest {
    /// Scenes in playback order
    pub scenes: Vec<SceneInput>,

    /// Output width in pixels
    pub width: i64,

    /// Output height in pixels
    pub height: i64,

    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Optional background music mixed under the narration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgm_path: Option<PathBuf>,

    /// BGM gain, 0.0-1.0
    #[serde(default = "default_bgm_volume")]
    pub bgm_volume: f64,

    /// Narration gain, 0.0-1.0
    #[serde(default = "default_voice_volume")]
    pub voice_volume: f64,

    /// Where the final artifact is written
    pub output_path: PathBuf,
}

impl CompositionRequest {
    /// Creates a request with default frame rate and volumes and no BGM.
    pub fn new(scenes: Vec<SceneInput>, width: i64, height: i64, output_path: PathBuf) -> Self {
        Self {
            scenes,
            width,
            height,
            frame_rate: DEFAULT_FRAME_RATE,
            bgm_path: None,
            bgm_volume: DEFAULT_BGM_VOLUME,
            voice_volume: DEFAULT_VOICE_VOLUME,
            output_path,
        }
    }

    /// Parses a request from its JSON representation.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidRequest(format!("malformed request JSON: {e}")))
    }

    /// Reads and parses a request file.
    pub fn from_json_file(path: &Path) -> CoreResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::FileNotFound(path.to_path_buf())
            } else {
                CoreError::Io(e)
            }
        })?;
        Self::from_json_str(&contents)
    }

    /// Validates the request shape and every scene.
    ///
    /// This performs no I/O. Scene-list errors are checked first, then the
    /// output dimensions, then request-level values, then each scene in order.
    pub fn validate(&self, strict_effects: bool) -> CoreResult<()> {
        if self.scenes.is_empty() {
            return Err(CoreError::InvalidScenes(
                "at least one scene is required".to_string(),
            ));
        }

        self.dimensions()?;

        if self.frame_rate == 0 {
            return Err(CoreError::InvalidRequest(
                "frameRate must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [("bgmVolume", self.bgm_volume), ("voiceVolume", self.voice_volume)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::InvalidRequest(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(CoreError::InvalidRequest("outputPath must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for scene in &self.scenes {
            if !seen.insert(scene.scene_id.as_str()) {
                return Err(CoreError::InvalidScenes(format!(
                    "duplicate sceneId '{}'",
                    scene.scene_id
                )));
            }
        }

        for scene in &self.scenes {
            planner::validate_scene(scene, strict_effects)?;
        }

        Ok(())
    }

    /// Output dimensions as unsigned pixels, or `InvalidDimensions`.
    pub fn dimensions(&self) -> CoreResult<(u32, u32)> {
        match (u32::try_from(self.width), u32::try_from(self.height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
            _ => Err(CoreError::InvalidDimensions {
                width: self.width,
                height: self.height,
            }),
        }
    }

    /// Every file the run reads, in scene order, followed by the BGM track.
    pub fn referenced_files(&self) -> Vec<&Path> {
        let mut files = Vec::new();
        for scene in &self.scenes {
            if let Some(path) = scene.visual.file_path() {
                files.push(path);
            }
            if let Some(ref audio) = scene.audio_path {
                files.push(audio.as_path());
            }
            files.extend(scene.subtitles.iter().map(|s| s.image_path.as_path()));
        }
        if let Some(ref bgm) = self.bgm_path {
            files.push(bgm.as_path());
        }
        files
    }

    /// Sum of scene durations in seconds.
    pub fn total_duration_secs(&self) -> f64 {
        self.scenes.iter().map(SceneInput::duration_secs).sum()
    }
}

// ============================================================================
// SCENES
// ============================================================================

/// One timed segment of the output video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneInput {
    /// Unique within the request
    pub scene_id: String,

    pub duration_ms: i64,

    pub visual: SceneVisual,

    /// Narration track; absent means silence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,

    /// Overlays in layering order, scene-local times
    #[serde(default)]
    pub subtitles: Vec<SubtitleOverlay>,
}

impl SceneInput {
    pub fn new(scene_id: impl Into<String>, duration_ms: i64, visual: SceneVisual) -> Self {
        Self {
            scene_id: scene_id.into(),
            duration_ms,
            visual,
            audio_path: None,
            subtitles: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_audio(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_subtitle(mut self, overlay: SubtitleOverlay) -> Self {
        self.subtitles.push(overlay);
        self
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}

/// The single visual source of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneVisual {
    /// Flat color, `color` is six hex digits with an optional leading `#`
    SolidColor { color: String },

    /// Still image, optionally animated with a Ken Burns effect
    Image {
        #[serde(rename = "filePath")]
        file_path: PathBuf,
        #[serde(rename = "kenBurns", default, skip_serializing_if = "Option::is_none")]
        ken_burns: Option<KenBurnsEffect>,
    },

    /// Video clip, looped and truncated to the scene duration
    Video {
        #[serde(rename = "filePath")]
        file_path: PathBuf,
    },
}

impl SceneVisual {
    /// Source file of the visual, if it reads one.
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::SolidColor { .. } => None,
            Self::Image { file_path, .. } | Self::Video { file_path } => Some(file_path.as_path()),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::SolidColor { .. } => "solid_color",
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
        }
    }
}

/// A transparent image composited over the scene during `[start_ms, end_ms]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleOverlay {
    pub image_path: PathBuf,
    pub start_ms: i64,
    pub end_ms: i64,
}

impl SubtitleOverlay {
    pub fn new(image_path: impl Into<PathBuf>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            image_path: image_path.into(),
            start_ms,
            end_ms,
        }
    }
}

// ============================================================================
// KEN BURNS
// ============================================================================

/// Pan/zoom animation applied to a still image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KenBurnsEffect {
    #[serde(rename = "type")]
    pub kind: KenBurnsKind,

    /// Clamped to [1.0, 2.0] when used
    #[serde(default = "default_zoom_scale")]
    pub zoom_scale: f64,

    /// Clamped to [0.0, 0.5] when used
    #[serde(default = "default_pan_amount")]
    pub pan_amount: f64,
}

impl KenBurnsEffect {
    pub fn new(kind: KenBurnsKind) -> Self {
        Self {
            kind,
            zoom_scale: DEFAULT_ZOOM_SCALE,
            pan_amount: DEFAULT_PAN_AMOUNT,
        }
    }
}

/// Animation kinds. Anything else in the input deserializes to `Unrecognized`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KenBurnsKind {
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    Unrecognized(String),
}

impl KenBurnsKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ZoomIn => "zoom_in",
            Self::ZoomOut => "zoom_out",
            Self::PanLeft => "pan_left",
            Self::PanRight => "pan_right",
            Self::PanUp => "pan_up",
            Self::PanDown => "pan_down",
            Self::Unrecognized(name) => name,
        }
    }
}

impl From<String> for KenBurnsKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "zoom_in" => Self::ZoomIn,
            "zoom_out" => Self::ZoomOut,
            "pan_left" => Self::PanLeft,
            "pan_right" => Self::PanRight,
            "pan_up" => Self::PanUp,
            "pan_down" => Self::PanDown,
            _ => Self::Unrecognized(name),
        }
    }
}

impl From<KenBurnsKind> for String {
    fn from(kind: KenBurnsKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for KenBurnsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RESULT
// ============================================================================

/// Metadata of the finished artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionResult {
    pub output_path: PathBuf,

    /// Probed from the artifact, not computed from scene durations
    pub duration_seconds: f64,

    pub file_size_bytes: u64,
}
