//! Configuration structures and constants for the reelforge-core library.
//!
//! This module provides the configuration for how compositions are rendered:
//! which ffmpeg binary runs the stages, encoder settings for scene renders,
//! where run workspaces live, and how stages are scheduled and bounded.

mod builder;

use crate::error::{CoreError, CoreResult};

use std::path::PathBuf;
use std::time::Duration;

pub use builder::CoreConfigBuilder;

// Default constants

/// Default video encoder for scene renders.
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";

/// Default x264 preset. Scene renders are short, so speed wins over size.
pub const DEFAULT_VIDEO_PRESET: &str = "veryfast";

/// Default CRF quality for scene renders.
/// Range: 0-51, lower is higher quality.
pub const DEFAULT_VIDEO_CRF: u8 = 23;

/// Highest CRF accepted by libx264.
pub const MAX_VIDEO_CRF: u8 = 51;

/// Default audio encoder for scene renders and the BGM mix.
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Default audio bitrate in kbps.
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 192;

/// Sample rate of every scene's audio track, including synthesized silence.
/// Uniform audio parameters let the concat stage stream-copy.
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Default number of scenes rendered concurrently (1 = strictly sequential).
pub const DEFAULT_PARALLEL_JOBS: usize = 1;

/// Prefix of every run workspace directory.
pub const WORKSPACE_PREFIX: &str = "reelforge_";

/// Main configuration structure for the reelforge-core library.
///
/// Created by the consumer of the library (e.g., reelforge-cli) and passed to
/// the `Composer`. All fields have sensible defaults.
///
/// # Examples
///
/// ```rust
/// use reelforge_core::config::CoreConfigBuilder;
/// use std::time::Duration;
///
/// let config = CoreConfigBuilder::new()
///     .video_crf(20)
///     .parallel_jobs(2)
///     .stage_timeout(Duration::from_secs(300))
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Path to the ffmpeg binary (`None` uses `ffmpeg` from PATH)
    pub ffmpeg_path: Option<PathBuf>,

    /// Base directory for run workspaces (`None` uses the system temp dir)
    pub temp_dir: Option<PathBuf>,

    /// Video encoder used for scene renders
    pub video_codec: String,

    /// Encoder preset passed with `-preset`
    pub video_preset: String,

    /// CRF quality for scene renders (0-51)
    pub video_crf: u8,

    /// Audio encoder used for scene renders and the BGM mix
    pub audio_codec: String,

    /// Audio bitrate in kbps
    pub audio_bitrate_kbps: u32,

    /// Deadline for each renderer invocation. Exceeding it kills the process.
    pub stage_timeout: Option<Duration>,

    /// Maximum number of scenes rendered concurrently
    pub parallel_jobs: usize,

    /// Reject unrecognized Ken Burns effect types instead of falling back to
    /// a static centered crop
    pub strict_effects: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            temp_dir: None,
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            video_preset: DEFAULT_VIDEO_PRESET.to_string(),
            video_crf: DEFAULT_VIDEO_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate_kbps: DEFAULT_AUDIO_BITRATE_KBPS,
            stage_timeout: None,
            parallel_jobs: DEFAULT_PARALLEL_JOBS,
            strict_effects: true,
        }
    }
}

impl CoreConfig {
    /// Checks that every field holds a usable value.
    pub fn validate(&self) -> CoreResult<()> {
        if self.video_crf > MAX_VIDEO_CRF {
            return Err(CoreError::Config(format!(
                "video_crf must be between 0 and {MAX_VIDEO_CRF}, got {}",
                self.video_crf
            )));
        }

        if self.parallel_jobs == 0 {
            return Err(CoreError::Config(
                "parallel_jobs must be at least 1".to_string(),
            ));
        }

        if self.video_codec.trim().is_empty() || self.audio_codec.trim().is_empty() {
            return Err(CoreError::Config("codec names must not be empty".to_string()));
        }

        if self.video_preset.trim().is_empty() {
            return Err(CoreError::Config("video_preset must not be empty".to_string()));
        }

        if self.audio_bitrate_kbps == 0 {
            return Err(CoreError::Config(
                "audio_bitrate_kbps must be greater than 0".to_string(),
            ));
        }

        if self.stage_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CoreError::Config(
                "stage_timeout must be greater than 0 when set".to_string(),
            ));
        }

        if let Some(ref path) = self.ffmpeg_path {
            if path.as_os_str().is_empty() {
                return Err(CoreError::Config("ffmpeg_path must not be empty".to_string()));
            }
        }

        Ok(())
    }
}
