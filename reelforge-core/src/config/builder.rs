// ============================================================================
// reelforge-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig. Every field starts at the value from
// `CoreConfig::default()`; call `validate()` on the built config before use.

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use super::CoreConfig;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use reelforge_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .ffmpeg_path(PathBuf::from("/usr/local/bin/ffmpeg"))
///     .temp_dir(PathBuf::from("/var/tmp/reelforge"))
///     .video_preset("medium")
///     .strict_effects(false)
///     .build();
/// assert_eq!(config.video_preset, "medium");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ffmpeg binary used for every stage.
    pub fn ffmpeg_path(mut self, path: PathBuf) -> Self {
        self.config.ffmpeg_path = Some(path);
        self
    }

    /// Sets the base directory under which run workspaces are created.
    pub fn temp_dir(mut self, temp_dir: PathBuf) -> Self {
        self.config.temp_dir = Some(temp_dir);
        self
    }

    /// Sets the video encoder for scene renders.
    pub fn video_codec(mut self, codec: &str) -> Self {
        self.config.video_codec = codec.to_string();
        self
    }

    /// Sets the encoder preset.
    pub fn video_preset(mut self, preset: &str) -> Self {
        self.config.video_preset = preset.to_string();
        self
    }

    /// Sets the CRF quality (0-51, lower is higher quality).
    pub fn video_crf(mut self, crf: u8) -> Self {
        self.config.video_crf = crf;
        self
    }

    /// Sets the audio encoder.
    pub fn audio_codec(mut self, codec: &str) -> Self {
        self.config.audio_codec = codec.to_string();
        self
    }

    /// Sets the audio bitrate in kbps.
    pub fn audio_bitrate_kbps(mut self, kbps: u32) -> Self {
        self.config.audio_bitrate_kbps = kbps;
        self
    }

    /// Sets the per-stage deadline.
    pub fn stage_timeout(mut self, timeout: Duration) -> Self {
        self.config.stage_timeout = Some(timeout);
        self
    }

    /// Sets the maximum number of concurrently rendered scenes.
    pub fn parallel_jobs(mut self, jobs: usize) -> Self {
        self.config.parallel_jobs = jobs;
        self
    }

    /// Sets whether unrecognized Ken Burns types are rejected.
    pub fn strict_effects(mut self, strict: bool) -> Self {
        self.config.strict_effects = strict;
        self
    }

    /// Builds a CoreConfig instance from the builder.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_match_core_default() {
        let built = CoreConfigBuilder::new().build();
        let default = CoreConfig::default();
        assert_eq!(built.video_crf, default.video_crf);
        assert_eq!(built.video_preset, default.video_preset);
        assert_eq!(built.parallel_jobs, default.parallel_jobs);
        assert_eq!(built.stage_timeout, None);
    }

    #[test]
    fn test_builder_chaining() {
        let config = CoreConfigBuilder::new()
            .video_codec("libx265")
            .video_crf(28)
            .audio_codec("libopus")
            .audio_bitrate_kbps(128)
            .parallel_jobs(4)
            .stage_timeout(Duration::from_secs(90))
            .strict_effects(false)
            .build();

        assert_eq!(config.video_codec, "libx265");
        assert_eq!(config.video_crf, 28);
        assert_eq!(config.audio_codec, "libopus");
        assert_eq!(config.audio_bitrate_kbps, 128);
        assert_eq!(config.parallel_jobs, 4);
        assert_eq!(config.stage_timeout, Some(Duration::from_secs(90)));
        assert!(!config.strict_effects);
        assert!(config.validate().is_ok());
    }
}
