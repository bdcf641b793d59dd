// ============================================================================
// reelforge-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Composition Pipeline
//
// Every failure the pipeline can surface is a variant of `CoreError`. The
// orchestrator translates stage-level failures into exactly one of these and
// returns it from `compose`; callers that need a stable machine-readable tag
// use `CoreError::code()`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the composition pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The request's scene list is unusable as a whole (empty, duplicate ids).
    #[error("Invalid scenes: {0}")]
    InvalidScenes(String),

    /// A single scene failed planner validation.
    #[error("Invalid scene '{scene_id}': {reason}")]
    InvalidScene { scene_id: String, reason: String },

    #[error("Invalid dimensions: {width}x{height} (both must be > 0)")]
    InvalidDimensions { width: i64, height: i64 },

    /// Request-level values outside their allowed range, or malformed JSON.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The renderer ran and exited non-zero.
    #[error("{stage} failed (exit code {}): {}", .exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()), diagnostic_summary(.diagnostic_output))]
    RenderFailed {
        stage: String,
        exit_code: Option<i32>,
        diagnostic_output: String,
    },

    /// The renderer process could not be started at all.
    #[error("{stage} could not be started: {reason}")]
    SpawnFailed { stage: String, reason: String },

    #[error("{stage} exceeded its {timeout_secs}s deadline and was killed")]
    RenderTimeout { stage: String, timeout_secs: u64 },

    #[error("Composition cancelled during {stage}")]
    Cancelled { stage: String },

    /// Catch-all for unexpected failures during orchestration.
    #[error("Composition failed during {stage}: {message}")]
    ComposeFailed { stage: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Stable error code for this failure.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidScenes(_) | Self::InvalidScene { .. } => "INVALID_SCENES",
            Self::InvalidDimensions { .. } => "INVALID_DIMENSIONS",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::RenderFailed { .. } => "RENDER_FAILED",
            Self::SpawnFailed { .. } => "SPAWN_FAILED",
            Self::RenderTimeout { .. } => "RENDER_TIMEOUT",
            Self::Cancelled { .. } => "CANCELLED",
            Self::ComposeFailed { .. } => "COMPOSE_FAILED",
            Self::Config(_) => "INVALID_CONFIG",
            Self::Probe(_) => "PROBE_FAILED",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Raw renderer diagnostics, if this is a render failure.
    #[must_use]
    pub fn diagnostic_output(&self) -> Option<&str> {
        match self {
            Self::RenderFailed {
                diagnostic_output, ..
            } => Some(diagnostic_output),
            _ => None,
        }
    }
}

/// Result type for reelforge-core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Last non-empty diagnostic line, used to keep `Display` output to one line.
fn diagnostic_summary(output: &str) -> &str {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no diagnostic output")
}

/// Builds a `RenderFailed` error for a stage that exited unsuccessfully.
pub fn render_failed_error(
    stage: impl Into<String>,
    exit_code: Option<i32>,
    diagnostic_output: impl Into<String>,
) -> CoreError {
    CoreError::RenderFailed {
        stage: stage.into(),
        exit_code,
        diagnostic_output: diagnostic_output.into(),
    }
}

/// Builds a `SpawnFailed` error from the spawn-time I/O error.
pub fn spawn_failed_error(stage: impl Into<String>, err: impl std::fmt::Display) -> CoreError {
    CoreError::SpawnFailed {
        stage: stage.into(),
        reason: err.to_string(),
    }
}

/// Builds a `ComposeFailed` error for an unexpected failure inside a stage.
pub fn compose_failed_error(stage: impl Into<String>, err: impl std::fmt::Display) -> CoreError {
    CoreError::ComposeFailed {
        stage: stage.into(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_for_scene_errors_share_tag() {
        let whole = CoreError::InvalidScenes("empty".to_string());
        let single = CoreError::InvalidScene {
            scene_id: "a".to_string(),
            reason: "bad color".to_string(),
        };
        assert_eq!(whole.code(), "INVALID_SCENES");
        assert_eq!(single.code(), "INVALID_SCENES");
        assert!(single.to_string().contains("'a'"));
    }

    #[test]
    fn test_render_failed_display_uses_last_diagnostic_line() {
        let err = render_failed_error(
            "scene 0 render",
            Some(1),
            "Input #0, lavfi\n[Parsed_color_0] Unable to parse option value\n\n",
        );
        let msg = err.to_string();
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("Unable to parse option value"));
        assert!(!msg.contains("Input #0"));
        assert_eq!(
            err.diagnostic_output(),
            Some("Input #0, lavfi\n[Parsed_color_0] Unable to parse option value\n\n")
        );
    }

    #[test]
    fn test_render_failed_without_exit_code() {
        let err = render_failed_error("concat", None, "");
        assert!(err.to_string().contains("exit code none"));
        assert!(err.to_string().contains("no diagnostic output"));
    }

    #[test]
    fn test_helper_constructors() {
        let spawn = spawn_failed_error("audio mix", "No such file or directory");
        assert_eq!(spawn.code(), "SPAWN_FAILED");
        let compose = compose_failed_error("finalizing", "disk full");
        assert_eq!(compose.code(), "COMPOSE_FAILED");
        assert!(compose.to_string().contains("finalizing"));
    }
}
