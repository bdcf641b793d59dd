//! FFprobe integration for the duration probe stage
//!
//! The composer reports the real duration of the finished artifact rather
//! than the sum of scene durations, so the final step probes the file.
use crate::error::{CoreError, CoreResult};
use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// Probes media files.
pub trait FfprobeExecutor {
    /// Container duration of `input_path` in seconds.
    fn probe_duration(&self, input_path: &Path) -> CoreResult<f64>;
}

/// `FfprobeExecutor` backed by the `ffprobe` crate (runs `ffprobe` from `PATH`).
#[derive(Debug, Clone, Default)]
pub struct CrateFfprobeExecutor;

impl CrateFfprobeExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl FfprobeExecutor for CrateFfprobeExecutor {
    fn probe_duration(&self, input_path: &Path) -> CoreResult<f64> {
        log::debug!(
            "Running ffprobe (via crate) for duration on: {}",
            input_path.display()
        );
        match ffprobe(input_path) {
            Ok(metadata) => metadata
                .format
                .duration
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok())
                .ok_or_else(|| {
                    CoreError::Probe(format!(
                        "Failed to parse duration from format for {}",
                        input_path.display()
                    ))
                }),
            Err(err) => {
                log::error!("ffprobe failed for {}: {:?}", input_path.display(), err);
                Err(map_ffprobe_error(err))
            }
        }
    }
}

fn map_ffprobe_error(err: FfProbeError) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => CoreError::Probe(format!("could not run ffprobe: {io_err}")),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            CoreError::Probe(format!(
                "ffprobe exited with {}: {}",
                output.status,
                stderr.trim()
            ))
        }
        FfProbeError::Deserialize(err) => {
            CoreError::Probe(format!("ffprobe output deserialization: {err}"))
        }
        _ => CoreError::Probe(format!("Unknown ffprobe error: {err:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_a_probe_error() {
        let executor = CrateFfprobeExecutor::new();
        let err = executor
            .probe_duration(Path::new("/definitely/not/here/final.mp4"))
            .unwrap_err();
        assert_eq!(err.code(), "PROBE_FAILED");
    }
}
