//! FFmpeg command builder utilities
//!
//! Every stage runs ffmpeg with the same global flags; this builder adds them
//! in front of the stage arguments and produces either a runnable
//! `FfmpegCommand` or a printable argument list for dry runs.

use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::{Path, PathBuf};

/// Builder for creating `FFmpeg` commands with common configurations
#[derive(Debug, Clone)]
pub struct FfmpegCommandBuilder {
    program: Option<PathBuf>,
    hide_banner: bool,
    overwrite: bool,
    args: Vec<String>,
}

impl Default for FfmpegCommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegCommandBuilder {
    /// Creates a new `FFmpeg` command builder with sensible defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: None,
            hide_banner: true,
            overwrite: true,
            args: Vec::new(),
        }
    }

    /// Uses a specific ffmpeg binary instead of the one on `PATH`
    #[must_use]
    pub fn with_program(mut self, program: Option<&Path>) -> Self {
        self.program = program.map(Path::to_path_buf);
        self
    }

    /// Sets whether to hide the `FFmpeg` banner
    #[must_use]
    pub fn with_hide_banner(mut self, hide: bool) -> Self {
        self.hide_banner = hide;
        self
    }

    /// Sets whether existing output files are overwritten (`-y`)
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Appends stage arguments
    #[must_use]
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.args.extend(args);
        self
    }

    /// Global flags followed by the stage arguments
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut all = Vec::with_capacity(self.args.len() + 3);
        if self.hide_banner {
            all.push("-hide_banner".to_string());
        }
        all.push("-nostdin".to_string());
        if self.overwrite {
            all.push("-y".to_string());
        }
        all.extend(self.args.iter().cloned());
        all
    }

    /// Shell-like rendering of the full command, for logs and dry runs
    #[must_use]
    pub fn display_command(&self) -> String {
        let program = self
            .program
            .as_deref()
            .map_or_else(|| "ffmpeg".to_string(), |p| p.display().to_string());
        std::iter::once(program)
            .chain(self.to_args().into_iter().map(|a| quote_arg(&a)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Builds the `FFmpeg` command with all configured options
    #[must_use]
    pub fn build(self) -> FfmpegCommand {
        let args = self.to_args();
        let mut cmd = match self.program {
            Some(ref path) => FfmpegCommand::new_with_path(path),
            None => FfmpegCommand::new(),
        };
        cmd.args(args);
        cmd
    }
}

fn quote_arg(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c))
    {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
    }
}
