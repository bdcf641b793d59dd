// ============================================================================
// reelforge-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// Commands return `CliResult`, which reuses the core error type so every
// failure keeps its stable code. `report_error` is the single place that
// turns an error into terminal output.

use reelforge_core::{CoreError, CoreResult};

use console::style;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Formats the one-line `error[CODE]: message` summary.
pub fn error_line(error: &CoreError) -> String {
    format!("error[{}]: {}", error.code(), error)
}

/// Prints `error` to stderr, followed by renderer diagnostics when present.
pub fn report_error(error: &CoreError) {
    eprintln!("{}", style(error_line(error)).red().bold());

    if let Some(diagnostics) = error.diagnostic_output() {
        let diagnostics = diagnostics.trim_end();
        if !diagnostics.is_empty() {
            eprintln!("{}", style("ffmpeg output:").dim());
            for line in diagnostics.lines() {
                eprintln!("  {line}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_line_includes_code() {
        let err = CoreError::FileNotFound(PathBuf::from("/assets/bgm.mp3"));
        assert_eq!(
            error_line(&err),
            "error[FILE_NOT_FOUND]: File not found: /assets/bgm.mp3"
        );
    }
}
