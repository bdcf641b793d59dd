//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Renders a request into its output file.
pub mod compose;

/// Prints the per-scene ffmpeg commands without running them.
pub mod plan;

/// Runs the pre-render checks only.
pub mod validate;

use crate::error::CliResult;
use log::debug;
use reelforge_core::CompositionRequest;
use std::path::Path;

/// Loads the request file named on the command line.
pub(crate) fn load_request(path: &Path) -> CliResult<CompositionRequest> {
    debug!("Loading request from {}", path.display());
    CompositionRequest::from_json_file(path)
}
