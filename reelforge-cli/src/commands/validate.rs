//! Implementation of the 'validate' subcommand.

use crate::cli::RequestArgs;
use crate::commands::load_request;
use crate::error::CliResult;
use crate::output::{print_heading, print_info, print_success};

use log::info;
use reelforge_core::{CoreConfig, format_duration, preflight};

/// Validates the request and checks that every referenced file exists.
///
/// No workspace is created and no renderer is started.
pub fn run_validate(args: &RequestArgs) -> CliResult<()> {
    let request = load_request(&args.request)?;
    let config = CoreConfig::default();

    info!("Validating {}", args.request.display());
    let (width, height) = preflight(&request, &config)?;

    print_heading("Request");
    print_info("Scenes", request.scenes.len());
    print_info("Resolution", format!("{width}x{height}"));
    print_info("Frame rate", request.frame_rate);
    print_info("Duration", format_duration(request.total_duration_secs()));
    print_info(
        "Music",
        request
            .bgm_path
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string()),
    );
    print_success("Request is valid");

    Ok(())
}
