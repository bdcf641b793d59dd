//! Implementation of the 'compose' subcommand.
//!
//! Loads the request, builds a `CoreConfig` from flags and environment, and
//! runs the composer with the production ffmpeg/ffprobe executors.

use crate::cli::ComposeArgs;
use crate::commands::load_request;
use crate::error::CliResult;
use crate::output::{TerminalEventHandler, print_result};

use log::{debug, info};
use reelforge_core::config::CoreConfigBuilder;
use reelforge_core::events::{EventHandler, JsonProgressHandler};
use reelforge_core::external::{CrateFfprobeExecutor, SidecarSpawner};
use reelforge_core::{Composer, CoreConfig};

use std::sync::Arc;
use std::time::Duration;

/// Creates and configures CoreConfig from CLI arguments.
pub fn create_core_config(args: &ComposeArgs) -> CoreConfig {
    let mut builder = CoreConfigBuilder::new()
        .parallel_jobs(args.jobs)
        .strict_effects(!args.lenient_effects);

    if let Some(ref ffmpeg) = args.ffmpeg {
        builder = builder.ffmpeg_path(ffmpeg.clone());
    }
    if let Some(ref temp_dir) = args.temp_dir {
        builder = builder.temp_dir(temp_dir.clone());
    }
    if let Some(secs) = args.stage_timeout {
        builder = builder.stage_timeout(Duration::from_secs(secs));
    }

    builder.build()
}

pub fn run_compose(args: &ComposeArgs) -> CliResult<()> {
    let mut request = load_request(&args.request.request)?;
    if let Some(ref output) = args.output {
        debug!("Output overridden to {}", output.display());
        request.output_path = output.clone();
    }

    let config = create_core_config(args);
    info!(
        "Composing {} scene(s) with {} job(s)",
        request.scenes.len(),
        config.parallel_jobs
    );

    let handler: Arc<dyn EventHandler> = if args.json_progress {
        Arc::new(JsonProgressHandler::new())
    } else {
        Arc::new(TerminalEventHandler::new())
    };
    let composer = Composer::new(SidecarSpawner, CrateFfprobeExecutor::new(), config)
        .with_event_handler(handler);

    let result = composer.compose(&request)?;
    if !args.json_progress {
        print_result(&result);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::parse_from([
            "reelforge",
            "compose",
            "--request",
            "req.json",
            "--jobs",
            "4",
            "--stage-timeout",
            "90",
            "--temp-dir",
            "/scratch",
            "--lenient-effects",
        ]);
        let Commands::Compose(args) = cli.command else {
            panic!("expected compose");
        };
        let config = create_core_config(&args);
        assert_eq!(config.parallel_jobs, 4);
        assert_eq!(config.stage_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.temp_dir, Some(PathBuf::from("/scratch")));
        assert!(!config.strict_effects);
    }
}
