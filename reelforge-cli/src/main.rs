// reelforge-cli/src/main.rs
//
// Entry point for the `reelforge` binary.
//
// Responsibilities include:
// - Parsing arguments (`Cli`, `Commands`).
// - Initializing env_logger.
// - Dispatching to the subcommand implementations.
// - Mapping errors to `error[CODE]: message` on stderr and exit code 1.

use clap::Parser;
use reelforge_cli::commands::{compose::run_compose, plan::run_plan, validate::run_validate};
use reelforge_cli::error::report_error;
use reelforge_cli::logging::init_logging;
use reelforge_cli::{Cli, Commands};
use std::process;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compose(ref args) => run_compose(args),
        Commands::Validate(ref args) => run_validate(args),
        Commands::Plan(ref args) => run_plan(args),
    };

    if let Err(e) = result {
        report_error(&e);
        process::exit(1);
    }
}
