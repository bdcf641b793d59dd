// reelforge-cli/src/lib.rs
//
// Library portion of the Reelforge CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, ComposeArgs, PlanArgs, RequestArgs};
pub use commands::compose::run_compose;
