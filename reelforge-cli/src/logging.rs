// ============================================================================
// reelforge-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger Initialization
//
// The core library logs through the `log` facade; this module installs
// `env_logger` as the backend. Logs go to stderr so stdout stays clean for
// results and `--json-progress` output.
//
// USAGE:
// - default: info
// - `--verbose`: debug (every ffmpeg command line is logged)
// - RUST_LOG=...: overrides both

/// Filter used when RUST_LOG is not set.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Installs the global logger. Safe to call once per process.
pub fn init_logging(verbose: bool) {
    let env = env_logger::Env::default().default_filter_or(default_filter(verbose));
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .init();
}
