// ============================================================================
// reelforge-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// This module encapsulates every interaction with the external renderer. The
// composer only sees the traits defined here, so tests can drive a complete
// composition through the mocks without ffmpeg installed.
//
// KEY COMPONENTS:
// - FfmpegCommandBuilder: global flags plus stage arguments
// - FfmpegSpawner / FfmpegProcess and `run_stage`: one invocation per stage
// - FfprobeExecutor: duration probe of the final artifact
// - mocks (feature `test-mocks`): scripted spawner and prober

// ============================================================================
// SUBMODULES
// ============================================================================

/// Builds ffmpeg commands from stage arguments
pub mod ffmpeg_builder;

/// Contains traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Contains traits and implementations for executing ffprobe commands
pub mod ffprobe_executor;

/// Scripted test doubles, compiled with the `test-mocks` feature
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_builder::FfmpegCommandBuilder;

pub use ffmpeg_executor::{
    CancelFlag, EventStream, FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner, Stage,
    run_stage,
};

pub use ffprobe_executor::{CrateFfprobeExecutor, FfprobeExecutor};
