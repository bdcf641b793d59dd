//! Core library for composing short-form videos from rendered scene assets.
//!
//! A `CompositionRequest` lists scenes (solid color, still image with an
//! optional Ken Burns animation, or looping video), each with optional
//! narration and timed subtitle images. The `Composer` renders every scene
//! with ffmpeg, concatenates the results, optionally mixes in background
//! music, and reports the probed duration and size of the final file.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use reelforge_core::{Composer, CompositionRequest, SceneInput, SceneVisual};
//! use reelforge_core::config::CoreConfigBuilder;
//! use reelforge_core::external::{CrateFfprobeExecutor, SidecarSpawner};
//! use std::path::PathBuf;
//!
//! let scenes = vec![SceneInput::new(
//!     "intro",
//!     1500,
//!     SceneVisual::SolidColor { color: "#1E1E2E".to_string() },
//! )
//! .with_audio("/assets/intro.mp3")];
//! let request = CompositionRequest::new(scenes, 1080, 1920, PathBuf::from("/out/final.mp4"));
//!
//! let config = CoreConfigBuilder::new().parallel_jobs(2).build();
//! let composer = Composer::new(SidecarSpawner, CrateFfprobeExecutor::new(), config);
//! let result = composer.compose(&request).unwrap();
//! println!("{:.2}s, {} bytes", result.duration_seconds, result.file_size_bytes);
//! ```

pub mod compose;
pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod external;
pub mod model;
pub mod planner;
pub mod utils;
pub mod workspace;

// Re-exports for public API
pub use compose::{ComposeState, Composer, check_files, preflight};
pub use config::CoreConfig;
pub use effects::{EffectExpression, compute_effect};
pub use error::{CoreError, CoreResult};
pub use external::{CancelFlag, Stage};
pub use model::{
    CompositionRequest, CompositionResult, KenBurnsEffect, KenBurnsKind, SceneInput, SceneVisual,
    SubtitleOverlay,
};
pub use planner::{RenderPlan, plan_scene, validate_scene};
pub use utils::{format_bytes, format_duration};
pub use workspace::{Workspace, with_workspace};
