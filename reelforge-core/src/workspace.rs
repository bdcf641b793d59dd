//! Temporary workspace management.
//!
//! Each composition run gets one uniquely named directory holding its
//! intermediate artifacts. The directory is a `tempfile::TempDir`, so it is
//! removed on every exit path: normal return, `?` propagation, and unwinding.
//! Removal failures are logged and never replace the run's own result.

use crate::config::{CoreConfig, WORKSPACE_PREFIX};
use crate::error::{CoreResult, compose_failed_error};
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, TempDir};

/// File name of the generated concat-demuxer list.
pub const CONCAT_LIST_NAME: &str = "concat_list.txt";

/// Stage name used when the workspace itself cannot be created.
pub const WORKSPACE_STAGE: &str = "workspace";

/// Scoped temporary directory for one composition run.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a workspace under `config.temp_dir`, or the system temp dir.
    ///
    /// Failures are reported as `ComposeFailed` in the "workspace" stage.
    pub fn create(config: &CoreConfig) -> CoreResult<Self> {
        let created = match config.temp_dir {
            Some(ref base) => std::fs::create_dir_all(base).and_then(|()| {
                TempFileBuilder::new()
                    .prefix(WORKSPACE_PREFIX)
                    .tempdir_in(base)
            }),
            None => TempFileBuilder::new().prefix(WORKSPACE_PREFIX).tempdir(),
        };
        let dir = created.map_err(|e| compose_failed_error(WORKSPACE_STAGE, e))?;
        log::debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Render output for the scene at `index`.
    pub fn scene_path(&self, index: usize) -> PathBuf {
        self.path().join(format!("scene_{index}.mp4"))
    }

    pub fn concatenated_path(&self) -> PathBuf {
        self.path().join("concatenated.mp4")
    }

    pub fn with_bgm_path(&self) -> PathBuf {
        self.path().join("with_bgm.mp4")
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.path().join(CONCAT_LIST_NAME)
    }

    /// Removes the directory now, logging instead of failing.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => log::debug!("Removed workspace {}", path.display()),
            Err(e) => log::warn!("Failed to remove workspace {}: {}", path.display(), e),
        }
    }
}

/// Runs `run` inside a fresh workspace and removes the workspace afterwards.
///
/// The closure's result is returned unchanged; cleanup errors are swallowed.
/// Only a failure to create the workspace is reported as an error.
pub fn with_workspace<T, F>(config: &CoreConfig, run: F) -> CoreResult<T>
where
    F: FnOnce(&Workspace) -> CoreResult<T>,
{
    let workspace = Workspace::create(config)?;
    let result = run(&workspace);
    workspace.close();
    result
}
