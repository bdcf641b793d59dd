// ============================================================================
// reelforge-core/src/compose.rs
// ============================================================================
//
// COMPOSITION ORCHESTRATOR: From a Validated Request to One Output File
//
// `Composer::compose` drives one run through a fixed sequence of states:
//
//   Validating -> CheckingFiles -> RenderingScenes -> Concatenating
//     -> MixingAudio (only with BGM) -> Finalizing -> Done
//
// Any state may move to Failed. Validation and file checks run before the
// workspace exists, so a rejected request leaves nothing behind. Once the
// workspace is created it is removed on every exit path (see `workspace`).
//
// Scenes render strictly in order unless `parallel_jobs > 1`, in which case a
// bounded rayon pool renders them concurrently. Scene outputs are indexed by
// position, so the concat list always follows request order.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult, compose_failed_error};
use crate::events::{Event, EventDispatcher, EventHandler};
use crate::external::{
    CancelFlag, FfmpegCommandBuilder, FfmpegSpawner, FfprobeExecutor, Stage, run_stage,
};
use crate::model::{CompositionRequest, CompositionResult};
use crate::planner::{self, plan_scene};
use crate::workspace::{Workspace, with_workspace};

use rayon::prelude::*;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

/// States of one composition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeState {
    Validating,
    CheckingFiles,
    RenderingScenes,
    Concatenating,
    MixingAudio,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for ComposeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::CheckingFiles => "checking files",
            Self::RenderingScenes => "rendering scenes",
            Self::Concatenating => "concatenating",
            Self::MixingAudio => "mixing audio",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs the Validating and CheckingFiles steps without creating a workspace.
///
/// Returns the output dimensions on success. The first missing file, in
/// `referenced_files` order, fails with `FileNotFound`.
pub fn preflight(request: &CompositionRequest, config: &CoreConfig) -> CoreResult<(u32, u32)> {
    config.validate()?;
    request.validate(config.strict_effects)?;
    let dimensions = request.dimensions()?;
    check_files(request)?;
    Ok(dimensions)
}

/// Fails with `FileNotFound` on the first referenced file that does not exist.
pub fn check_files(request: &CompositionRequest) -> CoreResult<()> {
    for path in request.referenced_files() {
        if !path.exists() {
            log::error!("Referenced file is missing: {}", path.display());
            return Err(CoreError::FileNotFound(path.to_path_buf()));
        }
    }
    Ok(())
}

/// Composition orchestrator.
///
/// # Examples
///
/// ```rust,no_run
/// use reelforge_core::{Composer, CompositionRequest, CoreConfig};
/// use reelforge_core::external::{CrateFfprobeExecutor, SidecarSpawner};
/// use std::path::Path;
///
/// let request = CompositionRequest::from_json_file(Path::new("request.json"))?;
/// let composer = Composer::new(SidecarSpawner, CrateFfprobeExecutor::new(), CoreConfig::default());
/// let result = composer.compose(&request)?;
/// println!("{} ({:.2}s)", result.output_path.display(), result.duration_seconds);
/// # Ok::<(), reelforge_core::CoreError>(())
/// ```
pub struct Composer<S: FfmpegSpawner, P: FfprobeExecutor> {
    spawner: S,
    prober: P,
    config: CoreConfig,
    events: EventDispatcher,
    cancel: CancelFlag,
}

impl<S: FfmpegSpawner, P: FfprobeExecutor> Composer<S, P> {
    pub fn new(spawner: S, prober: P, config: CoreConfig) -> Self {
        Self {
            spawner,
            prober,
            config,
            events: EventDispatcher::new(),
            cancel: CancelFlag::new(),
        }
    }

    #[must_use]
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.events.add_handler(handler);
        self
    }

    /// Uses an externally owned cancel flag.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that cancels the run in progress (or the next one) when raised.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Composes `request` into `request.output_path`.
    ///
    /// Blocks until the final artifact is written and probed. Every failure is
    /// reported as a single `CoreError` and a single `ComposeFailed` event.
    pub fn compose(&self, request: &CompositionRequest) -> CoreResult<CompositionResult> {
        let started = Instant::now();
        self.events.emit(Event::ComposeStarted {
            scene_count: request.scenes.len(),
            output_path: request.output_path.clone(),
        });

        match self.run(request) {
            Ok(result) => {
                self.enter(ComposeState::Done);
                log::info!(
                    "Composed {} scene(s) into {} ({:.2}s, {} bytes) in {:.1}s",
                    request.scenes.len(),
                    result.output_path.display(),
                    result.duration_seconds,
                    result.file_size_bytes,
                    started.elapsed().as_secs_f64()
                );
                self.events.emit(Event::ComposeComplete {
                    output_path: result.output_path.clone(),
                    duration_seconds: result.duration_seconds,
                    file_size_bytes: result.file_size_bytes,
                    elapsed: started.elapsed(),
                });
                Ok(result)
            }
            Err(e) => {
                log::error!("State {}: {} [{}]", ComposeState::Failed, e, e.code());
                self.events.emit(Event::ComposeFailed {
                    code: e.code().to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn run(&self, request: &CompositionRequest) -> CoreResult<CompositionResult> {
        self.enter(ComposeState::Validating);
        self.config.validate()?;
        request.validate(self.config.strict_effects)?;
        let (width, height) = request.dimensions()?;

        self.enter(ComposeState::CheckingFiles);
        check_files(request)?;

        with_workspace(&self.config, |workspace| {
            log::info!("Workspace: {}", workspace.path().display());
            self.run_in_workspace(request, width, height, workspace)
        })
    }

    fn run_in_workspace(
        &self,
        request: &CompositionRequest,
        width: u32,
        height: u32,
        workspace: &Workspace,
    ) -> CoreResult<CompositionResult> {
        self.enter(ComposeState::RenderingScenes);
        let renderer = SceneRenderer {
            spawner: &self.spawner,
            config: &self.config,
            events: &self.events,
            cancel: &self.cancel,
            request,
            width,
            height,
            workspace,
            completed: AtomicUsize::new(0),
        };
        let scene_files = renderer.render_all()?;

        self.enter(ComposeState::Concatenating);
        let concatenated = workspace.concatenated_path();
        self.concatenate(&scene_files, workspace, &concatenated)?;

        let artifact = match request.bgm_path {
            Some(ref bgm) => {
                self.enter(ComposeState::MixingAudio);
                let mixed = workspace.with_bgm_path();
                let args = planner::plan_audio_mix(
                    &concatenated,
                    bgm,
                    request.voice_volume,
                    request.bgm_volume,
                    &self.config,
                    &mixed,
                );
                execute(&self.spawner, &self.config, &self.cancel, &Stage::AudioMix, args)?;
                mixed
            }
            None => concatenated,
        };

        self.enter(ComposeState::Finalizing);
        self.finalize(&artifact, &request.output_path)
    }

    /// Joins the scene files in order. A single scene is copied, not re-muxed.
    fn concatenate(
        &self,
        scene_files: &[PathBuf],
        workspace: &Workspace,
        concatenated: &Path,
    ) -> CoreResult<()> {
        let stage = ComposeState::Concatenating.to_string();
        if let [only] = scene_files {
            log::debug!("Single scene, copying {} without concat", only.display());
            fs::copy(only, concatenated).map_err(|e| compose_failed_error(&stage, e))?;
            return Ok(());
        }

        let list_path = workspace.concat_list_path();
        fs::write(&list_path, planner::concat_list_contents(scene_files))
            .map_err(|e| compose_failed_error(&stage, e))?;
        execute(
            &self.spawner,
            &self.config,
            &self.cancel,
            &Stage::Concat,
            planner::plan_concat(&list_path, concatenated),
        )
    }

    fn finalize(&self, artifact: &Path, output_path: &Path) -> CoreResult<CompositionResult> {
        let stage = ComposeState::Finalizing.to_string();
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| compose_failed_error(&stage, e))?;
        }
        fs::copy(artifact, output_path).map_err(|e| compose_failed_error(&stage, e))?;

        let duration_seconds = self
            .prober
            .probe_duration(output_path)
            .map_err(|e| compose_failed_error(Stage::Probe.to_string(), e))?;
        let file_size_bytes = fs::metadata(output_path)
            .map_err(|e| compose_failed_error(&stage, e))?
            .len();

        Ok(CompositionResult {
            output_path: output_path.to_path_buf(),
            duration_seconds,
            file_size_bytes,
        })
    }

    fn enter(&self, state: ComposeState) {
        log::info!("State: {}", state);
        self.events.emit(Event::StageEntered {
            stage: state.to_string(),
        });
    }
}

/// Builds the command for `args` and runs it as `stage`.
fn execute<S: FfmpegSpawner>(
    spawner: &S,
    config: &CoreConfig,
    cancel: &CancelFlag,
    stage: &Stage,
    args: Vec<String>,
) -> CoreResult<()> {
    let builder = FfmpegCommandBuilder::new()
        .with_program(config.ffmpeg_path.as_deref())
        .args(args);
    log::debug!("Running {}: {}", stage, builder.display_command());
    run_stage(spawner, stage, builder.build(), config.stage_timeout, cancel)
}

/// Everything a scene render needs, borrowed so it can be shared across the
/// worker pool.
struct SceneRenderer<'a, S: FfmpegSpawner> {
    spawner: &'a S,
    config: &'a CoreConfig,
    events: &'a EventDispatcher,
    cancel: &'a CancelFlag,
    request: &'a CompositionRequest,
    width: u32,
    height: u32,
    workspace: &'a Workspace,
    completed: AtomicUsize,
}

impl<S: FfmpegSpawner> SceneRenderer<'_, S> {
    fn render_all(&self) -> CoreResult<Vec<PathBuf>> {
        let total = self.request.scenes.len();
        let jobs = self.config.parallel_jobs.min(total);
        if jobs <= 1 {
            return (0..total).map(|index| self.render(index)).collect();
        }

        log::info!("Rendering {} scenes on {} workers", total, jobs);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| compose_failed_error(ComposeState::RenderingScenes.to_string(), e))?;

        let abort = AtomicBool::new(false);
        let outcomes: Vec<Option<CoreResult<PathBuf>>> = pool.install(|| {
            (0..total)
                .into_par_iter()
                .map(|index| {
                    if abort.load(Ordering::SeqCst) {
                        return None;
                    }
                    let outcome = self.render(index);
                    if outcome.is_err() {
                        abort.store(true, Ordering::SeqCst);
                    }
                    Some(outcome)
                })
                .collect()
        });

        // Report the failure of the earliest scene that ran; skipped scenes
        // only exist when some scene failed.
        let mut files = Vec::with_capacity(total);
        let mut first_error = None;
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(path) => files.push(path),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(files),
        }
    }

    fn render(&self, index: usize) -> CoreResult<PathBuf> {
        let scene = &self.request.scenes[index];
        let stage = Stage::SceneRender {
            index,
            scene_id: scene.scene_id.clone(),
        };
        let plan = plan_scene(
            scene,
            self.width,
            self.height,
            self.request.frame_rate,
            self.config.strict_effects,
        )?;
        let output = self.workspace.scene_path(index);

        execute(
            self.spawner,
            self.config,
            self.cancel,
            &stage,
            plan.to_args(self.config, &output),
        )?;

        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.request.scenes.len();
        log::info!("Rendered {} ({}/{})", stage, completed, total);
        self.events.emit(Event::SceneRendered {
            index,
            scene_id: scene.scene_id.clone(),
            completed,
            total,
        });
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SceneInput, SceneVisual};
    use tempfile::tempdir;

    #[test]
    fn test_state_names() {
        assert_eq!(ComposeState::CheckingFiles.to_string(), "checking files");
        assert_eq!(ComposeState::MixingAudio.to_string(), "mixing audio");
    }

    #[test]
    fn test_check_files_reports_first_missing_path() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("a.png");
        fs::write(&present, b"png").unwrap();
        let missing_audio = dir.path().join("a.wav");
        let missing_bgm = dir.path().join("bgm.mp3");

        let scene = SceneInput::new(
            "a",
            1000,
            SceneVisual::Image {
                file_path: present,
                ken_burns: None,
            },
        )
        .with_audio(&missing_audio);
        let mut request =
            CompositionRequest::new(vec![scene], 720, 1280, dir.path().join("out.mp4"));
        request.bgm_path = Some(missing_bgm);

        match check_files(&request) {
            Err(CoreError::FileNotFound(path)) => assert_eq!(path, missing_audio),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_preflight_validates_before_checking_files() {
        let request = CompositionRequest::new(
            vec![SceneInput::new(
                "a",
                1000,
                SceneVisual::Video {
                    file_path: PathBuf::from("/missing/clip.mp4"),
                },
            )],
            0,
            1280,
            PathBuf::from("out.mp4"),
        );
        let err = preflight(&request, &CoreConfig::default()).unwrap_err();
        assert_eq!(err.code(), "INVALID_DIMENSIONS");
    }
}
