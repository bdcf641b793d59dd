// ============================================================================
// reelforge-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Stage Execution
//
// This module provides abstractions for spawning and interacting with FFmpeg
// processes, and `run_stage`, which executes exactly one renderer invocation.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
// - Stage: Which pipeline step an invocation belongs to
// - CancelFlag: Shared flag that aborts the running stage
//
// EXECUTION MODEL:
// The process's event stream is drained on a reader thread and forwarded over
// a channel. The calling thread polls that channel on a short tick so it can
// enforce the stage deadline and observe cancellation while the process runs.
// Log and error lines are accumulated and attached to `RenderFailed`.

use crate::error::{
    CoreError, CoreResult, compose_failed_error, render_failed_error, spawn_failed_error,
};

use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;

use std::fmt;
use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// How often the stage runner checks the deadline and cancel flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// --- FFmpeg Execution Abstraction ---

/// Stream of events produced by a running ffmpeg process.
pub type EventStream = Box<dyn Iterator<Item = FfmpegEvent> + Send>;

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Takes the process's event stream. Called once per process.
    fn take_events(&mut self) -> io::Result<EventStream>;

    /// Terminates the process.
    fn kill(&mut self) -> io::Result<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

/// Trait representing something that can spawn an FfmpegProcess.
///
/// Spawners are shared across the scene-render worker pool, hence `Sync`.
pub trait FfmpegSpawner: Sync {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> io::Result<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn take_events(&mut self) -> io::Result<EventStream> {
        let iterator = self
            .0
            .iter()
            .map_err(|e| io::Error::other(format!("failed to read ffmpeg output: {e}")))?;
        Ok(Box::new(iterator))
    }

    fn kill(&mut self) -> io::Result<()> {
        self.0.kill()
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        self.0.wait()
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> io::Result<Self::Process> {
        cmd.spawn().map(SidecarProcess)
    }
}

// --- Stages ---

/// One discrete renderer invocation within a composition run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    SceneRender { index: usize, scene_id: String },
    Concat,
    AudioMix,
    Probe,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SceneRender { index, scene_id } => {
                write!(f, "scene {index} ('{scene_id}') render")
            }
            Self::Concat => f.write_str("concat"),
            Self::AudioMix => f.write_str("audio mix"),
            Self::Probe => f.write_str("duration probe"),
        }
    }
}

/// Cooperative cancellation shared between the caller and a running composition.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. The running stage's process is killed.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// --- Stage Execution ---

enum Outcome {
    Exited,
    Cancelled,
    TimedOut(Duration),
}

/// Runs one stage to completion.
///
/// Succeeds only when the process exits with status 0. There is no retry.
/// A non-zero exit yields `RenderFailed` carrying every log and error line the
/// process emitted; a process that cannot be started yields `SpawnFailed`.
/// When `timeout` elapses or `cancel` is raised, the process is killed and
/// `RenderTimeout` or `Cancelled` is returned.
pub fn run_stage<S: FfmpegSpawner>(
    spawner: &S,
    stage: &Stage,
    cmd: FfmpegCommand,
    timeout: Option<Duration>,
    cancel: &CancelFlag,
) -> CoreResult<()> {
    let stage_name = stage.to_string();

    if cancel.is_cancelled() {
        return Err(CoreError::Cancelled { stage: stage_name });
    }

    let mut process = spawner.spawn(cmd).map_err(|e| {
        log::error!("Failed to start ffmpeg for {}: {}", stage_name, e);
        spawn_failed_error(&stage_name, e)
    })?;

    let events = match process.take_events() {
        Ok(events) => events,
        Err(e) => {
            terminate(&mut process, &stage_name);
            return Err(spawn_failed_error(&stage_name, e));
        }
    };

    let (tx, rx) = mpsc::channel();
    let reader = thread::spawn(move || {
        for event in events {
            if tx.send(event).is_err() {
                break;
            }
        }
    });

    let started = Instant::now();
    let mut diagnostics = String::new();
    let outcome = loop {
        if cancel.is_cancelled() {
            break Outcome::Cancelled;
        }
        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                break Outcome::TimedOut(limit);
            }
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(event) => record_event(&stage_name, event, &mut diagnostics),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break Outcome::Exited,
        }
    };

    match outcome {
        Outcome::Exited => {
            join_reader(reader, &stage_name);
            let status = process
                .wait()
                .map_err(|e| compose_failed_error(&stage_name, e))?;
            if status.success() {
                log::debug!("{} finished in {:.1}s", stage_name, started.elapsed().as_secs_f64());
                Ok(())
            } else {
                log::error!("{} failed: {}", stage_name, status);
                Err(render_failed_error(stage_name, status.code(), diagnostics))
            }
        }
        Outcome::Cancelled => {
            log::warn!("Cancelling {}", stage_name);
            terminate(&mut process, &stage_name);
            drop(rx);
            join_reader(reader, &stage_name);
            Err(CoreError::Cancelled { stage: stage_name })
        }
        Outcome::TimedOut(limit) => {
            log::error!("{} exceeded its {}s deadline, killing ffmpeg", stage_name, limit.as_secs());
            terminate(&mut process, &stage_name);
            drop(rx);
            join_reader(reader, &stage_name);
            Err(CoreError::RenderTimeout {
                stage: stage_name,
                timeout_secs: limit.as_secs(),
            })
        }
    }
}

fn record_event(stage_name: &str, event: FfmpegEvent, diagnostics: &mut String) {
    match event {
        FfmpegEvent::Log(_level, line) => {
            log::trace!("[{}] {}", stage_name, line);
            diagnostics.push_str(&line);
            diagnostics.push('\n');
        }
        FfmpegEvent::Error(line) => {
            log::debug!("[{}] ffmpeg error: {}", stage_name, line);
            diagnostics.push_str(&line);
            diagnostics.push('\n');
        }
        _ => {}
    }
}

fn terminate<P: FfmpegProcess>(process: &mut P, stage_name: &str) {
    if let Err(e) = process.kill() {
        log::warn!("Failed to kill ffmpeg for {}: {}", stage_name, e);
    }
    if let Err(e) = process.wait() {
        log::warn!("Failed to reap ffmpeg for {}: {}", stage_name, e);
    }
}

fn join_reader(reader: thread::JoinHandle<()>, stage_name: &str) {
    if reader.join().is_err() {
        log::warn!("ffmpeg output reader for {} panicked", stage_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_names() {
        let stage = Stage::SceneRender {
            index: 2,
            scene_id: "outro".to_string(),
        };
        assert_eq!(stage.to_string(), "scene 2 ('outro') render");
        assert_eq!(Stage::Concat.to_string(), "concat");
        assert_eq!(Stage::AudioMix.to_string(), "audio mix");
        assert_eq!(Stage::Probe.to_string(), "duration probe");
    }

    #[test]
    fn test_cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_record_event_keeps_log_and_error_lines() {
        let mut diagnostics = String::new();
        record_event(
            "concat",
            FfmpegEvent::Error("list.txt: Invalid data found".to_string()),
            &mut diagnostics,
        );
        record_event("concat", FfmpegEvent::Done, &mut diagnostics);
        assert_eq!(diagnostics, "list.txt: Invalid data found\n");
    }
}
