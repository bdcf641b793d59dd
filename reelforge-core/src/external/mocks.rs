// reelforge-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// This module is only compiled when the "test-mocks" feature is enabled.
#![cfg(feature = "test-mocks")]

use super::*;
use crate::error::{CoreError, CoreResult};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::collections::HashMap;
use std::io;
use std::os::unix::process::ExitStatusExt; // For ExitStatus::from_raw
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Raw wait status for a normal exit with `code`.
fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

/// Raw wait status for a process terminated by SIGKILL.
fn killed_status() -> ExitStatus {
    ExitStatus::from_raw(9)
}

/// Mock implementation of FfmpegProcess.
pub struct MockFfmpegProcess {
    /// Events to emit from the event stream.
    events_to_emit: Vec<FfmpegEvent>,
    /// Exit status to return when wait is called.
    exit_status: ExitStatus,
    /// Keep the event stream open until the process is killed.
    hang: bool,
    killed: Arc<AtomicBool>,
}

impl MockFfmpegProcess {
    fn new(events: Vec<FfmpegEvent>, exit_status: ExitStatus, hang: bool) -> Self {
        Self {
            events_to_emit: events,
            exit_status,
            hang,
            killed: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct HangingEvents {
    pending: std::vec::IntoIter<FfmpegEvent>,
    killed: Arc<AtomicBool>,
}

impl Iterator for HangingEvents {
    type Item = FfmpegEvent;

    fn next(&mut self) -> Option<FfmpegEvent> {
        if let Some(event) = self.pending.next() {
            return Some(event);
        }
        while !self.killed.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(5));
        }
        None
    }
}

impl FfmpegProcess for MockFfmpegProcess {
    fn take_events(&mut self) -> io::Result<EventStream> {
        let events = std::mem::take(&mut self.events_to_emit);
        if self.hang {
            Ok(Box::new(HangingEvents {
                pending: events.into_iter(),
                killed: Arc::clone(&self.killed),
            }))
        } else {
            Ok(Box::new(events.into_iter()))
        }
    }

    fn kill(&mut self) -> io::Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        if self.killed.load(Ordering::SeqCst) {
            Ok(killed_status())
        } else {
            Ok(self.exit_status)
        }
    }
}

/// Represents an expected ffmpeg command call and its mock result.
pub struct MockFfmpegExpectation {
    pub arg_pattern: String,
    pub result: io::Result<MockFfmpegProcess>,
    pub create_dummy_output: bool,
    /// Simulated run time before the spawn returns
    pub delay: Duration,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
///
/// Each call is matched against the first unused expectation whose pattern
/// occurs in any argument. Unmatched calls panic.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Arc<Mutex<Vec<MockFfmpegExpectation>>>,
    received_calls: Arc<Mutex<Vec<Vec<String>>>>,
    concat_lists: Arc<Mutex<Vec<String>>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_expectation(&self, expectation: MockFfmpegExpectation) {
        self.expectations.lock().unwrap().push(expectation);
    }

    pub fn add_success_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        create_dummy_output: bool,
    ) {
        self.add_expectation(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result: Ok(MockFfmpegProcess::new(events, exit_status(0), false)),
            create_dummy_output,
            delay: Duration::ZERO,
        });
    }

    /// Succeeds after `delay`, writing the dummy output.
    pub fn add_delayed_success_expectation(&self, arg_pattern: &str, delay: Duration) {
        self.add_expectation(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result: Ok(MockFfmpegProcess::new(Vec::new(), exit_status(0), false)),
            create_dummy_output: true,
            delay,
        });
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: io::Error) {
        self.add_expectation(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result: Err(error),
            create_dummy_output: false,
            delay: Duration::ZERO,
        });
    }

    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        exit_code: i32,
    ) {
        self.add_expectation(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result: Ok(MockFfmpegProcess::new(events, exit_status(exit_code), false)),
            create_dummy_output: false,
            delay: Duration::ZERO,
        });
    }

    /// A process that never exits on its own; only a kill ends it.
    pub fn add_hanging_expectation(&self, arg_pattern: &str) {
        self.add_expectation(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result: Ok(MockFfmpegProcess::new(Vec::new(), exit_status(0), true)),
            create_dummy_output: false,
            delay: Duration::ZERO,
        });
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.lock().unwrap().clone()
    }

    /// Contents of every concat list file, read at spawn time.
    pub fn get_concat_lists(&self) -> Vec<String> {
        self.concat_lists.lock().unwrap().clone()
    }

    pub fn remaining_expectations(&self) -> usize {
        self.expectations.lock().unwrap().len()
    }

    fn capture_concat_list(&self, args: &[String]) {
        let is_concat = args.windows(2).any(|w| w[0] == "-f" && w[1] == "concat");
        if !is_concat {
            return;
        }
        if let Some(list) = args.windows(2).find(|w| w[0] == "-i").map(|w| &w[1]) {
            match std::fs::read_to_string(list) {
                Ok(contents) => self.concat_lists.lock().unwrap().push(contents),
                Err(e) => log::error!("MockFfmpegSpawner failed to read concat list {}: {}", list, e),
            }
        }
    }
}

fn create_dummy_output(args: &[String]) {
    if let Some(output_path_str) = args.last() {
        let output_path = PathBuf::from(output_path_str);
        if let Some(parent) = output_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("MockFfmpegSpawner failed to create parent dir {:?}: {}", parent, e);
            }
        }
        match std::fs::write(&output_path, b"mock media") {
            Ok(()) => log::info!("MockFfmpegSpawner created dummy output file: {:?}", output_path),
            Err(e) => log::error!(
                "MockFfmpegSpawner failed to create dummy output file {:?}: {}",
                output_path,
                e
            ),
        }
    } else {
        log::warn!("MockFfmpegSpawner couldn't find output path in args to create dummy file.");
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> io::Result<Self::Process> {
        let args: Vec<String> = cmd
            .as_inner()
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.received_calls.lock().unwrap().push(args.clone());
        self.capture_concat_list(&args);

        let expectation = {
            let mut expectations = self.expectations.lock().unwrap();
            let found_index = expectations
                .iter()
                .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));
            match found_index {
                Some(index) => expectations.remove(index),
                None => {
                    log::error!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
                    panic!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
                }
            }
        };
        log::info!(
            "MockFfmpegSpawner: Matched expectation with pattern '{}'",
            expectation.arg_pattern
        );

        if !expectation.delay.is_zero() {
            thread::sleep(expectation.delay);
        }

        match expectation.result {
            Ok(process) => {
                if expectation.create_dummy_output {
                    create_dummy_output(&args);
                }
                Ok(process)
            }
            Err(err) => {
                log::warn!(
                    "MockFfmpegSpawner simulating spawn error for pattern '{}': {:?}",
                    expectation.arg_pattern,
                    err
                );
                Err(err)
            }
        }
    }
}

/// Mock implementation of FfprobeExecutor.
///
/// Paths without a scripted duration get `default_duration`, or a probe error
/// when none is set.
#[derive(Clone, Default)]
pub struct MockFfprobeExecutor {
    durations: Arc<Mutex<HashMap<PathBuf, f64>>>,
    default_duration: Option<f64>,
    probed: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFfprobeExecutor {
    pub fn new() -> Self {
        Default::default()
    }

    /// Every probe returns `seconds` unless a path-specific value is set.
    pub fn with_default_duration(seconds: f64) -> Self {
        Self {
            default_duration: Some(seconds),
            ..Default::default()
        }
    }

    pub fn expect_duration(&self, input_path: &Path, seconds: f64) {
        self.durations
            .lock()
            .unwrap()
            .insert(input_path.to_path_buf(), seconds);
    }

    pub fn get_probed_paths(&self) -> Vec<PathBuf> {
        self.probed.lock().unwrap().clone()
    }
}

impl FfprobeExecutor for MockFfprobeExecutor {
    fn probe_duration(&self, input_path: &Path) -> CoreResult<f64> {
        log::info!("MockFfprobeExecutor::probe_duration called for: {}", input_path.display());
        self.probed.lock().unwrap().push(input_path.to_path_buf());
        match self.durations.lock().unwrap().get(input_path) {
            Some(seconds) => Ok(*seconds),
            None => self.default_duration.ok_or_else(|| {
                CoreError::Probe(format!(
                    "MockFfprobeExecutor: No expectation set for path {}",
                    input_path.display()
                ))
            }),
        }
    }
}
