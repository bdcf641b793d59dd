//! Terminal output helpers and the human-readable progress handler.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use reelforge_core::events::{Event, EventHandler};
use reelforge_core::{CompositionResult, format_bytes, format_duration};
use std::fmt::Display;
use std::sync::Mutex;
use std::time::Duration;

/// Print a heading with colored styling
pub fn print_heading(text: &str) {
    println!("\n{}", style(format!("----- {} -----", text.to_uppercase())).cyan().bold());
}

/// Print an info line with label and value, with the label colored
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("  {:<14} {}", style(format!("{label}:")).cyan(), value);
}

pub fn print_success(message: &str) {
    println!("  {} {}", style("✓").green().bold(), style(message).bold());
}

/// Prints the summary of a finished composition.
pub fn print_result(result: &CompositionResult) {
    print_heading("Composition complete");
    print_info("Output", result.output_path.display());
    print_info("Duration", format_duration(result.duration_seconds));
    print_info("Size", format_bytes(result.file_size_bytes));
}

/// Scene progress bar for a run of `total` scenes.
pub fn create_scene_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("  Rendering: {pos}/{len} [{bar:30}] ({elapsed}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##.");
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints stage transitions and drives a scene progress bar.
#[derive(Debug, Default)]
pub struct TerminalEventHandler {
    progress_bar: Mutex<Option<ProgressBar>>,
}

impl TerminalEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current bar position, if a run is in progress.
    pub fn position(&self) -> Option<u64> {
        self.progress_bar
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(ProgressBar::position))
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.progress_bar.lock().ok().and_then(|mut guard| guard.take())
    }
}

impl EventHandler for TerminalEventHandler {
    fn handle(&self, event: &Event) {
        match event {
            Event::ComposeStarted {
                scene_count,
                output_path,
            } => {
                print_heading("Composing");
                print_info("Scenes", scene_count);
                print_info("Output", output_path.display());
                if let Ok(mut guard) = self.progress_bar.lock() {
                    *guard = Some(create_scene_progress_bar(*scene_count as u64));
                }
            }
            Event::StageEntered { stage } => {
                let line = format!("{} {}", style("▶").blue().bold(), stage);
                match self.progress_bar.lock().ok().as_deref() {
                    Some(Some(pb)) => pb.println(line),
                    _ => println!("{line}"),
                }
            }
            Event::SceneRendered {
                scene_id,
                completed,
                ..
            } => {
                if let Ok(guard) = self.progress_bar.lock() {
                    if let Some(pb) = guard.as_ref() {
                        pb.set_position(*completed as u64);
                        pb.set_message(format!("'{scene_id}'"));
                    }
                }
            }
            Event::ComposeComplete { elapsed, .. } => {
                if let Some(pb) = self.take_bar() {
                    pb.finish_and_clear();
                }
                print_success(&format!(
                    "Finished in {}",
                    format_duration(elapsed.as_secs_f64())
                ));
            }
            // The error itself is reported once by the caller.
            Event::ComposeFailed { .. } => {
                if let Some(pb) = self.take_bar() {
                    pb.abandon();
                }
            }
        }
    }
}
