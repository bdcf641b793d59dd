//! JSON progress handler for structured progress output
//!
//! Writes one JSON object per line for consumption by whatever drives the
//! composer (a job runner, the API server, a shell pipeline).

use super::{Event, EventHandler};
use serde_json::json;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event handler that outputs progress events as structured JSON to stdout
pub struct JsonProgressHandler {
    output: Mutex<Box<dyn Write + Send>>,
}

impl JsonProgressHandler {
    /// Create a new JSON progress handler that writes to stdout
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a new JSON progress handler with a custom writer
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    /// Get current timestamp as seconds since Unix epoch
    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn write_json(&self, value: serde_json::Value) {
        if let Ok(mut output) = self.output.lock() {
            if let Ok(json_str) = serde_json::to_string(&value) {
                let _ = writeln!(output, "{json_str}");
                let _ = output.flush();
            }
        }
    }
}

impl Default for JsonProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for JsonProgressHandler {
    fn handle(&self, event: &Event) {
        let timestamp = Self::get_timestamp();

        let value = match event {
            Event::ComposeStarted {
                scene_count,
                output_path,
            } => json!({
                "type": "compose_started",
                "scene_count": scene_count,
                "output_path": output_path.display().to_string(),
                "timestamp": timestamp
            }),

            Event::StageEntered { stage } => json!({
                "type": "stage",
                "stage": stage,
                "timestamp": timestamp
            }),

            Event::SceneRendered {
                index,
                scene_id,
                completed,
                total,
            } => json!({
                "type": "scene_rendered",
                "index": index,
                "scene_id": scene_id,
                "completed": completed,
                "total": total,
                "percent": if *total > 0 {
                    (*completed as f64 / *total as f64 * 100.0).round()
                } else {
                    0.0
                },
                "timestamp": timestamp
            }),

            Event::ComposeComplete {
                output_path,
                duration_seconds,
                file_size_bytes,
                elapsed,
            } => json!({
                "type": "compose_complete",
                "output_path": output_path.display().to_string(),
                "duration_seconds": duration_seconds,
                "file_size_bytes": file_size_bytes,
                "elapsed_seconds": elapsed.as_secs_f64(),
                "timestamp": timestamp
            }),

            Event::ComposeFailed { code, message } => json!({
                "type": "error",
                "code": code,
                "message": message,
                "timestamp": timestamp
            }),
        };

        self.write_json(value);
    }
}
