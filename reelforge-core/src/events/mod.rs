//! Structured progress events emitted by the composer.
//!
//! The composer reports what it is doing through an `EventDispatcher`; the
//! CLI (or any embedding service) registers handlers to render or forward
//! those events.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub mod json_handler;

pub use json_handler::JsonProgressHandler;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ComposeStarted {
        scene_count: usize,
        output_path: PathBuf,
    },

    /// The orchestrator moved to a new state (`"rendering scenes"`, `"concatenating"`, ...)
    StageEntered {
        stage: String,
    },

    /// Emitted once per finished scene; `completed` counts finished scenes,
    /// which under parallel rendering need not match `index + 1`.
    SceneRendered {
        index: usize,
        scene_id: String,
        completed: usize,
        total: usize,
    },

    ComposeComplete {
        output_path: PathBuf,
        duration_seconds: f64,
        file_size_bytes: u64,
        elapsed: Duration,
    },

    /// Emitted exactly once per failed run
    ComposeFailed {
        code: String,
        message: String,
    },
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
