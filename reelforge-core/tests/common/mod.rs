// reelforge-core/tests/common/mod.rs
//
// Shared fixtures for the composer integration tests.

#![allow(dead_code)]

use reelforge_core::config::{CoreConfig, CoreConfigBuilder};
use reelforge_core::events::{Event, EventHandler};
use reelforge_core::{SceneInput, SceneVisual};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Creates a small placeholder asset file.
pub fn create_dummy_file(dir: &Path, filename: &str) -> PathBuf {
    let file_path = dir.join(filename);
    let mut file = File::create(&file_path).expect("Failed to create dummy file");
    file.write_all(b"dummy content")
        .expect("Failed to write dummy content");
    file_path
}

pub fn solid_scene(id: &str, duration_ms: i64) -> SceneInput {
    SceneInput::new(
        id,
        duration_ms,
        SceneVisual::SolidColor {
            color: "#000000".to_string(),
        },
    )
}

/// Config whose workspaces are created under `base`.
pub fn config_in(base: &Path) -> CoreConfig {
    CoreConfigBuilder::new().temp_dir(base.to_path_buf()).build()
}

/// Number of entries left under a workspace base directory.
pub fn leftover_entries(base: &Path) -> usize {
    std::fs::read_dir(base).map(|rd| rd.count()).unwrap_or(0)
}

/// Records every event for later inspection.
#[derive(Default)]
pub struct EventRecorder {
    events: Mutex<Vec<Event>>,
}

impl EventRecorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::ComposeFailed { code, message } => Some((code, message)),
                _ => None,
            })
            .collect()
    }

    pub fn stages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::StageEntered { stage } => Some(stage),
                _ => None,
            })
            .collect()
    }
}

impl EventHandler for EventRecorder {
    fn handle(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}
