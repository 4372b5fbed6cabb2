//! Persistence seam. Backends (JSON files, sqlite, ...) live outside the core.

use std::sync::Mutex;

use anyhow::Result;

use crate::task::{Settings, Task};

/// Key/value store holding the task list and settings.
///
/// Implementations must round-trip every `Task` field verbatim.
pub trait TaskStore {
    fn get_tasks(&self) -> Result<Vec<Task>>;
    fn save_tasks(&self, tasks: &[Task]) -> Result<()>;
    fn get_settings(&self) -> Result<Settings>;
    fn save_settings(&self, settings: &Settings) -> Result<()>;
}

/// In-memory store, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: Mutex<Vec<Task>>,
    settings: Mutex<Option<Settings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            settings: Mutex::new(None),
        }
    }
}

impl TaskStore for MemoryStore {
    fn get_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        *self.tasks.lock().unwrap_or_else(|e| e.into_inner()) = tasks.to_vec();
        Ok(())
    }

    fn get_settings(&self) -> Result<Settings> {
        let settings = *self.settings.lock().unwrap_or_else(|e| e.into_inner());
        Ok(settings.unwrap_or_default())
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        *self.settings.lock().unwrap_or_else(|e| e.into_inner()) = Some(*settings);
        Ok(())
    }
}
