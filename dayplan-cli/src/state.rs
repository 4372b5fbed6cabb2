use anyhow::{Context, Result};
use dayplan_core::{Settings, Task, TaskStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub fn dayplan_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DAYPLAN_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".dayplan"))
}

pub fn ensure_dayplan_home() -> Result<PathBuf> {
    let dir = dayplan_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Tasks and settings as pretty JSON files under one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(ensure_dayplan_home()?))
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.dir.join("tasks.json")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join("settings.json")
    }
}

fn read_json<T: DeserializeOwned>(p: &Path) -> Result<Option<T>> {
    if !p.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    if s.trim().is_empty() {
        return Ok(None);
    }
    let v = serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    Ok(Some(v))
}

fn write_json<T: Serialize + ?Sized>(p: &Path, value: &T) -> Result<()> {
    if let Some(parent) = p.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    // write-then-rename so a crash never leaves a half-written file
    let tmp = p.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, p).with_context(|| format!("rename {}", p.display()))?;
    Ok(())
}

impl TaskStore for JsonFileStore {
    fn get_tasks(&self) -> Result<Vec<Task>> {
        Ok(read_json(&self.tasks_path())?.unwrap_or_default())
    }

    fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        write_json(&self.tasks_path(), tasks)
    }

    fn get_settings(&self) -> Result<Settings> {
        Ok(read_json(&self.settings_path())?.unwrap_or_default())
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        write_json(&self.settings_path(), settings)
    }
}
