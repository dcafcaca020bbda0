use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TodoError;
use crate::models::{Status, Task};

/// What the commands need from a task store.
pub trait TaskStore {
    /// Loads every task, in insertion order.
    fn load_all(&self) -> Result<Vec<Task>, TodoError>;

    /// Adds a new task. Fails with `Validation` if the title is empty or already taken.
    fn save(&mut self, task: Task) -> Result<(), TodoError> {
        let tasks = self.load_all()?;
        self.insert(tasks, task)
    }

    /// Like [`TaskStore::save`], for callers that already hold the loaded tasks.
    fn insert(&mut self, tasks: Vec<Task>, task: Task) -> Result<(), TodoError>;

    /// Moves the task with `title` to `status`, returning the updated task.
    fn update_status(&mut self, title: &str, status: Status) -> Result<Task, TodoError>;
}

/// Tasks kept as a pretty-printed JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> JsonStore {
        JsonStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the file with `tasks`.
    ///
    /// The data goes to a sibling temp file first and is renamed over the target, so a
    /// failed write never leaves a half-written store behind.
    pub fn save_all(&self, tasks: &[Task]) -> Result<(), TodoError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| TodoError::store(dir, e))?;
        }
        let s = serde_json::to_string_pretty(tasks).map_err(|e| TodoError::store(&self.path, e))?;

        let mut tmp = self.path.clone();
        tmp.set_extension("json.tmp");
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .map_err(|e| TodoError::store(&tmp, e))?;
        f.write_all(s.as_bytes()).map_err(|e| TodoError::store(&tmp, e))?;
        f.sync_all().map_err(|e| TodoError::store(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| TodoError::store(&self.path, e))?;

        debug!(path = %self.path.display(), count = tasks.len(), "saved tasks");
        Ok(())
    }
}

impl TaskStore for JsonStore {
    fn load_all(&self) -> Result<Vec<Task>, TodoError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut f = OpenOptions::new()
            .read(true)
            .open(&self.path)
            .map_err(|e| TodoError::store(&self.path, e))?;
        let mut s = String::new();
        f.read_to_string(&mut s).map_err(|e| TodoError::store(&self.path, e))?;
        if s.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tasks: Vec<Task> = serde_json::from_str(&s).map_err(|e| TodoError::store(&self.path, e))?;
        let mut seen = HashSet::new();
        for t in &tasks {
            if !seen.insert(t.title.as_str()) {
                return Err(TodoError::store(
                    &self.path,
                    format!("duplicate task title '{}'", t.title),
                ));
            }
        }
        debug!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    fn insert(&mut self, mut tasks: Vec<Task>, task: Task) -> Result<(), TodoError> {
        validate_new_title(&task.title, &tasks)?;
        tasks.push(task);
        self.save_all(&tasks)
    }

    fn update_status(&mut self, title: &str, status: Status) -> Result<Task, TodoError> {
        let mut tasks = self.load_all()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.title == title)
            .ok_or_else(|| TodoError::NotFound(title.to_string()))?;
        task.transition(status)?;
        let updated = task.clone();
        self.save_all(&tasks)?;
        Ok(updated)
    }
}

/// Checks that `title` is non-empty and not used by any of `tasks`.
pub fn validate_new_title(title: &str, tasks: &[Task]) -> Result<(), TodoError> {
    if title.trim().is_empty() {
        return Err(TodoError::Validation("Task title cannot be empty".to_string()));
    }
    if tasks.iter().any(|t| t.title == title) {
        return Err(TodoError::Validation(format!("A task titled '{}' already exists", title)));
    }
    Ok(())
}

/// One accept/reject answer about a suggestion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeedbackEntry {
    pub title: String,
    pub suggested_at: NaiveDateTime,
    pub accepted: bool,
}

/// Append-only JSON Lines log of suggestion feedback.
#[derive(Debug, Clone)]
pub struct FeedbackLog {
    path: PathBuf,
}

impl FeedbackLog {
    pub fn new(path: impl Into<PathBuf>) -> FeedbackLog {
        FeedbackLog { path: path.into() }
    }

    pub fn append(&self, entry: &FeedbackEntry) -> Result<(), TodoError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| TodoError::store(dir, e))?;
        }
        let line = serde_json::to_string(entry).map_err(|e| TodoError::store(&self.path, e))?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| TodoError::store(&self.path, e))?;
        writeln!(f, "{line}").map_err(|e| TodoError::store(&self.path, e))?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<FeedbackEntry>, TodoError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let f = OpenOptions::new()
            .read(true)
            .open(&self.path)
            .map_err(|e| TodoError::store(&self.path, e))?;
        let mut entries = Vec::new();
        for line in BufReader::new(f).lines() {
            let line = line.map_err(|e| TodoError::store(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line).map_err(|e| TodoError::store(&self.path, e))?);
        }
        Ok(entries)
    }
}
