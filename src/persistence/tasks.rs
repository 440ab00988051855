use crate::domain::{validate_task_name, Task, TrackerError};
use crate::persistence::csv::{split_row, write_row};
use crate::persistence::files::{atomic_write, read_file};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Column order of the tasks CSV. Timestamps are RFC 3339.
pub const TASKS_HEADER: &str = "name,total_tracked_seconds,created_at";

/// Ordered collection of tasks backed by a CSV file.
///
/// Tasks keep their insertion order. Every mutation rewrites the whole
/// file through an atomic replace, so a crash mid-write never leaves a
/// half-written store behind.
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Open the store at `path`, reading all tasks. A missing file yields
    /// an empty store; the file is created on first mutation.
    pub fn open(path: PathBuf) -> Result<Self> {
        let content = read_file(&path)?;
        let tasks = parse_tasks(&content);
        Ok(Self { path, tasks })
    }

    /// Return the task with this name, creating it with a zero total if
    /// absent. Only a creation touches the file.
    pub fn upsert(&mut self, name: &str, now: DateTime<Local>) -> Result<Task> {
        let name = validate_task_name(name)?;

        if let Some(task) = self.tasks.iter().find(|t| t.name == name) {
            return Ok(task.clone());
        }

        let task = Task::new(name.to_string(), now);
        self.tasks.push(task.clone());
        self.persist()?;
        tracing::info!(task = name, "created task");
        Ok(task)
    }

    /// Add completed session time to a task's total and persist.
    pub fn add_time(&mut self, name: &str, seconds: f64) -> Result<()> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| TrackerError::TaskNotFound(name.to_string()))?;

        task.add_time(seconds);
        self.persist()?;
        tracing::debug!(task = name, seconds, "added time to task");
        Ok(())
    }

    /// Look up a task by name.
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// All tasks in insertion order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    /// Remove a task and persist. Fails with `TaskNotFound` if absent.
    ///
    /// The task's sessions are a separate concern; callers that want them
    /// gone must also purge the session log.
    pub fn remove(&mut self, name: &str) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| TrackerError::TaskNotFound(name.to_string()))?;

        let task = self.tasks.remove(index);
        self.persist()?;
        tracing::info!(task = name, "removed task");
        Ok(task)
    }

    /// Re-read the backing file, discarding in-memory state. Required
    /// after a restore replaces the file underneath us.
    pub fn reload(&mut self) -> Result<()> {
        let content = read_file(&self.path)?;
        self.tasks = parse_tasks(&content);
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let content = serialize_tasks(&self.tasks);
        atomic_write(&self.path, &content)
            .with_context(|| format!("Failed to persist task store: {}", self.path.display()))
    }
}

/// Serialize tasks into CSV, header first, one row per task.
pub fn serialize_tasks(tasks: &[Task]) -> String {
    let mut output = String::new();
    output.push_str(TASKS_HEADER);
    output.push('\n');

    for task in tasks {
        let row = write_row(&[
            task.name.clone(),
            format!("{:.2}", task.total_seconds),
            task.created_at.to_rfc3339(),
        ]);
        output.push_str(&row);
        output.push('\n');
    }

    output
}

/// Parse the tasks CSV. Rows that fail validation are skipped with a
/// warning; a broken row must not block the rest of the store.
pub fn parse_tasks(content: &str) -> Vec<Task> {
    let mut tasks = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() || line == TASKS_HEADER {
            continue;
        }

        match parse_task_row(line) {
            Ok(task) => tasks.push(task),
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "skipping bad task row");
            }
        }
    }

    tasks
}

fn parse_task_row(line: &str) -> Result<Task, TrackerError> {
    let fields = split_row(line);
    if fields.len() != 3 {
        return Err(TrackerError::CorruptRecord(format!(
            "expected 3 columns, got {}",
            fields.len()
        )));
    }

    let name = fields[0].trim();
    if name.is_empty() {
        return Err(TrackerError::CorruptRecord("empty task name".to_string()));
    }

    let total_seconds: f64 = fields[1]
        .trim()
        .parse()
        .map_err(|_| TrackerError::CorruptRecord(format!("bad total: {}", fields[1])))?;
    if !total_seconds.is_finite() || total_seconds < 0.0 {
        return Err(TrackerError::CorruptRecord(format!(
            "negative total: {}",
            fields[1]
        )));
    }

    let created_at = DateTime::parse_from_rfc3339(fields[2].trim())
        .map_err(|_| TrackerError::CorruptRecord(format!("bad timestamp: {}", fields[2])))?
        .with_timezone(&Local);

    Ok(Task {
        name: name.to_string(),
        total_seconds,
        created_at,
    })
}
