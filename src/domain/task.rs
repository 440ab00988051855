use super::error::TrackerError;
use chrono::{DateTime, Local};

/// Maximum accepted task name length in characters.
pub const MAX_TASK_NAME_LEN: usize = 100;

/// A named activity accumulating tracked time.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique task name.
    pub name: String,
    /// Total tracked time across all completed sessions, in seconds.
    pub total_seconds: f64,
    /// When the task was first created.
    pub created_at: DateTime<Local>,
}

impl Task {
    pub fn new(name: String, created_at: DateTime<Local>) -> Self {
        Self {
            name,
            total_seconds: 0.0,
            created_at,
        }
    }

    /// Add completed session time to the running total.
    pub fn add_time(&mut self, seconds: f64) {
        self.total_seconds += seconds;
    }

    /// Total tracked time in whole minutes (for display).
    pub fn total_minutes(&self) -> f64 {
        self.total_seconds / 60.0
    }
}

/// Validate a task name: non-empty after trimming, bounded length.
///
/// Returns the trimmed name on success so callers store a canonical form.
pub fn validate_task_name(name: &str) -> Result<&str, TrackerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::InvalidTaskName(
            "name cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_TASK_NAME_LEN {
        return Err(TrackerError::InvalidTaskName(format!(
            "name too long (max {} characters)",
            MAX_TASK_NAME_LEN
        )));
    }
    Ok(trimmed)
}
