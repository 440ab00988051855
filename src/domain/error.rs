use thiserror::Error;

/// Errors surfaced by tracker and store operations.
///
/// I/O failures travel separately as `anyhow` errors with path context;
/// these variants are the ones a front-end is expected to match on.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// No task with this name exists in the store.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// No backup with this id exists in the backup directory.
    #[error("backup not found: {0}")]
    BackupNotFound(String),

    /// A session is already in progress; it must be stopped first.
    #[error("already tracking \"{0}\" - stop it before starting another task")]
    AlreadyTracking(String),

    /// Stop was requested but no session is in progress.
    #[error("no tracking session in progress")]
    NotTracking,

    /// A session ended before it started (clock moved backwards).
    #[error("session for \"{task}\" ended {seconds}s before it started")]
    InvalidDuration { task: String, seconds: i64 },

    /// A stored row could not be parsed back into a record.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// Task name failed validation.
    #[error("invalid task name: {0}")]
    InvalidTaskName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackerError::TaskNotFound("Writing".to_string());
        assert_eq!(err.to_string(), "task not found: Writing");

        let err = TrackerError::AlreadyTracking("Writing".to_string());
        assert!(err.to_string().contains("already tracking"));

        let err = TrackerError::InvalidDuration {
            task: "Writing".to_string(),
            seconds: 42,
        };
        assert!(err.to_string().contains("42s before it started"));
    }
}
