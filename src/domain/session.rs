use super::error::TrackerError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A tracking session that has been started but not yet stopped.
///
/// Serialized into the tracker state file so an in-progress session
/// survives between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub task_name: String,
    pub started_at: DateTime<Local>,
}

impl ActiveSession {
    pub fn new(task_name: String, started_at: DateTime<Local>) -> Self {
        Self {
            task_name,
            started_at,
        }
    }

    /// Elapsed wall-clock seconds since the session started.
    ///
    /// Side-effect free; safe to call repeatedly for live display.
    /// Returns 0 if the clock has moved behind the start time.
    pub fn elapsed_seconds(&self, now: DateTime<Local>) -> f64 {
        let secs = now.signed_duration_since(self.started_at).num_seconds();
        secs.max(0) as f64
    }

    /// Finalize the session: set its end time and compute the duration.
    ///
    /// Fails with `InvalidDuration` if `now` is before the start time.
    /// The sealed session is immutable from here on.
    pub fn seal(self, now: DateTime<Local>) -> Result<Session, TrackerError> {
        let elapsed = now.signed_duration_since(self.started_at);
        let secs = elapsed.num_seconds();
        if secs < 0 {
            return Err(TrackerError::InvalidDuration {
                task: self.task_name,
                seconds: -secs,
            });
        }
        Ok(Session {
            task_name: self.task_name,
            started_at: self.started_at,
            ended_at: now,
            duration_seconds: secs as f64,
        })
    }

    /// Seal with the duration forced to zero. Used after a clock anomaly
    /// so the session is still recorded rather than discarded.
    pub fn seal_clamped(self, now: DateTime<Local>) -> Session {
        Session {
            task_name: self.task_name,
            started_at: self.started_at,
            ended_at: now,
            duration_seconds: 0.0,
        }
    }
}

/// One completed start/stop interval attributed to a task.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub task_name: String,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    /// Duration in seconds, computed once when the session was sealed.
    pub duration_seconds: f64,
}

impl Session {
    /// Duration in whole minutes (for display).
    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }
}
