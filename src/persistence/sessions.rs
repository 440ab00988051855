use crate::domain::{Session, TrackerError};
use crate::persistence::csv::{split_row, write_row};
use crate::persistence::files::{append_to_file, atomic_write, read_file};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use std::path::PathBuf;

/// Column order of the sessions CSV. Timestamps are RFC 3339.
pub const SESSIONS_HEADER: &str = "task_name,start_time,end_time,duration_seconds";

/// Append-only log of sealed sessions backed by a CSV file.
///
/// The log holds no cursor or cache: every query re-reads the file, so
/// a restore that swaps the file out is picked up on the next call.
pub struct SessionLog {
    path: PathBuf,
}

/// Filter for querying the log. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub task_name: Option<String>,
    /// Inclusive range matched against the session's start date.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

/// Result of a query: the matching sessions plus how many rows in the
/// file could not be parsed. Corrupt history is reported, never fatal.
#[derive(Debug)]
pub struct SessionQuery {
    pub sessions: Vec<Session>,
    pub corrupt_rows: usize,
}

impl SessionLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one sealed session and flush to disk. The header row is
    /// written first when the file is new.
    pub fn append(&self, session: &Session) -> Result<()> {
        let mut content = String::new();
        if !self.path.exists() {
            content.push_str(SESSIONS_HEADER);
            content.push('\n');
        }
        content.push_str(&serialize_session(session));
        content.push('\n');

        append_to_file(&self.path, &content)
            .with_context(|| format!("Failed to append session: {}", self.path.display()))?;

        tracing::info!(
            task = %session.task_name,
            seconds = session.duration_seconds,
            "logged session"
        );
        Ok(())
    }

    /// Read all sessions matching the filter, in file order.
    ///
    /// Rows that fail validation (missing task, bad timestamp, negative
    /// duration) are skipped and counted; the count is part of the
    /// result so callers can tell the user without losing the rest.
    pub fn query(&self, filter: &SessionFilter) -> Result<SessionQuery> {
        let content = read_file(&self.path)?;
        let mut sessions = Vec::new();
        let mut corrupt_rows = 0;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() || line == SESSIONS_HEADER {
                continue;
            }

            match parse_session_row(line) {
                Ok(session) => {
                    if filter_matches(filter, &session) {
                        sessions.push(session);
                    }
                }
                Err(e) => {
                    corrupt_rows += 1;
                    tracing::warn!(line = line_no + 1, error = %e, "skipping bad session row");
                }
            }
        }

        Ok(SessionQuery {
            sessions,
            corrupt_rows,
        })
    }

    /// Rewrite the log without the given task's sessions.
    ///
    /// Lines that do not parse are copied through verbatim - a delete of
    /// one task must not silently destroy unrelated (even broken)
    /// history. Returns how many rows were removed.
    pub fn purge_task(&self, task_name: &str) -> Result<usize> {
        let content = read_file(&self.path)?;
        if content.is_empty() {
            return Ok(0);
        }

        let mut output = String::new();
        let mut removed = 0;

        for line in content.lines() {
            let trimmed = line.trim_end();
            if trimmed.is_empty() || trimmed == SESSIONS_HEADER {
                output.push_str(trimmed);
                output.push('\n');
                continue;
            }

            match parse_session_row(trimmed) {
                Ok(session) if session.task_name == task_name => removed += 1,
                _ => {
                    output.push_str(trimmed);
                    output.push('\n');
                }
            }
        }

        if removed > 0 {
            atomic_write(&self.path, &output)
                .with_context(|| format!("Failed to rewrite session log: {}", self.path.display()))?;
            tracing::info!(task = task_name, removed, "purged sessions");
        }
        Ok(removed)
    }
}

fn filter_matches(filter: &SessionFilter, session: &Session) -> bool {
    if let Some(name) = &filter.task_name {
        if &session.task_name != name {
            return false;
        }
    }
    if let Some((from, to)) = filter.date_range {
        let date = session.started_at.date_naive();
        if date < from || date > to {
            return false;
        }
    }
    true
}

/// Serialize one session into a CSV row (no trailing newline).
pub fn serialize_session(session: &Session) -> String {
    write_row(&[
        session.task_name.clone(),
        session.started_at.to_rfc3339(),
        session.ended_at.to_rfc3339(),
        format!("{:.2}", session.duration_seconds),
    ])
}

/// Parse one CSV row back into a session, validating as the original
/// writer would have written it.
pub fn parse_session_row(line: &str) -> Result<Session, TrackerError> {
    let fields = split_row(line);
    if fields.len() != 4 {
        return Err(TrackerError::CorruptRecord(format!(
            "expected 4 columns, got {}",
            fields.len()
        )));
    }

    let task_name = fields[0].trim();
    if task_name.is_empty() {
        return Err(TrackerError::CorruptRecord(
            "missing task reference".to_string(),
        ));
    }

    let started_at = parse_timestamp(&fields[1])?;
    let ended_at = parse_timestamp(&fields[2])?;

    let duration_seconds: f64 = fields[3]
        .trim()
        .parse()
        .map_err(|_| TrackerError::CorruptRecord(format!("bad duration: {}", fields[3])))?;
    if !duration_seconds.is_finite() || duration_seconds < 0.0 {
        return Err(TrackerError::CorruptRecord(format!(
            "negative duration: {}",
            fields[3]
        )));
    }

    Ok(Session {
        task_name: task_name.to_string(),
        started_at,
        ended_at,
        duration_seconds,
    })
}

fn parse_timestamp(field: &str) -> Result<DateTime<Local>, TrackerError> {
    DateTime::parse_from_rfc3339(field.trim())
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|_| TrackerError::CorruptRecord(format!("bad timestamp: {field}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActiveSession;
    use crate::persistence::files::sessions_file;
    use chrono::Duration;

    fn sealed(task: &str, start: DateTime<Local>, secs: i64) -> Session {
        ActiveSession::new(task.to_string(), start)
            .seal(start + Duration::seconds(secs))
            .unwrap()
    }

    #[test]
    fn test_query_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::new(sessions_file(dir.path()));

        let result = log.query(&SessionFilter::default()).unwrap();
        assert!(result.sessions.is_empty());
        assert_eq!(result.corrupt_rows, 0);
    }

    #[test]
    fn test_append_and_query_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::new(sessions_file(dir.path()));
        let start = Local::now();

        let session = sealed("Writing", start, 1500);
        log.append(&session).unwrap();

        let result = log.query(&SessionFilter::default()).unwrap();
        assert_eq!(result.sessions.len(), 1);
        assert_eq!(result.sessions[0], session);
        assert_eq!(result.corrupt_rows, 0);
    }

    #[test]
    fn test_query_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::new(sessions_file(dir.path()));
        let start = Local::now();

        log.append(&sealed("Writing", start, 60)).unwrap();

        let first = log.query(&SessionFilter::default()).unwrap();
        // A session appended between queries shows up on the re-read
        log.append(&sealed("Reading", start, 120)).unwrap();
        let second = log.query(&SessionFilter::default()).unwrap();

        assert_eq!(first.sessions.len(), 1);
        assert_eq!(second.sessions.len(), 2);
    }

    #[test]
    fn test_query_filter_by_task() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::new(sessions_file(dir.path()));
        let start = Local::now();

        log.append(&sealed("Writing", start, 60)).unwrap();
        log.append(&sealed("Reading", start, 120)).unwrap();
        log.append(&sealed("Writing", start, 180)).unwrap();

        let filter = SessionFilter {
            task_name: Some("Writing".to_string()),
            ..Default::default()
        };
        let result = log.query(&filter).unwrap();
        assert_eq!(result.sessions.len(), 2);
        assert!(result.sessions.iter().all(|s| s.task_name == "Writing"));
    }

    #[test]
    fn test_query_filter_by_date_range() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::new(sessions_file(dir.path()));
        let now = Local::now();

        log.append(&sealed("Writing", now - Duration::days(10), 60))
            .unwrap();
        log.append(&sealed("Writing", now - Duration::days(2), 60))
            .unwrap();
        log.append(&sealed("Writing", now, 60)).unwrap();

        let filter = SessionFilter {
            task_name: None,
            date_range: Some((
                (now - Duration::days(3)).date_naive(),
                now.date_naive(),
            )),
        };
        let result = log.query(&filter).unwrap();
        assert_eq!(result.sessions.len(), 2);
    }

    #[test]
    fn test_corrupt_rows_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = sessions_file(dir.path());
        let log = SessionLog::new(path.clone());
        let start = Local::now();

        log.append(&sealed("Writing", start, 1500)).unwrap();
        // Negative duration, as the scenario where a hand-edited file went bad
        append_to_file(
            &path,
            "Writing,2026-08-08T09:00:00+00:00,2026-08-08T09:10:00+00:00,-600.00\n",
        )
        .unwrap();
        log.append(&sealed("Reading", start, 300)).unwrap();

        let result = log.query(&SessionFilter::default()).unwrap();
        assert_eq!(result.sessions.len(), 2);
        assert_eq!(result.corrupt_rows, 1);
    }

    #[test]
    fn test_malformed_timestamp_is_corrupt() {
        let row = "Writing,not-a-time,2026-08-08T09:10:00+00:00,600.00";
        assert!(matches!(
            parse_session_row(row),
            Err(TrackerError::CorruptRecord(_))
        ));
    }

    #[test]
    fn test_purge_task_keeps_other_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = sessions_file(dir.path());
        let log = SessionLog::new(path.clone());
        let start = Local::now();

        log.append(&sealed("Writing", start, 60)).unwrap();
        log.append(&sealed("Reading", start, 120)).unwrap();
        // A corrupt line must survive a purge of an unrelated task
        append_to_file(&path, "garbage line\n").unwrap();
        log.append(&sealed("Writing", start, 180)).unwrap();

        let removed = log.purge_task("Writing").unwrap();
        assert_eq!(removed, 2);

        let content = read_file(&path).unwrap();
        assert!(content.contains("garbage line"));
        assert!(content.contains("Reading"));

        let result = log.query(&SessionFilter::default()).unwrap();
        assert_eq!(result.sessions.len(), 1);
        assert_eq!(result.sessions[0].task_name, "Reading");
        assert_eq!(result.corrupt_rows, 1);
    }

    #[test]
    fn test_session_row_round_trip() {
        let start = Local::now();
        let session = sealed("Read, review \"notes\"", start, 930);

        let row = serialize_session(&session);
        let parsed = parse_session_row(&row).unwrap();
        assert_eq!(parsed, session);
    }
}
