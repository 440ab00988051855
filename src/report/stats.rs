use crate::domain::Session;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Timelike, Weekday};
use std::collections::BTreeMap;

/// Summary metrics across all sessions.
#[derive(Debug)]
pub struct SummaryStats {
    pub total_seconds: f64,
    pub total_sessions: usize,
    pub unique_tasks: usize,
    pub today_seconds: f64,
    pub week_seconds: f64,
    pub avg_session_seconds: f64,
    pub most_productive_weekday: Option<Weekday>,
    pub most_productive_hour: Option<u32>,
    /// 1 minus the coefficient of variation of daily totals, floored at
    /// zero. 1.0 means every tracked day carried the same load.
    pub consistency_score: f64,
}

/// Per-task aggregate over the session log.
#[derive(Debug)]
pub struct TaskBreakdown {
    pub task_name: String,
    pub total_seconds: f64,
    pub sessions: usize,
    pub avg_session_seconds: f64,
    pub days_worked: usize,
}

/// Total tracked seconds per calendar day, keyed by the session's start
/// date.
pub fn daily_totals(sessions: &[Session]) -> BTreeMap<NaiveDate, f64> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for session in sessions {
        *totals.entry(session.started_at.date_naive()).or_insert(0.0) +=
            session.duration_seconds;
    }
    totals
}

/// Calculate summary metrics. `now` anchors the today/this-week windows.
pub fn calculate_summary(sessions: &[Session], now: DateTime<Local>) -> SummaryStats {
    let total_sessions = sessions.len();
    let total_seconds: f64 = sessions.iter().map(|s| s.duration_seconds).sum();

    let mut task_names: Vec<&str> = sessions.iter().map(|s| s.task_name.as_str()).collect();
    task_names.sort();
    task_names.dedup();
    let unique_tasks = task_names.len();

    let today = now.date_naive();
    let week_start = today - Duration::days(7);

    let mut today_seconds = 0.0;
    let mut week_seconds = 0.0;
    let mut weekday_totals: BTreeMap<u32, f64> = BTreeMap::new();
    let mut hour_totals: BTreeMap<u32, f64> = BTreeMap::new();

    for session in sessions {
        let date = session.started_at.date_naive();
        if date == today {
            today_seconds += session.duration_seconds;
        }
        if date >= week_start {
            week_seconds += session.duration_seconds;
        }
        *weekday_totals
            .entry(session.started_at.weekday().num_days_from_monday())
            .or_insert(0.0) += session.duration_seconds;
        *hour_totals.entry(session.started_at.hour()).or_insert(0.0) +=
            session.duration_seconds;
    }

    let avg_session_seconds = if total_sessions > 0 {
        total_seconds / total_sessions as f64
    } else {
        0.0
    };

    let most_productive_weekday = arg_max(&weekday_totals)
        .and_then(|d| Weekday::try_from(d as u8).ok());
    let most_productive_hour = arg_max(&hour_totals);

    SummaryStats {
        total_seconds,
        total_sessions,
        unique_tasks,
        today_seconds,
        week_seconds,
        avg_session_seconds,
        most_productive_weekday,
        most_productive_hour,
        consistency_score: consistency_score(&daily_totals(sessions)),
    }
}

/// Calculate per-task aggregates, largest total first.
pub fn calculate_task_breakdown(sessions: &[Session]) -> Vec<TaskBreakdown> {
    // BTreeMap keeps ties in a stable (alphabetical) order
    let mut by_task: BTreeMap<&str, Vec<&Session>> = BTreeMap::new();
    for session in sessions {
        by_task.entry(&session.task_name).or_default().push(session);
    }

    let mut breakdown: Vec<TaskBreakdown> = by_task
        .into_iter()
        .map(|(name, sessions)| {
            let total_seconds: f64 = sessions.iter().map(|s| s.duration_seconds).sum();
            let count = sessions.len();

            let mut days: Vec<NaiveDate> =
                sessions.iter().map(|s| s.started_at.date_naive()).collect();
            days.sort();
            days.dedup();

            TaskBreakdown {
                task_name: name.to_string(),
                total_seconds,
                sessions: count,
                avg_session_seconds: total_seconds / count as f64,
                days_worked: days.len(),
            }
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.total_seconds
            .partial_cmp(&a.total_seconds)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    breakdown
}

fn arg_max(totals: &BTreeMap<u32, f64>) -> Option<u32> {
    totals
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(k, _)| *k)
}

fn consistency_score(daily: &BTreeMap<NaiveDate, f64>) -> f64 {
    if daily.is_empty() {
        return 0.0;
    }

    let n = daily.len() as f64;
    let mean = daily.values().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }

    let variance = daily.values().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (1.0 - variance.sqrt() / mean).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActiveSession;
    use chrono::TimeZone;

    fn session_at(task: &str, when: DateTime<Local>, secs: i64) -> Session {
        ActiveSession::new(task.to_string(), when)
            .seal(when + Duration::seconds(secs))
            .unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_summary_empty() {
        let stats = calculate_summary(&[], Local::now());
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.total_seconds, 0.0);
        assert_eq!(stats.most_productive_weekday, None);
        assert_eq!(stats.consistency_score, 0.0);
    }

    #[test]
    fn test_summary_windows() {
        let now = at(2026, 8, 8, 18);
        let sessions = vec![
            session_at("Writing", at(2026, 8, 8, 9), 3600),
            session_at("Writing", at(2026, 8, 5, 9), 1800),
            session_at("Reading", at(2026, 7, 1, 9), 900),
        ];

        let stats = calculate_summary(&sessions, now);
        assert_eq!(stats.total_seconds, 6300.0);
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.unique_tasks, 2);
        assert_eq!(stats.today_seconds, 3600.0);
        assert_eq!(stats.week_seconds, 5400.0);
        assert_eq!(stats.avg_session_seconds, 2100.0);
    }

    #[test]
    fn test_most_productive_weekday_and_hour() {
        // 2026-08-03 is a Monday
        let sessions = vec![
            session_at("Writing", at(2026, 8, 3, 9), 3600),
            session_at("Writing", at(2026, 8, 3, 9), 1800),
            session_at("Writing", at(2026, 8, 4, 14), 900),
        ];

        let stats = calculate_summary(&sessions, at(2026, 8, 8, 18));
        assert_eq!(stats.most_productive_weekday, Some(Weekday::Mon));
        assert_eq!(stats.most_productive_hour, Some(9));
    }

    #[test]
    fn test_consistency_score() {
        // Same total every day -> perfectly consistent
        let even = vec![
            session_at("Writing", at(2026, 8, 3, 9), 3600),
            session_at("Writing", at(2026, 8, 4, 9), 3600),
            session_at("Writing", at(2026, 8, 5, 9), 3600),
        ];
        let stats = calculate_summary(&even, at(2026, 8, 8, 18));
        assert!((stats.consistency_score - 1.0).abs() < 1e-9);

        // Wildly uneven days score lower
        let uneven = vec![
            session_at("Writing", at(2026, 8, 3, 9), 7200),
            session_at("Writing", at(2026, 8, 4, 9), 60),
        ];
        let stats = calculate_summary(&uneven, at(2026, 8, 8, 18));
        assert!(stats.consistency_score < 0.5);
    }

    #[test]
    fn test_daily_totals() {
        let sessions = vec![
            session_at("Writing", at(2026, 8, 3, 9), 600),
            session_at("Reading", at(2026, 8, 3, 11), 300),
            session_at("Writing", at(2026, 8, 4, 9), 900),
        ];

        let totals = daily_totals(&sessions);
        assert_eq!(totals.len(), 2);
        assert_eq!(
            totals[&NaiveDate::from_ymd_opt(2026, 8, 3).unwrap()],
            900.0
        );
        assert_eq!(
            totals[&NaiveDate::from_ymd_opt(2026, 8, 4).unwrap()],
            900.0
        );
    }

    #[test]
    fn test_task_breakdown_ordering() {
        let sessions = vec![
            session_at("Reading", at(2026, 8, 3, 9), 600),
            session_at("Writing", at(2026, 8, 3, 10), 3600),
            session_at("Writing", at(2026, 8, 4, 10), 1800),
        ];

        let breakdown = calculate_task_breakdown(&sessions);
        assert_eq!(breakdown.len(), 2);

        assert_eq!(breakdown[0].task_name, "Writing");
        assert_eq!(breakdown[0].total_seconds, 5400.0);
        assert_eq!(breakdown[0].sessions, 2);
        assert_eq!(breakdown[0].avg_session_seconds, 2700.0);
        assert_eq!(breakdown[0].days_worked, 2);

        assert_eq!(breakdown[1].task_name, "Reading");
        assert_eq!(breakdown[1].days_worked, 1);
    }
}
