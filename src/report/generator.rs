use crate::persistence::{report_file, sessions_file, SessionFilter, SessionLog};
use crate::report::stats::{calculate_summary, calculate_task_breakdown, daily_totals};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};

/// Format seconds as "Xh Ym" or "Xm" for display
fn format_duration(seconds: f64) -> String {
    let total_mins = (seconds / 60.0).round() as i64;
    if total_mins < 60 {
        format!("{}m", total_mins)
    } else {
        let hours = total_mins / 60;
        let mins = total_mins % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

fn weekday_name(weekday: chrono::Weekday) -> &'static str {
    match weekday {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

/// Generate a markdown report over the session log.
///
/// With a date, the report covers that single day; otherwise it covers
/// the full history. Returns the path the report was written to.
pub fn generate_report(
    data_dir: &Path,
    date: Option<NaiveDate>,
    output_path: Option<PathBuf>,
) -> Result<PathBuf> {
    let log = SessionLog::new(sessions_file(data_dir));

    let (filter, scope) = match date {
        Some(day) => (
            SessionFilter {
                date_range: Some((day, day)),
                ..Default::default()
            },
            day.format("%Y-%m-%d").to_string(),
        ),
        None => (SessionFilter::default(), "all time".to_string()),
    };

    let result = log.query(&filter)?;
    let summary = calculate_summary(&result.sessions, Local::now());
    let breakdown = calculate_task_breakdown(&result.sessions);
    let totals = daily_totals(&result.sessions);

    let mut report = String::new();
    report.push_str(&format!("# Time Report - {}\n\n", scope));

    // Summary Section
    report.push_str("## Summary\n\n");
    report.push_str(&format!(
        "- **Total Time:** {} across {} sessions\n",
        format_duration(summary.total_seconds),
        summary.total_sessions
    ));
    report.push_str(&format!("- **Tasks:** {}\n", summary.unique_tasks));
    if date.is_none() {
        report.push_str(&format!(
            "- **Today:** {}\n",
            format_duration(summary.today_seconds)
        ));
        report.push_str(&format!(
            "- **Last 7 Days:** {}\n",
            format_duration(summary.week_seconds)
        ));
    }
    report.push_str(&format!(
        "- **Average Session:** {}\n",
        format_duration(summary.avg_session_seconds)
    ));
    if let Some(weekday) = summary.most_productive_weekday {
        report.push_str(&format!(
            "- **Most Productive Day:** {}\n",
            weekday_name(weekday)
        ));
    }
    if let Some(hour) = summary.most_productive_hour {
        report.push_str(&format!("- **Most Productive Hour:** {:02}:00\n", hour));
    }
    report.push_str(&format!(
        "- **Consistency:** {:.2}\n",
        summary.consistency_score
    ));
    if result.corrupt_rows > 0 {
        report.push_str(&format!(
            "- **Skipped Rows:** {} (unparseable history)\n",
            result.corrupt_rows
        ));
    }
    report.push('\n');

    // Task Breakdown Section
    if !breakdown.is_empty() {
        report.push_str("## Task Breakdown\n\n");
        report.push_str("| Task | Total | Sessions | Avg Session | Days Worked |\n");
        report.push_str("|------|-------|----------|-------------|-------------|\n");
        for entry in &breakdown {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                entry.task_name,
                format_duration(entry.total_seconds),
                entry.sessions,
                format_duration(entry.avg_session_seconds),
                entry.days_worked
            ));
        }
        report.push('\n');
    }

    // Daily Totals Section
    if !totals.is_empty() {
        report.push_str("## Daily Totals\n\n");
        for (day, seconds) in &totals {
            report.push_str(&format!("- {}: {}\n", day, format_duration(*seconds)));
        }
        report.push('\n');
    }

    let path = output_path.unwrap_or_else(|| {
        report_file(data_dir, date.unwrap_or_else(|| Local::now().date_naive()))
    });
    crate::persistence::atomic_write(&path, &report)?;

    tracing::info!(path = %path.display(), "wrote report");
    Ok(path)
}
