mod backup;
mod domain;
mod logging;
mod notifications;
mod persistence;
mod pomodoro;
mod report;
mod tracker;

use anyhow::Result;
use backup::BackupManager;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use persistence::{
    ensure_data_dir, init_local_data_dir, load_settings, save_settings, sessions_file,
    settings_file, state_file, tasks_file, SessionFilter, SessionLog, Settings, TaskStore,
};
use pomodoro::{format_countdown, Phase, Pomodoro};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracker::Tracker;

#[derive(Parser)]
#[command(name = "tempo")]
#[command(about = "A task-based time tracker with Pomodoro sessions and CSV storage", long_about = None)]
struct Cli {
    /// Mirror log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .tempo directory in the current directory
    Init,
    /// Create a task without starting a session
    Add {
        /// Task name
        name: String,
    },
    /// Start tracking a task (created on first use)
    Start {
        /// Task name
        name: String,
    },
    /// Stop the session in progress and record it
    Stop,
    /// Show the current tracking state and elapsed time
    Status,
    /// List tasks with their tracked totals
    Tasks,
    /// Remove a task and its recorded sessions
    Remove {
        /// Task name
        name: String,
        /// Leave the task's sessions in the log
        #[arg(long)]
        keep_sessions: bool,
    },
    /// Show recorded sessions
    Log {
        /// Only sessions for this task
        #[arg(short, long)]
        task: Option<String>,
        /// Only sessions on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Only sessions on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Generate a markdown report with statistics
    Report {
        /// Limit the report to one date (YYYY-MM-DD format)
        #[arg(short, long)]
        date: Option<String>,
        /// Output file path. Defaults to <data dir>/report-YYYY-MM-DD.md
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Run the Pomodoro timer in the foreground
    Pomodoro,
    /// Take a backup of the store files now
    Backup,
    /// List available backups, newest first
    Backups,
    /// Restore the store files from a backup
    Restore {
        /// Backup id as shown by `tempo backups`
        id: String,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print all settings
    Show,
    /// Set one setting, e.g. `tempo config set pomodoro.work-minutes 30`
    Set { key: String, value: String },
    /// Restore default settings
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Init) {
        let data_dir = init_local_data_dir()?;
        println!("Initialized tempo directory: {}", data_dir.display());
        println!();
        println!("Tempo will now use this local directory for its data.");
        println!("Run 'tempo start <task>' to begin tracking.");
        return Ok(());
    }

    let data_dir = ensure_data_dir()?;
    logging::init(&data_dir, cli.verbose)?;

    let settings = load_settings(settings_file(&data_dir))?;
    for issue in settings.validate() {
        eprintln!("Warning: {issue}");
    }

    // The backup schedule is checked opportunistically after any command
    // that touched the stores; there is no background timer.
    let backup_due = matches!(
        cli.command,
        Commands::Add { .. } | Commands::Start { .. } | Commands::Stop | Commands::Remove { .. }
    );

    run_command(cli.command, &data_dir, &settings)?;

    if backup_due {
        let manager = BackupManager::new(data_dir.clone(), &settings.backup);
        if let Some(id) = manager.maybe_backup(Local::now())? {
            println!("Backup created: {id}");
        }
    }

    Ok(())
}

fn run_command(command: Commands, data_dir: &Path, settings: &Settings) -> Result<()> {
    match command {
        Commands::Init => unreachable!("handled before data dir setup"),

        Commands::Add { name } => {
            let mut tasks = TaskStore::open(tasks_file(data_dir))?;
            let known = tasks.get(name.trim()).is_some();
            let task = tasks.upsert(&name, Local::now())?;
            if known {
                println!("Task already exists: {}", task.name);
            } else {
                println!("Added task: {}", task.name);
            }
        }

        Commands::Start { name } => {
            let mut tracker = Tracker::load(state_file(data_dir))?;
            let mut tasks = TaskStore::open(tasks_file(data_dir))?;
            let active = tracker.start(&mut tasks, &name, Local::now())?;
            println!(
                "Started tracking \"{}\" at {}",
                active.task_name,
                active.started_at.format("%H:%M:%S")
            );
        }

        Commands::Stop => {
            let mut tracker = Tracker::load(state_file(data_dir))?;
            let mut tasks = TaskStore::open(tasks_file(data_dir))?;
            let log = SessionLog::new(sessions_file(data_dir));
            let session = tracker.stop(&mut tasks, &log, Local::now())?;
            println!(
                "Stopped \"{}\" after {}",
                session.task_name,
                format_seconds(session.duration_seconds)
            );
        }

        Commands::Status => {
            let tracker = Tracker::load(state_file(data_dir))?;
            match tracker.state().active() {
                Some(active) => {
                    println!("Tracking: {}", active.task_name);
                    println!("Since:    {}", active.started_at.format("%Y-%m-%d %H:%M:%S"));
                    println!(
                        "Elapsed:  {}",
                        format_countdown(chrono::Duration::seconds(
                            tracker.elapsed_seconds(Local::now()) as i64
                        ))
                    );
                }
                None => println!("Not tracking"),
            }
        }

        Commands::Tasks => {
            let tasks = TaskStore::open(tasks_file(data_dir))?;
            if tasks.list().is_empty() {
                println!("No tasks yet. Add one with 'tempo start <task>'.");
            } else {
                for task in tasks.list() {
                    println!(
                        "{:<40} {:>10}  (since {})",
                        task.name,
                        format_seconds(task.total_seconds),
                        task.created_at.format("%Y-%m-%d")
                    );
                }
            }
        }

        Commands::Remove {
            name,
            keep_sessions,
        } => {
            let mut tasks = TaskStore::open(tasks_file(data_dir))?;
            let task = tasks.remove(&name)?;
            println!(
                "Removed task \"{}\" ({} tracked)",
                task.name,
                format_seconds(task.total_seconds)
            );

            if !keep_sessions {
                let log = SessionLog::new(sessions_file(data_dir));
                let purged = log.purge_task(&task.name)?;
                if purged > 0 {
                    println!("Removed {purged} recorded sessions");
                }
            }
        }

        Commands::Log { task, from, to } => {
            let filter = SessionFilter {
                task_name: task,
                date_range: parse_date_range(from.as_deref(), to.as_deref())?,
            };
            let log = SessionLog::new(sessions_file(data_dir));
            let result = log.query(&filter)?;

            if result.sessions.is_empty() {
                println!("No sessions recorded.");
            }
            for session in &result.sessions {
                println!(
                    "{}  {:>10}  {}",
                    session.started_at.format("%Y-%m-%d %H:%M"),
                    format_seconds(session.duration_seconds),
                    session.task_name
                );
            }
            if result.corrupt_rows > 0 {
                eprintln!(
                    "Warning: skipped {} unparseable rows in the session file",
                    result.corrupt_rows
                );
            }
        }

        Commands::Report { date, output } => {
            let report_date = date
                .map(|d| parse_date(&d))
                .transpose()?;
            let output_path = output.map(PathBuf::from);

            let report_path = report::generate_report(data_dir, report_date, output_path)?;
            println!("Report generated: {}", report_path.display());
        }

        Commands::Pomodoro => run_pomodoro(settings)?,

        Commands::Backup => {
            let manager = BackupManager::new(data_dir.to_path_buf(), &settings.backup);
            let id = manager.create_backup(Local::now())?;
            println!("Backup created: {id}");
        }

        Commands::Backups => {
            let manager = BackupManager::new(data_dir.to_path_buf(), &settings.backup);
            let ids = manager.list_backups()?;
            if ids.is_empty() {
                println!("No backups yet. Take one with 'tempo backup'.");
            }
            for id in ids {
                println!("{id}");
            }
        }

        Commands::Restore { id } => {
            let mut tasks = TaskStore::open(tasks_file(data_dir))?;
            let manager = BackupManager::new(data_dir.to_path_buf(), &settings.backup);
            manager.restore(&id)?;
            // The restore swapped the files underneath; reload before reporting
            tasks.reload()?;
            println!("Restored backup {id} ({} tasks)", tasks.list().len());
        }

        Commands::Config { action } => run_config(action, data_dir, settings)?,
    }

    Ok(())
}

fn run_config(action: ConfigAction, data_dir: &Path, settings: &Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Settings ({})", settings_file(data_dir).display());
            for (key, value) in settings.entries() {
                println!("  {key} = {value}");
            }
        }
        ConfigAction::Set { key, value } => {
            let mut updated = settings.clone();
            updated.set(&key, &value)?;
            save_settings(settings_file(data_dir), &updated)?;
            println!("Set {key} = {value}");
        }
        ConfigAction::Reset => {
            save_settings(settings_file(data_dir), &Settings::default())?;
            println!("Settings reset to defaults");
        }
    }
    Ok(())
}

/// Run the pomodoro cycle in the foreground until interrupted.
fn run_pomodoro(settings: &Settings) -> Result<()> {
    let mut timer = Pomodoro::new(settings.pomodoro.clone());
    println!(
        "Pomodoro: {}m work / {}m break / {}m long break every {} sessions (Ctrl-C to quit)",
        settings.pomodoro.work_minutes,
        settings.pomodoro.break_minutes,
        settings.pomodoro.long_break_minutes,
        settings.pomodoro.sessions_before_long_break
    );
    timer.start(Local::now());

    loop {
        let now = Local::now();

        if timer.is_phase_complete(now) {
            let finished = timer.phase();
            notifications::notify_phase_complete(finished, &settings.notifications);

            let next = timer.advance();
            println!();
            if finished == Phase::Work {
                println!(
                    "Work session complete ({} done). Next: {}.",
                    timer.completed_work_phases(),
                    next.label()
                );
            } else {
                println!("{} over. Next: {}.", finished.label(), next.label());
            }

            if next.is_break() && !settings.pomodoro.auto_start_breaks {
                print!("Press Enter to start the {}...", next.label());
                std::io::stdout().flush()?;
                let mut line = String::new();
                std::io::stdin().read_line(&mut line)?;
            }
            timer.start(Local::now());
            continue;
        }

        print!(
            "\r[{}] {}   ",
            timer.phase().label(),
            format_countdown(timer.remaining(now))
        );
        std::io::stdout().flush()?;
        std::thread::sleep(std::time::Duration::from_millis(500));
    }
}

/// Format seconds as "Xh Ym" or "Xm Ys" for command output
fn format_seconds(seconds: f64) -> String {
    let total = seconds.round() as i64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid date format. Use YYYY-MM-DD: {}", e))
}

fn parse_date_range(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<(NaiveDate, NaiveDate)>> {
    match (from, to) {
        (None, None) => Ok(None),
        (from, to) => {
            let from = from.map(parse_date).transpose()?.unwrap_or(NaiveDate::MIN);
            let to = to.map(parse_date).transpose()?.unwrap_or(NaiveDate::MAX);
            Ok(Some((from, to)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(45.0), "45s");
        assert_eq!(format_seconds(90.0), "1m 30s");
        assert_eq!(format_seconds(3660.0), "1h 1m");
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2026-08-08").is_ok());
        assert!(parse_date("08/08/2026").is_err());
    }

    #[test]
    fn test_parse_date_range_open_ends() {
        assert_eq!(parse_date_range(None, None).unwrap(), None);

        let range = parse_date_range(Some("2026-08-01"), None).unwrap().unwrap();
        assert_eq!(range.0, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(range.1, NaiveDate::MAX);

        let range = parse_date_range(None, Some("2026-08-08")).unwrap().unwrap();
        assert_eq!(range.0, NaiveDate::MIN);
    }
}
