use crate::domain::TrackerError;
use crate::persistence::files::{atomic_write, backups_dir, sessions_file, tasks_file};
use crate::persistence::settings::BackupSettings;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};
use std::fs;
use std::path::PathBuf;

/// Backup directory names double as backup ids and as the persisted
/// last-backup timestamp; this format sorts chronologically.
const BACKUP_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Snapshots the store files into timestamped directories and restores
/// from them. Scheduling is opportunistic: callers invoke
/// `maybe_backup` whenever convenient and it decides whether one is due.
pub struct BackupManager {
    data_dir: PathBuf,
    backups_dir: PathBuf,
    enabled: bool,
    frequency: Duration,
    retention: usize,
}

impl BackupManager {
    pub fn new(data_dir: PathBuf, settings: &BackupSettings) -> Self {
        let backups_dir = backups_dir(&data_dir);
        Self {
            data_dir,
            backups_dir,
            enabled: settings.auto_backup_enabled,
            frequency: Duration::hours(settings.frequency_hours as i64),
            retention: settings.retention_count,
        }
    }

    /// Create a backup if one is due at `now`, returning its id.
    ///
    /// Due means: no backup exists yet, or the newest one is older than
    /// the configured frequency. Returns `None` when automatic backups
    /// are disabled or nothing is due.
    pub fn maybe_backup(&self, now: DateTime<Local>) -> Result<Option<String>> {
        if !self.enabled {
            return Ok(None);
        }

        if let Some(last) = self.last_backup_time()? {
            if now.signed_duration_since(last) < self.frequency {
                return Ok(None);
            }
        }

        Ok(Some(self.create_backup(now)?))
    }

    /// Create a backup unconditionally, returning its id.
    ///
    /// Copies whichever store files exist into a new timestamped
    /// directory, then prunes the oldest backups beyond the retention
    /// count.
    pub fn create_backup(&self, now: DateTime<Local>) -> Result<String> {
        let id = now.format(BACKUP_ID_FORMAT).to_string();
        let target = self.backups_dir.join(&id);
        fs::create_dir_all(&target)
            .with_context(|| format!("Failed to create backup directory: {}", target.display()))?;

        let mut copied = 0;
        for (source, name) in self.store_files() {
            if source.exists() {
                fs::copy(&source, target.join(name))
                    .with_context(|| format!("Failed to copy {}", source.display()))?;
                copied += 1;
            }
        }

        let pruned = self.prune()?;
        tracing::info!(id = %id, copied, pruned, "created backup");
        Ok(id)
    }

    /// All backup ids, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                // Ignore directories that are not timestamp-named
                if NaiveDateTime::parse_from_str(name, BACKUP_ID_FORMAT).is_ok() {
                    ids.push(name.to_string());
                }
            }
        }

        ids.sort();
        ids.reverse();
        Ok(ids)
    }

    /// Copy a backup's files back over the live store files.
    ///
    /// Fails with `BackupNotFound` for an unknown id. Each file is
    /// replaced atomically. In-memory stores are NOT refreshed here;
    /// the caller must reload them afterwards.
    pub fn restore(&self, backup_id: &str) -> Result<()> {
        let source_dir = self.backups_dir.join(backup_id);
        if !source_dir.is_dir() {
            return Err(TrackerError::BackupNotFound(backup_id.to_string()).into());
        }

        for (target, name) in self.store_files() {
            let source = source_dir.join(name);
            if !source.exists() {
                continue;
            }
            let content = fs::read_to_string(&source)
                .with_context(|| format!("Failed to read backup file: {}", source.display()))?;
            atomic_write(&target, &content)?;
        }

        tracing::info!(id = backup_id, "restored backup");
        Ok(())
    }

    /// The live store files covered by a backup, with their file names.
    fn store_files(&self) -> [(PathBuf, &'static str); 2] {
        [
            (tasks_file(&self.data_dir), "tasks.csv"),
            (sessions_file(&self.data_dir), "sessions.csv"),
        ]
    }

    /// When the newest backup was taken, parsed from directory names.
    fn last_backup_time(&self) -> Result<Option<DateTime<Local>>> {
        let newest = match self.list_backups()?.into_iter().next() {
            Some(id) => id,
            None => return Ok(None),
        };

        let naive = NaiveDateTime::parse_from_str(&newest, BACKUP_ID_FORMAT)
            .with_context(|| format!("Unparseable backup id: {newest}"))?;
        Ok(Local.from_local_datetime(&naive).earliest())
    }

    /// Delete the oldest backups beyond the retention count.
    fn prune(&self) -> Result<usize> {
        let ids = self.list_backups()?;
        let mut removed = 0;

        for id in ids.iter().skip(self.retention) {
            fs::remove_dir_all(self.backups_dir.join(id))
                .with_context(|| format!("Failed to remove old backup: {id}"))?;
            removed += 1;
        }

        Ok(removed)
    }
}
