use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_work_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_sessions_before_long_break() -> u32 {
    4
}
fn default_frequency_hours() -> u32 {
    24
}
fn default_retention_count() -> usize {
    10
}
fn default_true() -> bool {
    true
}

/// Pomodoro cycle durations and behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroSettings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
    #[serde(default = "default_true")]
    pub auto_start_breaks: bool,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            sessions_before_long_break: default_sessions_before_long_break(),
            auto_start_breaks: true,
        }
    }
}

/// Automatic backup schedule and retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSettings {
    #[serde(default = "default_true")]
    pub auto_backup_enabled: bool,
    #[serde(default = "default_frequency_hours")]
    pub frequency_hours: u32,
    #[serde(default = "default_retention_count")]
    pub retention_count: usize,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            auto_backup_enabled: true,
            frequency_hours: default_frequency_hours(),
            retention_count: default_retention_count(),
        }
    }
}

/// Notification toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub desktop_enabled: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            desktop_enabled: true,
            sound_enabled: true,
        }
    }
}

/// Application settings stored in settings.json.
///
/// Every field has a default, so a settings file from an older version
/// (or a hand-edited one with keys removed) still loads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub pomodoro: PomodoroSettings,
    #[serde(default)]
    pub backup: BackupSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl Settings {
    /// Check value ranges, returning human-readable issues. An empty
    /// list means the settings are usable.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.pomodoro.work_minutes == 0 {
            issues.push("pomodoro work duration must be positive".to_string());
        }
        if self.pomodoro.break_minutes == 0 {
            issues.push("pomodoro break duration must be positive".to_string());
        }
        if self.pomodoro.long_break_minutes == 0 {
            issues.push("pomodoro long break duration must be positive".to_string());
        }
        if self.pomodoro.sessions_before_long_break == 0 {
            issues.push("sessions before long break must be at least 1".to_string());
        }
        if self.backup.frequency_hours == 0 {
            issues.push("backup frequency must be at least 1 hour".to_string());
        }
        if self.backup.retention_count == 0 {
            issues.push("backup retention must keep at least 1 backup".to_string());
        }

        issues
    }

    /// All settings as (key, value) pairs, in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("pomodoro.work-minutes", self.pomodoro.work_minutes.to_string()),
            ("pomodoro.break-minutes", self.pomodoro.break_minutes.to_string()),
            (
                "pomodoro.long-break-minutes",
                self.pomodoro.long_break_minutes.to_string(),
            ),
            (
                "pomodoro.sessions-before-long-break",
                self.pomodoro.sessions_before_long_break.to_string(),
            ),
            (
                "pomodoro.auto-start-breaks",
                self.pomodoro.auto_start_breaks.to_string(),
            ),
            ("backup.auto", self.backup.auto_backup_enabled.to_string()),
            (
                "backup.frequency-hours",
                self.backup.frequency_hours.to_string(),
            ),
            ("backup.retention", self.backup.retention_count.to_string()),
            (
                "notifications.desktop",
                self.notifications.desktop_enabled.to_string(),
            ),
            (
                "notifications.sound",
                self.notifications.sound_enabled.to_string(),
            ),
        ]
    }

    /// Set one setting by its key path, parsing the value to the field's
    /// type. Unknown keys, unparseable values, and out-of-range values
    /// are errors and leave the settings untouched.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "pomodoro.work-minutes" => updated.pomodoro.work_minutes = parse_number(key, value)?,
            "pomodoro.break-minutes" => updated.pomodoro.break_minutes = parse_number(key, value)?,
            "pomodoro.long-break-minutes" => {
                updated.pomodoro.long_break_minutes = parse_number(key, value)?
            }
            "pomodoro.sessions-before-long-break" => {
                updated.pomodoro.sessions_before_long_break = parse_number(key, value)?
            }
            "pomodoro.auto-start-breaks" => {
                updated.pomodoro.auto_start_breaks = parse_bool(key, value)?
            }
            "backup.auto" => updated.backup.auto_backup_enabled = parse_bool(key, value)?,
            "backup.frequency-hours" => updated.backup.frequency_hours = parse_number(key, value)?,
            "backup.retention" => updated.backup.retention_count = parse_number(key, value)?,
            "notifications.desktop" => {
                updated.notifications.desktop_enabled = parse_bool(key, value)?
            }
            "notifications.sound" => updated.notifications.sound_enabled = parse_bool(key, value)?,
            _ => bail!("Unknown setting: {key}"),
        }

        if let Some(issue) = updated.validate().into_iter().next() {
            bail!("Invalid value for {key}: {issue}");
        }
        *self = updated;
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Setting {key} expects a number, got: {value}"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => bail!("Setting {key} expects true or false, got: {value}"),
    }
}

/// Load settings from the settings file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();

    if !path.exists() {
        // If file doesn't exist, return defaults
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    Ok(settings)
}

/// Save settings to the settings file
pub fn save_settings<P: AsRef<Path>>(path: P, settings: &Settings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    crate::persistence::atomic_write(path, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.pomodoro.work_minutes, 25);
        assert_eq!(settings.pomodoro.break_minutes, 5);
        assert_eq!(settings.pomodoro.long_break_minutes, 15);
        assert_eq!(settings.pomodoro.sessions_before_long_break, 4);
        assert_eq!(settings.backup.frequency_hours, 24);
        assert_eq!(settings.backup.retention_count, 10);
        assert!(settings.notifications.desktop_enabled);
    }

    #[test]
    fn test_load_nonexistent_settings() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load_settings() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.pomodoro.work_minutes = 50;
        settings.backup.frequency_hours = 6;

        save_settings(&path, &settings).unwrap();

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");

        std::fs::write(&path, r#"{"pomodoro": {"work_minutes": 45}}"#).unwrap();

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded.pomodoro.work_minutes, 45);
        assert_eq!(loaded.pomodoro.break_minutes, 5);
        assert_eq!(loaded.backup.retention_count, 10);
    }

    #[test]
    fn test_validate_flags_zeroes() {
        let mut settings = Settings::default();
        settings.pomodoro.work_minutes = 0;
        settings.backup.retention_count = 0;

        let issues = settings.validate();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_set_known_keys() {
        let mut settings = Settings::default();

        settings.set("pomodoro.work-minutes", "30").unwrap();
        assert_eq!(settings.pomodoro.work_minutes, 30);

        settings.set("backup.auto", "off").unwrap();
        assert!(!settings.backup.auto_backup_enabled);

        settings.set("notifications.sound", "false").unwrap();
        assert!(!settings.notifications.sound_enabled);
    }

    #[test]
    fn test_set_unknown_key() {
        let mut settings = Settings::default();
        assert!(settings.set("pomodoro.volume", "11").is_err());
    }

    #[test]
    fn test_set_rejects_invalid_value() {
        let mut settings = Settings::default();
        assert!(settings.set("pomodoro.work-minutes", "zero").is_err());
        assert!(settings.set("pomodoro.work-minutes", "0").is_err());
        // The failed set must not leave an invalid value behind
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn test_entries_cover_all_keys() {
        let mut settings = Settings::default();
        for (key, value) in Settings::default().entries() {
            // Every listed key must round-trip through set()
            settings.set(key, &value).unwrap();
        }
    }
}
