use crate::domain::ActiveSession;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tracking state machine value, persisted in state.json between
/// invocations. Exactly one session can be in progress at a time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackerState {
    #[default]
    Idle,
    Tracking(ActiveSession),
}

impl TrackerState {
    pub fn is_tracking(&self) -> bool {
        matches!(self, TrackerState::Tracking(_))
    }

    /// The in-progress session, if any.
    pub fn active(&self) -> Option<&ActiveSession> {
        match self {
            TrackerState::Idle => None,
            TrackerState::Tracking(active) => Some(active),
        }
    }
}

/// Load tracker state from the state file
pub fn load_state<P: AsRef<Path>>(path: P) -> Result<TrackerState> {
    let path = path.as_ref();

    if !path.exists() {
        // No file means nothing was being tracked
        return Ok(TrackerState::Idle);
    }

    let content = std::fs::read_to_string(path)?;
    let state: TrackerState = serde_json::from_str(&content)?;
    Ok(state)
}

/// Save tracker state to the state file
pub fn save_state<P: AsRef<Path>>(path: P, state: &TrackerState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    crate::persistence::atomic_write(path, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use tempfile::tempdir;

    #[test]
    fn test_load_nonexistent_state() {
        let temp_dir = tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        let state = load_state(&state_path).unwrap();
        assert_eq!(state, TrackerState::Idle);
        assert!(!state.is_tracking());
    }

    #[test]
    fn test_save_and_load_state() {
        let temp_dir = tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        let active = ActiveSession::new("Writing".to_string(), Local::now());
        let state = TrackerState::Tracking(active.clone());

        save_state(&state_path, &state).unwrap();

        let loaded = load_state(&state_path).unwrap();
        assert!(loaded.is_tracking());
        assert_eq!(loaded.active(), Some(&active));
    }

    #[test]
    fn test_save_idle_round_trip() {
        let temp_dir = tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        save_state(&state_path, &TrackerState::Idle).unwrap();
        let loaded = load_state(&state_path).unwrap();
        assert_eq!(loaded, TrackerState::Idle);
    }
}
