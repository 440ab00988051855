use crate::domain::{ActiveSession, Session, TrackerError};
use crate::persistence::{load_state, save_state, SessionLog, TaskStore, TrackerState};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Tracking controller.
///
/// Owns the Idle/Tracking state machine value, persists it across
/// invocations, and commits completed sessions to the session log and
/// the task store. Switching tasks requires an explicit stop then
/// start; nothing here switches implicitly.
pub struct Tracker {
    state: TrackerState,
    state_path: PathBuf,
}

impl Tracker {
    /// Load the tracker, picking up any session left in progress by a
    /// previous invocation.
    pub fn load(state_path: PathBuf) -> Result<Self> {
        let state = load_state(&state_path)
            .with_context(|| format!("Failed to load tracker state: {}", state_path.display()))?;
        Ok(Self { state, state_path })
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Begin tracking `task_name` at `now`.
    ///
    /// Fails with `AlreadyTracking` if a session is in progress (state
    /// is left unchanged). The task is created on first use.
    pub fn start(
        &mut self,
        tasks: &mut TaskStore,
        task_name: &str,
        now: DateTime<Local>,
    ) -> Result<ActiveSession> {
        if let Some(active) = self.state.active() {
            return Err(TrackerError::AlreadyTracking(active.task_name.clone()).into());
        }

        let task = tasks.upsert(task_name, now)?;
        let active = ActiveSession::new(task.name, now);

        self.state = TrackerState::Tracking(active.clone());
        save_state(&self.state_path, &self.state)?;

        tracing::info!(task = %active.task_name, "started tracking");
        Ok(active)
    }

    /// Stop the in-progress session at `now`, seal it, and commit it.
    ///
    /// Fails with `NotTracking` if nothing is being tracked. A session
    /// that ends before it started (clock moved backwards) is recorded
    /// with a zero duration instead of being dropped.
    pub fn stop(
        &mut self,
        tasks: &mut TaskStore,
        log: &SessionLog,
        now: DateTime<Local>,
    ) -> Result<Session> {
        let active = match &self.state {
            TrackerState::Idle => return Err(TrackerError::NotTracking.into()),
            TrackerState::Tracking(active) => active.clone(),
        };

        let session = match active.clone().seal(now) {
            Ok(session) => session,
            Err(e @ TrackerError::InvalidDuration { .. }) => {
                tracing::warn!(error = %e, "clock anomaly, clamping session duration to zero");
                active.seal_clamped(now)
            }
            Err(e) => return Err(e.into()),
        };

        log.append(&session)?;
        tasks.add_time(&session.task_name, session.duration_seconds)?;

        self.state = TrackerState::Idle;
        save_state(&self.state_path, &self.state)?;

        tracing::info!(
            task = %session.task_name,
            seconds = session.duration_seconds,
            "stopped tracking"
        );
        Ok(session)
    }

    /// Elapsed seconds of the in-progress session, 0 when idle.
    ///
    /// Side-effect free; safe to call repeatedly for live display.
    pub fn elapsed_seconds(&self, now: DateTime<Local>) -> f64 {
        match self.state.active() {
            Some(active) => active.elapsed_seconds(now),
            None => 0.0,
        }
    }
}
