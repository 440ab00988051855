use crate::persistence::settings::PomodoroSettings;
use chrono::{DateTime, Duration, Local};

/// Phase of the pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::ShortBreak => "break",
            Phase::LongBreak => "long break",
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Phase::ShortBreak | Phase::LongBreak)
    }
}

/// Pomodoro cycle state machine.
///
/// Pure state: the wall clock is passed into every operation, so the
/// machine can be driven by a render loop or by tests with fabricated
/// times. A long break follows every Nth completed work phase, after
/// which the counter resets.
pub struct Pomodoro {
    settings: PomodoroSettings,
    phase: Phase,
    completed_work_phases: u32,
    /// Elapsed time banked across pauses.
    banked: Duration,
    /// When the timer was last (re)started; None while paused.
    started_at: Option<DateTime<Local>>,
}

impl Pomodoro {
    pub fn new(settings: PomodoroSettings) -> Self {
        Self {
            settings,
            phase: Phase::Work,
            completed_work_phases: 0,
            banked: Duration::zero(),
            started_at: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn completed_work_phases(&self) -> u32 {
        self.completed_work_phases
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Start (or resume) the timer.
    pub fn start(&mut self, now: DateTime<Local>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Pause the timer, banking the elapsed time.
    pub fn pause(&mut self, now: DateTime<Local>) {
        if let Some(started) = self.started_at.take() {
            let run = now.signed_duration_since(started);
            self.banked = self.banked + run.max(Duration::zero());
        }
    }

    /// Full duration of the current phase.
    pub fn phase_duration(&self) -> Duration {
        let minutes = match self.phase {
            Phase::Work => self.settings.work_minutes,
            Phase::ShortBreak => self.settings.break_minutes,
            Phase::LongBreak => self.settings.long_break_minutes,
        };
        Duration::minutes(minutes as i64)
    }

    /// Time spent in the current phase so far.
    pub fn elapsed(&self, now: DateTime<Local>) -> Duration {
        let running = match self.started_at {
            Some(started) => now.signed_duration_since(started).max(Duration::zero()),
            None => Duration::zero(),
        };
        self.banked + running
    }

    /// Time left in the current phase, floored at zero.
    pub fn remaining(&self, now: DateTime<Local>) -> Duration {
        (self.phase_duration() - self.elapsed(now)).max(Duration::zero())
    }

    /// Whether the current phase has run its full duration.
    pub fn is_phase_complete(&self, now: DateTime<Local>) -> bool {
        self.remaining(now) == Duration::zero()
    }

    /// Finish the current phase and move to the next one.
    ///
    /// The timer comes back paused; the caller decides whether the next
    /// phase starts immediately (auto-start) or waits. Returns the new
    /// phase.
    pub fn advance(&mut self) -> Phase {
        self.phase = match self.phase {
            Phase::Work => {
                self.completed_work_phases += 1;
                if self.completed_work_phases >= self.settings.sessions_before_long_break {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak => Phase::Work,
            Phase::LongBreak => {
                // Counter resets after the long break
                self.completed_work_phases = 0;
                Phase::Work
            }
        };
        self.banked = Duration::zero();
        self.started_at = None;
        self.phase
    }

    /// Back to a fresh work phase with nothing banked.
    pub fn reset(&mut self) {
        self.phase = Phase::Work;
        self.completed_work_phases = 0;
        self.banked = Duration::zero();
        self.started_at = None;
    }
}

/// Format a countdown as MM:SS (or H:MM:SS above an hour).
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
