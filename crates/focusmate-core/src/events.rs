use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every observable state change of a focus session produces an Event.
/// The CLI renders them; `--json` output prints them verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        music: String,
        notifications: bool,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        from: Phase,
        to: Phase,
        sessions_completed_today: u32,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    MusicChanged {
        url: String,
        at: DateTime<Utc>,
    },
    SessionEnded {
        sessions_completed_today: u32,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        label: String,
        seconds_remaining: u32,
        duration_secs: u32,
        progress: f64,
        paused: bool,
        sessions_completed_today: u32,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },
}
