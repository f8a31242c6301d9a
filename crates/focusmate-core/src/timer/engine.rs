//! Phase engine implementation.
//!
//! The engine owns the current phase and the seconds left in it. It has no
//! clock of its own: the caller invokes `tick()` once per second while the
//! session runs.
//!
//! ## State Transitions
//!
//! ```text
//! Focus -> ShortBreak -> Focus -> ... -> Focus -> LongBreak -> Focus
//! ```
//!
//! Every `sessions_before_long_break`-th completed focus phase routes to a
//! long break, all others to a short break. Breaks always return to focus.
//!
//! Side effects (cue sounds, notifications, counter persistence, audio
//! source changes) are not performed here. Completing a phase returns a
//! [`Transition`] describing them and the session applies it.

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use super::phase::{Cadence, Phase, SessionCounters};
use crate::audio::Cue;
use crate::catalog::{self, Catalog, Track};
use crate::events::Event;
use crate::storage::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    pub seconds_remaining: u32,
    pub paused: bool,
}

/// Track and message picked on entry to a break. The message is fixed for
/// that break; the track can be replaced with `set_break_track`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakRoll {
    pub track: Track,
    pub message: &'static str,
}

/// Effects of a completed phase, to be applied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub cue: Cue,
    /// Notification body, present only when notifications are enabled.
    pub notification: Option<&'static str>,
    /// New counter values when a focus phase completed.
    pub counters: Option<SessionCounters>,
    pub log_entry: Option<String>,
}

impl Transition {
    pub fn event(&self, counters: SessionCounters) -> Event {
        Event::PhaseCompleted {
            from: self.from,
            to: self.to,
            sessions_completed_today: counters.sessions_completed_today,
            cycles_completed: counters.cycles_completed,
            at: Utc::now(),
        }
    }
}

/// Core phase state machine.
///
/// Generic over the random source so break rolls and notification picks
/// are reproducible under a seeded generator.
#[derive(Debug, Clone)]
pub struct PhaseEngine<R = Mcg128Xsl64> {
    cadence: Cadence,
    catalog: Catalog,
    state: TimerState,
    counters: SessionCounters,
    notifications: bool,
    focus_url: &'static str,
    break_roll: Option<BreakRoll>,
    log: Vec<String>,
    rng: R,
}

impl PhaseEngine<Mcg128Xsl64> {
    /// Engine seeded from OS entropy.
    pub fn from_entropy(
        cadence: Cadence,
        catalog: Catalog,
        counters: SessionCounters,
        settings: &Settings,
    ) -> Self {
        Self::new(cadence, catalog, counters, settings, Mcg128Xsl64::from_entropy())
    }

    pub fn seeded(
        cadence: Cadence,
        catalog: Catalog,
        counters: SessionCounters,
        settings: &Settings,
        seed: u64,
    ) -> Self {
        Self::new(cadence, catalog, counters, settings, Mcg128Xsl64::seed_from_u64(seed))
    }
}

impl<R: Rng> PhaseEngine<R> {
    /// Create an engine at the start of a focus phase.
    pub fn new(
        cadence: Cadence,
        catalog: Catalog,
        counters: SessionCounters,
        settings: &Settings,
        rng: R,
    ) -> Self {
        Self {
            cadence,
            catalog,
            state: TimerState {
                phase: Phase::Focus,
                seconds_remaining: cadence.duration(Phase::Focus),
                paused: false,
            },
            counters,
            notifications: settings.notifications,
            focus_url: catalog.resolve_focus_url(&settings.music),
            break_roll: None,
            log: Vec::new(),
            rng,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.state.seconds_remaining
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn focus_url(&self) -> &'static str {
        self.focus_url
    }

    pub fn break_roll(&self) -> Option<&BreakRoll> {
        self.break_roll.as_ref()
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn duration_secs(&self) -> u32 {
        self.cadence.duration(self.state.phase)
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.duration_secs().saturating_sub(self.state.seconds_remaining)
    }

    /// URL the playback channel should be on for the current phase.
    pub fn current_url(&self) -> &'static str {
        match self.break_roll {
            Some(roll) if self.state.phase.is_break() => roll.track.url,
            _ => self.focus_url,
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.duration_secs();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.elapsed_secs()) / f64::from(total)
    }

    /// Label for display, `Paused` while paused.
    pub fn label(&self) -> &'static str {
        if self.state.paused {
            "Paused"
        } else {
            self.state.phase.label()
        }
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.state.phase,
            label: self.label().to_string(),
            seconds_remaining: self.state.seconds_remaining,
            duration_secs: self.duration_secs(),
            progress: self.progress(),
            paused: self.state.paused,
            sessions_completed_today: self.counters.sessions_completed_today,
            cycles_completed: self.counters.cycles_completed,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Call once per wall-clock second. Returns the transition when the
    /// current phase completes on this tick.
    ///
    /// A phase whose duration is zero completes on the first tick after it
    /// is entered, so a misconfigured cadence still advances one phase per
    /// tick instead of spinning.
    pub fn tick(&mut self) -> Option<Transition> {
        if self.state.paused {
            return None;
        }
        if self.state.seconds_remaining > 0 {
            self.state.seconds_remaining -= 1;
            if self.state.seconds_remaining > 0 {
                return None;
            }
        }
        Some(self.on_phase_complete())
    }

    /// Complete the current phase and enter the next one.
    pub fn on_phase_complete(&mut self) -> Transition {
        let from = self.state.phase;
        match from {
            Phase::Focus => {
                self.counters.sessions_completed_today =
                    self.counters.sessions_completed_today.saturating_add(1);
                let completed = self.counters.sessions_completed_today;
                let entry = format!("Session {completed} completed");
                self.log.push(entry.clone());

                let body = self.pick_message(catalog::FOCUS_COMPLETE_MESSAGES);
                let to = self.cadence.break_after(completed);
                if to == Phase::LongBreak {
                    self.counters.cycles_completed = self.counters.cycles_completed.saturating_add(1);
                }
                self.enter(to);
                Transition {
                    from,
                    to,
                    cue: Cue::FocusComplete,
                    notification: body,
                    counters: Some(self.counters),
                    log_entry: Some(entry),
                }
            }
            Phase::ShortBreak | Phase::LongBreak => {
                let (cue, body) = if from == Phase::ShortBreak {
                    (Cue::BreakOver, catalog::SHORT_BREAK_OVER_MESSAGE)
                } else {
                    (Cue::LongBreakOver, catalog::LONG_BREAK_OVER_MESSAGE)
                };
                self.enter(Phase::Focus);
                Transition {
                    from,
                    to: Phase::Focus,
                    cue,
                    notification: self.notifications.then_some(body),
                    counters: None,
                    log_entry: None,
                }
            }
        }
    }

    /// Flip the paused flag. Returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.state.paused = !self.state.paused;
        self.state.paused
    }

    /// Switch the focus track. Only honoured during a focus phase and only
    /// for catalog URLs. Returns `true` when the track actually changed.
    pub fn set_music(&mut self, url: &str) -> bool {
        if self.state.phase != Phase::Focus || url == self.focus_url {
            return false;
        }
        match self.catalog.focus_by_url(url) {
            Some(track) => {
                self.focus_url = track.url;
                true
            }
            None => false,
        }
    }

    /// Replace the rolled track of the current break. Only honoured during a
    /// break and only for URLs from that break's list. The remaining time
    /// and the break message are kept. Returns `true` when the track changed.
    pub fn set_break_track(&mut self, url: &str) -> bool {
        let phase = self.state.phase;
        if !phase.is_break() {
            return false;
        }
        let Some(roll) = self.break_roll.as_mut() else {
            return false;
        };
        if roll.track.url == url {
            return false;
        }
        match self.catalog.tracks_for(phase).iter().find(|t| t.url == url) {
            Some(track) => {
                roll.track = *track;
                true
            }
            None => false,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter(&mut self, phase: Phase) {
        self.state.phase = phase;
        self.state.seconds_remaining = self.cadence.duration(phase);
        self.break_roll = match phase {
            Phase::Focus => None,
            Phase::ShortBreak => self.roll(self.catalog.short_break, catalog::SHORT_BREAK_MESSAGES),
            Phase::LongBreak => self.roll(self.catalog.long_break, catalog::LONG_BREAK_MESSAGES),
        };
    }

    fn roll(&mut self, tracks: &'static [Track], messages: &[&'static str]) -> Option<BreakRoll> {
        let track = *tracks.choose(&mut self.rng)?;
        let message = messages.choose(&mut self.rng).copied().unwrap_or_default();
        Some(BreakRoll { track, message })
    }

    fn pick_message(&mut self, messages: &[&'static str]) -> Option<&'static str> {
        if !self.notifications {
            return None;
        }
        messages.choose(&mut self.rng).copied()
    }
}
