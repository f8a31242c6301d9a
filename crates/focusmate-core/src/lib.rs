//! # FocusMate Core Library
//!
//! This library provides the core logic for the FocusMate Pomodoro timer.
//! The CLI is a thin shell over the same types: it collects settings, drives
//! the tick loop and renders snapshots.
//!
//! ## Architecture
//!
//! - **Phase Engine**: a tick-driven state machine cycling Focus, Short Break
//!   and Long Break. The caller invokes `tick()` once per second.
//! - **Session Store**: persisted counters and last-used settings in a
//!   string-keyed store (SQLite `kv` table).
//! - **Audio Player**: one looping playback channel that follows the active
//!   phase, plus one-shot cue sounds on phase boundaries.
//! - **Notification Gateway**: best-effort desktop notifications.
//!
//! ## Key Components
//!
//! - [`PhaseEngine`]: Core timer state machine
//! - [`FocusSession`]: Wires the engine to storage, audio and notifications
//! - [`SessionStore`]: Counter and settings persistence
//! - [`Config`]: Application configuration management

pub mod audio;
pub mod catalog;
pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod storage;
pub mod timer;

pub use audio::{AudioPlayer, Cue, MediaChannel, ProcessChannel, SilentChannel};
pub use catalog::{Catalog, Track};
pub use error::{ConfigError, NotifyError, PlaybackError, StoreError};
pub use events::Event;
pub use notify::{DesktopNotifier, NotificationGateway, Notifier, Permission};
pub use session::{run_session, FocusSession, SessionCommand, SessionSummary, Update};
pub use storage::{Config, Database, KvStore, MemoryKv, SessionStore, Settings};
pub use timer::{
    format_clock, BreakRoll, Cadence, IntervalTicker, ManualTicker, Phase, PhaseEngine,
    SessionCounters, TickHandle, TickSource, TimerState, Transition,
};
