mod engine;
mod phase;
mod ticker;

pub use engine::{BreakRoll, PhaseEngine, TimerState, Transition};
pub use phase::{format_clock, Cadence, Phase, SessionCounters};
pub use ticker::{IntervalTicker, ManualTicker, TickHandle, TickSource};
