//! Tick sources for the session loop.
//!
//! The engine never reads a clock. A `TickSource` decides when the next
//! second has passed: `IntervalTicker` follows the wall clock, while
//! `ManualTicker` is driven by hand from tests.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

pub trait TickSource {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    /// Wait for the next tick. Resolves to `false` once the source is
    /// stopped or exhausted.
    fn next_tick(&mut self) -> impl Future<Output = bool>;
}

/// Repeating wall-clock ticker.
#[derive(Debug)]
pub struct IntervalTicker {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl TickSource for IntervalTicker {
    /// Must be called from within a tokio runtime.
    fn start(&mut self) {
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        // A stalled host should not replay a burst of missed seconds.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    fn stop(&mut self) {
        self.interval = None;
    }

    fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    async fn next_tick(&mut self) -> bool {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
                true
            }
            None => false,
        }
    }
}

/// Handle used to feed ticks into a [`ManualTicker`].
#[derive(Debug, Clone)]
pub struct TickHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl TickHandle {
    /// Queue `n` ticks. Returns `false` if the ticker is gone.
    pub fn tick_n(&self, n: usize) -> bool {
        (0..n).all(|_| self.tx.send(()).is_ok())
    }

    pub fn tick(&self) -> bool {
        self.tick_n(1)
    }
}

/// Test double: yields exactly the ticks queued through its handle and
/// reports exhaustion once every handle is dropped.
#[derive(Debug)]
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
    running: bool,
    delivered: u64,
}

impl ManualTicker {
    pub fn new() -> (Self, TickHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = Self {
            rx,
            running: false,
            delivered: 0,
        };
        (ticker, TickHandle { tx })
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl TickSource for ManualTicker {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        self.rx.close();
    }

    fn is_running(&self) -> bool {
        self.running
    }

    async fn next_tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        match self.rx.recv().await {
            Some(()) => {
                self.delivered += 1;
                true
            }
            None => {
                self.running = false;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_ticker_yields_queued_ticks_then_exhausts() {
        let (mut ticker, handle) = ManualTicker::new();
        ticker.start();
        assert!(handle.tick_n(3));
        drop(handle);
        let mut count = 0;
        while ticker.next_tick().await {
            count += 1;
        }
        assert_eq!(count, 3);
        assert_eq!(ticker.delivered(), 3);
        assert!(!ticker.is_running());
    }

    #[tokio::test]
    async fn stopped_ticker_yields_nothing() {
        let (mut ticker, handle) = ManualTicker::new();
        ticker.start();
        ticker.stop();
        assert!(!handle.tick());
        assert!(!ticker.next_tick().await);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticker_fires_each_period() {
        let mut ticker = IntervalTicker::every_second();
        assert!(!ticker.next_tick().await);
        ticker.start();
        let begin = Instant::now();
        assert!(ticker.next_tick().await);
        assert!(ticker.next_tick().await);
        assert_eq!(begin.elapsed(), Duration::from_secs(2));
        ticker.stop();
        assert!(!ticker.is_running());
    }
}
