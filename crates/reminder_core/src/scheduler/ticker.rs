//! Periodic wake-up capability for the single-threaded event loop.

use log::debug;
use std::time::Duration;

/// Blocks the event loop between ticks.
pub trait Ticker {
    /// Waits up to `timeout`. Returns `false` when the loop should stop.
    fn wait(&mut self, timeout: Duration) -> bool;
}

/// Ticker that sleeps the current thread.
///
/// With a tick limit the loop stops after that many waits; without one it
/// runs until the process exits.
#[derive(Debug, Clone, Default)]
pub struct SleepTicker {
    remaining: Option<u64>,
}

impl SleepTicker {
    pub fn unbounded() -> Self {
        Self { remaining: None }
    }

    pub fn limited(ticks: u64) -> Self {
        Self {
            remaining: Some(ticks),
        }
    }
}

impl Ticker for SleepTicker {
    fn wait(&mut self, timeout: Duration) -> bool {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return false;
            }
            *remaining -= 1;
        }
        debug!(
            "event=ticker_wait module=scheduler status=start timeout_ms={}",
            timeout.as_millis()
        );
        std::thread::sleep(timeout);
        true
    }
}
