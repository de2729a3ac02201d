//! Idle timing
//!
//! Monotonic stopwatch used by dynamic record sizing to detect steady-state
//! inactivity on a connection's write side.

use std::time::{Duration, Instant};

/// Per-connection idle stopwatch.
///
/// Measures time since the last throughput-relevant event. Reading the
/// elapsed time and restarting the measurement happen in one step, matching
/// how the record-size controller consumes it.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    last_reset: Instant,
}

impl IdleTimer {
    pub fn new() -> Self {
        IdleTimer {
            last_reset: Instant::now(),
        }
    }

    /// Restart the stopwatch, returning the time elapsed since the previous
    /// reset
    pub fn reset(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_reset);
        self.last_reset = now;
        elapsed
    }

    /// Time elapsed since the last reset, without restarting
    pub fn elapsed(&self) -> Duration {
        self.last_reset.elapsed()
    }
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new()
    }
}
