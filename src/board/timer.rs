//! Countdown timers.
//!
//! Timers model elapsed real time as explicit `advance` calls driven by
//! the host run loop, decoupled from whose logical turn it is. Flipping
//! a timer is a move; the countdown itself is not part of the digest
//! because replicas advance their clocks independently.

use serde::{Deserialize, Serialize};

/// One sand timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Milliseconds left in the current run. May go negative while an
    /// expired timer waits to be flipped.
    pub remaining_ms: i64,
    /// Configured run length.
    pub duration_ms: i64,
    pub running: bool,
    /// Number of completed flips.
    pub flips: u32,
}

impl Timer {
    /// Create a stopped timer with the given run length.
    #[must_use]
    pub fn new(duration_ms: u64) -> Self {
        Self {
            remaining_ms: 0,
            duration_ms: duration_ms as i64,
            running: false,
            flips: 0,
        }
    }

    /// Consume elapsed wall-clock time.
    pub fn advance(&mut self, delta_ms: u64) {
        if self.running {
            self.remaining_ms -= delta_ms as i64;
        }
    }

    /// True when the sand has run out and the timer awaits its flip.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.running && self.remaining_ms <= 0
    }

    /// Flip: restart the countdown from the configured duration.
    /// The timer stays running.
    pub fn flip(&mut self) {
        self.remaining_ms = self.duration_ms;
        self.running = true;
        self.flips += 1;
    }

    /// Pause without resetting.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Back to the initial stopped state.
    pub fn reset(&mut self) {
        self.remaining_ms = 0;
        self.running = false;
        self.flips = 0;
    }
}
