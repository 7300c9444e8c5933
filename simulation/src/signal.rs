//! Quit signals polled once per loop cycle.

use circlefall_core::Timestamp;

/// External source telling the loop to stop after the current cycle.
pub trait QuitSignal {
    /// Polled once per cycle with the cycle's start time.
    fn quit_requested(&mut self, now: Timestamp) -> bool;
}

/// Requests termination once the given number of cycles has been polled.
#[derive(Clone, Copy, Debug)]
pub struct FrameLimit {
    remaining: u64,
}

impl FrameLimit {
    /// Lets exactly `frames` cycles run; values below one still run a single cycle.
    #[must_use]
    pub const fn new(frames: u64) -> Self {
        Self { remaining: frames }
    }
}

impl QuitSignal for FrameLimit {
    fn quit_requested(&mut self, _now: Timestamp) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// Requests termination in the first cycle starting at or after a timestamp.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    at: Timestamp,
}

impl Deadline {
    /// Stops the loop once `at` has been reached.
    #[must_use]
    pub const fn new(at: Timestamp) -> Self {
        Self { at }
    }
}

impl QuitSignal for Deadline {
    fn quit_requested(&mut self, now: Timestamp) -> bool {
        now >= self.at
    }
}
