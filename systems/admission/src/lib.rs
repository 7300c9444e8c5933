#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Hysteresis admission control that sizes the particle store to the frame budget.
//!
//! The controller shrinks the store quickly when frames stay over budget and
//! grows it back slowly once they stay within budget. Both directions move by a
//! fixed step, are clamped to `[floor, original]`, and are rate limited by a
//! debounce window so a single burst cannot cause the capacity to flap.

use std::time::Duration;

use circlefall_core::{Command, SimulationConfig, Timestamp};

/// Configuration parameters required to construct the admission controller.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    original_capacity: usize,
    capacity_floor: usize,
    step: usize,
    frame_budget: Duration,
    delay_threshold: Duration,
    no_delay_threshold: Duration,
    debounce: Duration,
}

impl Config {
    /// Creates a configuration with the provided capacity bounds and step.
    ///
    /// Timing defaults to a 33 ms budget, 1 s shrink delay, 5 s growth delay and
    /// a 2 s debounce window.
    #[must_use]
    pub const fn new(original_capacity: usize, capacity_floor: usize, step: usize) -> Self {
        let capacity_floor = if capacity_floor > original_capacity {
            original_capacity
        } else {
            capacity_floor
        };
        Self {
            original_capacity,
            capacity_floor,
            step,
            frame_budget: Duration::from_millis(33),
            delay_threshold: Duration::from_millis(1_000),
            no_delay_threshold: Duration::from_millis(5_000),
            debounce: Duration::from_millis(2_000),
        }
    }

    /// Derives the admission configuration from the simulation configuration.
    #[must_use]
    pub fn from_simulation(config: &SimulationConfig) -> Self {
        let admission = &config.admission;
        Self::new(
            admission.original_capacity,
            admission.capacity_floor,
            admission.step,
        )
        .with_frame_budget(admission.frame_budget())
        .with_thresholds(admission.delay_threshold(), admission.no_delay_threshold())
        .with_debounce(admission.debounce())
    }

    /// Replaces the frame duration above which a frame counts as over budget.
    #[must_use]
    pub const fn with_frame_budget(mut self, frame_budget: Duration) -> Self {
        self.frame_budget = frame_budget;
        self
    }

    /// Replaces the sustained durations required before shrinking and growing.
    #[must_use]
    pub const fn with_thresholds(mut self, delay: Duration, no_delay: Duration) -> Self {
        self.delay_threshold = delay;
        self.no_delay_threshold = no_delay;
        self
    }

    /// Replaces the minimum time between two capacity decisions.
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Phase of the control loop, carrying the time the current streak began.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PressureState {
    /// No streak is being tracked.
    #[default]
    Nominal,
    /// Every frame since `since` exceeded the budget.
    UnderPressure {
        /// First over-budget observation of the streak.
        since: Timestamp,
    },
    /// Every frame since `since` stayed within the budget.
    Relieved {
        /// First within-budget observation of the streak.
        since: Timestamp,
    },
}

/// Capacity adjustment decided by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapacityChange {
    /// Capacity before the decision.
    pub from: usize,
    /// Capacity after the decision.
    pub to: usize,
}

/// Pure system that turns frame-duration observations into capacity commands.
#[derive(Debug)]
pub struct AdmissionController {
    config: Config,
    capacity: usize,
    state: PressureState,
    last_decision: Option<Timestamp>,
}

impl AdmissionController {
    /// Creates a controller starting at the original capacity.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            capacity: config.original_capacity,
            config,
            state: PressureState::Nominal,
            last_decision: None,
        }
    }

    /// Feeds the cost of the previous cycle observed at `now`.
    ///
    /// Emits [`Command::SetCapacity`] and returns the change whenever a
    /// sustained streak crosses its threshold outside the debounce window.
    pub fn observe(
        &mut self,
        frame_duration: Duration,
        now: Timestamp,
        out: &mut Vec<Command>,
    ) -> Option<CapacityChange> {
        if frame_duration > self.config.frame_budget {
            let since = match self.state {
                PressureState::UnderPressure { since } => since,
                _ => now,
            };
            self.state = PressureState::UnderPressure { since };

            if now.saturating_duration_since(since) >= self.config.delay_threshold
                && self.debounce_elapsed(now)
            {
                self.state = PressureState::Nominal;
                let target = self
                    .capacity
                    .saturating_sub(self.config.step)
                    .max(self.config.capacity_floor);
                return self.commit(target, now, out);
            }
        } else {
            let since = match self.state {
                PressureState::Relieved { since } => since,
                _ => now,
            };
            self.state = PressureState::Relieved { since };

            if now.saturating_duration_since(since) >= self.config.no_delay_threshold
                && self.debounce_elapsed(now)
            {
                self.state = PressureState::Nominal;
                let target = self
                    .capacity
                    .saturating_add(self.config.step)
                    .min(self.config.original_capacity);
                return self.commit(target, now, out);
            }
        }

        None
    }

    /// Capacity currently granted to the store.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Capacity the controller started with and never grows beyond.
    #[must_use]
    pub const fn original_capacity(&self) -> usize {
        self.config.original_capacity
    }

    /// Capacity the controller never shrinks below.
    #[must_use]
    pub const fn capacity_floor(&self) -> usize {
        self.config.capacity_floor
    }

    /// Current phase of the control loop.
    #[must_use]
    pub const fn state(&self) -> PressureState {
        self.state
    }

    /// Time of the most recent capacity change, if any.
    #[must_use]
    pub const fn last_decision(&self) -> Option<Timestamp> {
        self.last_decision
    }

    fn debounce_elapsed(&self, now: Timestamp) -> bool {
        self.last_decision.map_or(true, |last| {
            now.saturating_duration_since(last) >= self.config.debounce
        })
    }

    fn commit(
        &mut self,
        target: usize,
        now: Timestamp,
        out: &mut Vec<Command>,
    ) -> Option<CapacityChange> {
        if target == self.capacity {
            return None;
        }

        let change = CapacityChange {
            from: self.capacity,
            to: target,
        };
        self.capacity = target;
        self.last_decision = Some(now);
        out.push(Command::SetCapacity { capacity: target });
        tracing::info!(
            from = change.from,
            to = change.to,
            at_ms = now.as_millis(),
            "capacity {} -> {}",
            change.from,
            change.to
        );
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_above_original_is_clamped() {
        let config = Config::new(10, 50, 5);
        let controller = AdmissionController::new(config);

        assert_eq!(controller.capacity_floor(), 10);
        assert_eq!(controller.capacity(), 10);
    }

    #[test]
    fn decisions_at_a_bound_do_not_consume_the_debounce_window() {
        let config = Config::new(100, 20, 20).with_thresholds(Duration::ZERO, Duration::ZERO);
        let mut controller = AdmissionController::new(config);
        let mut out = Vec::new();

        assert_eq!(
            controller.observe(Duration::from_millis(1), Timestamp::ZERO, &mut out),
            None
        );
        assert_eq!(controller.last_decision(), None);
        assert_eq!(controller.state(), PressureState::Nominal);
        assert!(out.is_empty());
    }
}
