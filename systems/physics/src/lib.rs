#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-interval physics system that integrates motion and resolves contacts.
//!
//! The stepper runs on its own cadence, independent of how often the loop
//! calls it. Each qualifying tick advances every particle by exactly one
//! explicit Euler step, clamps bodies that reach the floor into resting
//! contact, and then makes a single relaxation pass over all pairs in store
//! order. The pass is local and order dependent: a pair resolved early may be
//! disturbed again by a later pair in the same tick.

mod collision;

use std::time::Duration;

use circlefall_core::{FloorGap, Particle, SimulationConfig, Timestamp};
use circlefall_world::ParticleStore;

pub use collision::{CollisionResolver, Resolution};

/// Configuration parameters required to construct the physics system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    interval: Duration,
    floor_y: f32,
    floor_gap: Option<FloorGap>,
    resolver: CollisionResolver,
}

impl Config {
    /// Creates a new configuration using the provided cadence, floor and resolver.
    #[must_use]
    pub const fn new(interval: Duration, floor_y: f32, resolver: CollisionResolver) -> Self {
        Self {
            interval,
            floor_y,
            floor_gap: None,
            resolver,
        }
    }

    /// Derives the physics configuration from the simulation configuration.
    #[must_use]
    pub fn from_simulation(config: &SimulationConfig) -> Self {
        let mut physics = Self::new(
            config.physics.interval(),
            config.screen.floor_y,
            CollisionResolver::from_config(&config.physics),
        );
        physics.floor_gap = config.physics.floor_gap;
        physics
    }

    /// Opens a gap in the floor through which particles keep falling.
    #[must_use]
    pub const fn with_floor_gap(mut self, gap: FloorGap) -> Self {
        self.floor_gap = Some(gap);
        self
    }
}

/// Counters describing a completed physics tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Particles that reached the floor and were brought to rest.
    pub landed: usize,
    /// Overlapping pairs that were pushed apart.
    pub contacts: usize,
    /// Overlapping pairs skipped because their centres coincided.
    pub degenerate: usize,
}

/// Pure system advancing particle kinematics on a fixed cadence.
#[derive(Debug)]
pub struct PhysicsStepper {
    interval: Duration,
    floor_y: f32,
    floor_gap: Option<FloorGap>,
    resolver: CollisionResolver,
    last_tick: Option<Timestamp>,
}

impl PhysicsStepper {
    /// Creates a new physics system using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            interval: config.interval,
            floor_y: config.floor_y,
            floor_gap: config.floor_gap,
            resolver: config.resolver,
            last_tick: None,
        }
    }

    /// Runs one physics step when the interval has elapsed since the previous one.
    ///
    /// Returns `None` without touching the store when called too early.
    pub fn tick(&mut self, now: Timestamp, store: &mut ParticleStore) -> Option<StepStats> {
        if let Some(last_tick) = self.last_tick {
            if now.saturating_duration_since(last_tick) < self.interval {
                return None;
            }
        }

        let particles = store.particles_mut();
        let mut stats = StepStats::default();

        for particle in particles.iter_mut() {
            if self.integrate(particle) {
                stats.landed += 1;
            }
        }

        for index in 0..particles.len() {
            let (head, tail) = particles.split_at_mut(index + 1);
            let first = &mut head[index];
            for second in tail.iter_mut() {
                if !self.resolver.colliding(first, second) {
                    continue;
                }
                match self.resolver.resolve(first, second) {
                    Resolution::Resolved => stats.contacts += 1,
                    Resolution::Degenerate => stats.degenerate += 1,
                    Resolution::Apart => {}
                }
            }
        }

        self.last_tick = Some(now);
        Some(stats)
    }

    /// Time of the most recent physics step, if any.
    #[must_use]
    pub const fn last_tick(&self) -> Option<Timestamp> {
        self.last_tick
    }

    /// Resolver applied to overlapping pairs.
    #[must_use]
    pub const fn resolver(&self) -> &CollisionResolver {
        &self.resolver
    }

    fn integrate(&self, particle: &mut Particle) -> bool {
        particle.x += particle.dx;
        particle.y += particle.dy;

        let over_gap = self
            .floor_gap
            .map_or(false, |gap| gap.contains(particle.x));
        if particle.y + particle.radius() < self.floor_y || over_gap {
            return false;
        }

        particle.y = self.floor_y - particle.radius();
        particle.dx = 0.0;
        particle.dy = 0.0;
        true
    }
}
