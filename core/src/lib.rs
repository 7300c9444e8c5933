#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Circlefall simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative particle store, and pure systems. Systems submit [`Command`]
//! values describing desired membership changes, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! describing what actually happened. Kinematic updates never change
//! membership and are applied by the physics system in place.

mod config;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::{
    AdmissionConfig, ConfigError, FrameConfig, PhysicsConfig, ScreenConfig, SimulationConfig,
    SpawnConfig,
};

/// Point in time measured in whole milliseconds since an arbitrary epoch.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Timestamp located at the clock's epoch.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from a millisecond count.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds elapsed since the clock's epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Duration elapsed since `earlier`, saturating to zero when `earlier` lies in the future.
    #[must_use]
    pub const fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// Returns the timestamp advanced by the provided duration.
    #[must_use]
    pub fn saturating_add(&self, duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

/// Monotonic time source consumed by the simulation loop.
pub trait Clock {
    /// Current time. Successive calls never return a smaller value.
    fn now(&self) -> Timestamp;

    /// Blocks the calling thread for the provided duration.
    fn sleep(&self, duration: Duration);
}

/// Unique identifier assigned to a particle when the store admits it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ParticleId(u64);

impl ParticleId {
    /// Creates a new particle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Opaque display payload carried by every particle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticleColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl ParticleColor {
    /// Creates a new particle color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Everything needed to admit a new particle, minus the identifier the store assigns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSeed {
    /// Horizontal position of the centre.
    pub x: f32,
    /// Vertical position of the centre, growing downwards.
    pub y: f32,
    /// Radius of the body.
    pub radius: f32,
    /// Horizontal velocity in world units per physics step.
    pub dx: f32,
    /// Vertical velocity in world units per physics step.
    pub dy: f32,
    /// Display payload.
    pub color: ParticleColor,
}

/// Single simulated circular body.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    id: ParticleId,
    radius: f32,
    color: ParticleColor,
    /// Horizontal position of the centre.
    pub x: f32,
    /// Vertical position of the centre, growing downwards.
    pub y: f32,
    /// Horizontal velocity in world units per physics step.
    pub dx: f32,
    /// Vertical velocity in world units per physics step.
    pub dy: f32,
}

impl Particle {
    /// Materialises a seed under the provided identifier.
    #[must_use]
    pub const fn from_seed(id: ParticleId, seed: ParticleSeed) -> Self {
        Self {
            id,
            radius: seed.radius,
            color: seed.color,
            x: seed.x,
            y: seed.y,
            dx: seed.dx,
            dy: seed.dy,
        }
    }

    /// Identifier assigned on admission.
    #[must_use]
    pub const fn id(&self) -> ParticleId {
        self.id
    }

    /// Radius drawn at spawn; fixed for the particle's lifetime.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Display payload.
    #[must_use]
    pub const fn color(&self) -> ParticleColor {
        self.color
    }

    /// Euclidean distance between the centres of two particles.
    #[must_use]
    pub fn distance_to(&self, other: &Particle) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Policy applied by the particle store once it reaches capacity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdmissionMode {
    /// New particles are refused while the store is full; shrinking never evicts.
    Blocking,
    /// Oldest particles are evicted immediately to make room or honour a smaller capacity.
    #[default]
    LiveTrim,
}

/// Fidelity of the pairwise collision response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolverMode {
    /// Positional separation plus a velocity impulse along the contact normal.
    #[default]
    Impulse,
    /// Positional separation only; velocities are left untouched.
    SeparationOnly,
}

/// Horizontal span of the floor through which particles fall instead of resting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorGap {
    /// Left edge of the gap in world units.
    pub start_x: f32,
    /// Right edge of the gap in world units.
    pub end_x: f32,
}

impl FloorGap {
    /// Reports whether the provided horizontal coordinate lies inside the gap.
    #[must_use]
    pub fn contains(&self, x: f32) -> bool {
        x >= self.start_x && x <= self.end_x
    }
}

/// Strategy used to pick the display payload of new particles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorPolicy {
    /// Every channel drawn uniformly from the spawner's generator.
    #[default]
    Random,
    /// Colors handed out in order, wrapping around at the end of the list.
    Palette(Vec<ParticleColor>),
}

/// Commands that express all permissible membership changes of the particle store.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests that the store admit a freshly generated particle.
    SpawnParticle {
        /// Initial state of the particle.
        seed: ParticleSeed,
    },
    /// Requests that the store adopt a new capacity.
    SetCapacity {
        /// Capacity the store should enforce from now on.
        capacity: usize,
    },
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a particle was admitted into the store.
    ParticleSpawned {
        /// Identifier assigned to the new particle.
        id: ParticleId,
    },
    /// Reports that a spawn request was refused because the store was full.
    SpawnRefused,
    /// Reports particles that were removed to honour the store capacity, oldest first.
    ParticlesEvicted {
        /// Identifiers of the evicted particles.
        ids: Vec<ParticleId>,
    },
    /// Confirms that the store capacity changed.
    CapacityChanged {
        /// Capacity in force before the command.
        from: usize,
        /// Capacity in force after the command.
        to: usize,
    },
}
