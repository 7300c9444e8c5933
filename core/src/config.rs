//! Tunable configuration surface of the simulation.
//!
//! Every knob carries a default so a configuration file only needs to name
//! the values it overrides. Durations are expressed in whole milliseconds on
//! the wire and exposed as [`Duration`] through accessor methods.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AdmissionMode, ColorPolicy, FloorGap, ResolverMode};

/// Aggregated configuration for every component of the simulation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Dimensions of the playfield.
    pub screen: ScreenConfig,
    /// Spawn cadence and shape of new particles.
    pub spawning: SpawnConfig,
    /// Physics cadence and collision response tuning.
    pub physics: PhysicsConfig,
    /// Capacity bounds and hysteresis thresholds.
    pub admission: AdmissionConfig,
    /// Frame pacing of the simulation loop.
    pub frame: FrameConfig,
}

impl SimulationConfig {
    /// Checks the cross-field constraints the components rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let spawning = &self.spawning;
        if spawning.min_radius == 0 || spawning.min_radius > spawning.max_radius {
            return Err(ConfigError::InvalidRadiusRange {
                min: spawning.min_radius,
                max: spawning.max_radius,
            });
        }

        let diameter = 2.0 * spawning.max_radius as f32;
        if !self.screen.width.is_finite() || self.screen.width < diameter {
            return Err(ConfigError::ScreenTooNarrow {
                width: self.screen.width,
                max_radius: spawning.max_radius,
            });
        }
        if !self.screen.floor_y.is_finite() || self.screen.floor_y < spawning.max_radius as f32 {
            return Err(ConfigError::FloorTooHigh {
                floor_y: self.screen.floor_y,
                max_radius: spawning.max_radius,
            });
        }
        if !spawning.speed.is_finite() {
            return Err(ConfigError::NonFinite { field: "spawning.speed" });
        }
        if let ColorPolicy::Palette(colors) = &spawning.color {
            if colors.is_empty() {
                return Err(ConfigError::EmptyPalette);
            }
        }

        let zero_intervals = [
            ("spawning.interval_ms", spawning.interval_ms),
            ("physics.interval_ms", self.physics.interval_ms),
            ("frame.target_frame_time_ms", self.frame.target_frame_time_ms),
        ];
        for (field, value) in zero_intervals {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { field });
            }
        }

        let physics = &self.physics;
        let positive = [
            ("physics.max_acceleration", physics.max_acceleration),
            ("physics.max_push_distance", physics.max_push_distance),
            ("physics.epsilon", physics.epsilon),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if let Some(gap) = physics.floor_gap {
            if !(gap.start_x <= gap.end_x) {
                return Err(ConfigError::InvertedFloorGap {
                    start_x: gap.start_x,
                    end_x: gap.end_x,
                });
            }
        }

        let admission = &self.admission;
        if admission.capacity_floor > admission.original_capacity {
            return Err(ConfigError::InvalidCapacityBounds {
                floor: admission.capacity_floor,
                original: admission.original_capacity,
            });
        }
        if admission.step == 0 {
            return Err(ConfigError::ZeroCapacityStep);
        }

        Ok(())
    }
}

/// Playfield geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenConfig {
    /// Horizontal extent in world units; spawns stay fully inside `0..=width`.
    pub width: f32,
    /// Vertical coordinate of the floor particles come to rest on.
    pub floor_y: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            floor_y: 600.0,
        }
    }
}

/// Spawn cadence and shape of new particles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnConfig {
    /// Smallest radius a new particle may receive (inclusive).
    pub min_radius: u32,
    /// Largest radius a new particle may receive (inclusive).
    pub max_radius: u32,
    /// Initial downward velocity in world units per physics step.
    pub speed: f32,
    /// Minimum time between two successful spawns.
    pub interval_ms: u64,
    /// Policy assigning the display payload.
    pub color: ColorPolicy,
}

impl SpawnConfig {
    /// Minimum time between two successful spawns.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            min_radius: 8,
            max_radius: 64,
            speed: 0.5,
            interval_ms: 600,
            color: ColorPolicy::Random,
        }
    }
}

/// Physics cadence and collision response tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    /// Minimum time between two physics steps.
    pub interval_ms: u64,
    /// Per-axis bound on the velocity change a single collision may cause.
    pub max_acceleration: f32,
    /// Per-axis bound on the displacement a single collision may cause.
    pub max_push_distance: f32,
    /// Centre distance below which a collision normal is considered undefined.
    pub epsilon: f32,
    /// Fidelity of the collision response.
    pub resolver: ResolverMode,
    /// Optional span of the floor particles fall through.
    pub floor_gap: Option<FloorGap>,
}

impl PhysicsConfig {
    /// Minimum time between two physics steps.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            interval_ms: 16,
            max_acceleration: 2.0,
            max_push_distance: 8.0,
            epsilon: 1e-4,
            resolver: ResolverMode::Impulse,
            floor_gap: None,
        }
    }
}

/// Capacity bounds and hysteresis thresholds of the admission controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdmissionConfig {
    /// Behaviour of the store once it is full.
    pub mode: AdmissionMode,
    /// Capacity at start-up and the ceiling capacity never grows beyond.
    pub original_capacity: usize,
    /// Capacity never shrinks below this value.
    pub capacity_floor: usize,
    /// Amount added or removed by a single decision.
    pub step: usize,
    /// Frame duration above which a frame counts as over budget.
    pub frame_budget_ms: u64,
    /// Sustained over-budget time required before shrinking.
    pub delay_threshold_ms: u64,
    /// Sustained within-budget time required before growing.
    pub no_delay_threshold_ms: u64,
    /// Minimum time between two capacity decisions.
    pub debounce_ms: u64,
}

impl AdmissionConfig {
    /// Frame duration above which a frame counts as over budget.
    #[must_use]
    pub const fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    /// Sustained over-budget time required before shrinking.
    #[must_use]
    pub const fn delay_threshold(&self) -> Duration {
        Duration::from_millis(self.delay_threshold_ms)
    }

    /// Sustained within-budget time required before growing.
    #[must_use]
    pub const fn no_delay_threshold(&self) -> Duration {
        Duration::from_millis(self.no_delay_threshold_ms)
    }

    /// Minimum time between two capacity decisions.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            mode: AdmissionMode::LiveTrim,
            original_capacity: 400,
            capacity_floor: 20,
            step: 20,
            frame_budget_ms: 33,
            delay_threshold_ms: 1_000,
            no_delay_threshold_ms: 5_000,
            debounce_ms: 2_000,
        }
    }
}

/// Frame pacing of the simulation loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    /// Wall-clock duration one loop cycle is padded to.
    pub target_frame_time_ms: u64,
}

impl FrameConfig {
    /// Wall-clock duration one loop cycle is padded to.
    #[must_use]
    pub const fn target_frame_time(&self) -> Duration {
        Duration::from_millis(self.target_frame_time_ms)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            target_frame_time_ms: 33,
        }
    }
}

/// Reasons a configuration is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Radius range is empty, inverted, or starts at zero.
    #[error("radius range {min}..={max} is empty or starts at zero")]
    InvalidRadiusRange {
        /// Configured minimum radius.
        min: u32,
        /// Configured maximum radius.
        max: u32,
    },
    /// The widest particle does not fit horizontally.
    #[error("screen width {width} cannot fit a particle of radius {max_radius}")]
    ScreenTooNarrow {
        /// Configured screen width.
        width: f32,
        /// Configured maximum radius.
        max_radius: u32,
    },
    /// The floor sits above the centre of the largest particle at spawn.
    #[error("floor at y={floor_y} is above the largest radius {max_radius}")]
    FloorTooHigh {
        /// Configured floor height.
        floor_y: f32,
        /// Configured maximum radius.
        max_radius: u32,
    },
    /// A field that must be finite is NaN or infinite.
    #[error("{field} must be finite")]
    NonFinite {
        /// Dotted path of the offending field.
        field: &'static str,
    },
    /// A cadence is zero.
    #[error("{field} must be greater than zero")]
    ZeroInterval {
        /// Dotted path of the offending field.
        field: &'static str,
    },
    /// A tuning value must be strictly positive.
    #[error("{field} must be positive (received {value})")]
    NotPositive {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// The floor gap ends before it starts.
    #[error("floor gap {start_x}..{end_x} is inverted")]
    InvertedFloorGap {
        /// Configured left edge.
        start_x: f32,
        /// Configured right edge.
        end_x: f32,
    },
    /// The capacity floor exceeds the original capacity.
    #[error("capacity floor {floor} exceeds original capacity {original}")]
    InvalidCapacityBounds {
        /// Configured floor.
        floor: usize,
        /// Configured original capacity.
        original: usize,
    },
    /// Capacity decisions would never change anything.
    #[error("admission.step must be greater than zero")]
    ZeroCapacityStep,
    /// A palette policy was configured without any colors.
    #[error("color palette must contain at least one color")]
    EmptyPalette,
}
