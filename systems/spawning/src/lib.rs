#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rate-limited spawning system that emits particle spawn commands.

use std::time::Duration;

use circlefall_core::{
    AdmissionMode, ColorPolicy, Command, ParticleColor, ParticleSeed, SimulationConfig, Timestamp,
};
use circlefall_world::ParticleStore;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug)]
pub struct Config {
    spawn_interval: Duration,
    min_radius: u32,
    max_radius: u32,
    width: f32,
    speed: f32,
    color: ColorPolicy,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration with an explicit cadence, radius range and playfield width.
    ///
    /// New particles fall at `speed` and use random colors until [`Config::with_colors`]
    /// says otherwise.
    #[must_use]
    pub const fn new(
        spawn_interval: Duration,
        min_radius: u32,
        max_radius: u32,
        width: f32,
        speed: f32,
        rng_seed: u64,
    ) -> Self {
        Self {
            spawn_interval,
            min_radius,
            max_radius,
            width,
            speed,
            color: ColorPolicy::Random,
            rng_seed,
        }
    }

    /// Derives the spawning configuration from the simulation configuration.
    #[must_use]
    pub fn from_simulation(config: &SimulationConfig, rng_seed: u64) -> Self {
        let spawning = &config.spawning;
        Self::new(
            spawning.interval(),
            spawning.min_radius,
            spawning.max_radius,
            config.screen.width,
            spawning.speed,
            rng_seed,
        )
        .with_colors(spawning.color.clone())
    }

    /// Replaces the color policy applied to new particles.
    #[must_use]
    pub fn with_colors(mut self, color: ColorPolicy) -> Self {
        self.color = color;
        self
    }
}

/// Pure system that emits at most one spawn command per spawn interval.
#[derive(Debug)]
pub struct SpawnScheduler {
    spawn_interval: Duration,
    min_radius: u32,
    max_radius: u32,
    width: f32,
    speed: f32,
    color: ColorPolicy,
    palette_index: usize,
    rng: ChaCha8Rng,
    last_spawn: Option<Timestamp>,
}

impl SpawnScheduler {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_interval: config.spawn_interval,
            min_radius: config.min_radius,
            max_radius: config.max_radius.max(config.min_radius),
            width: config.width,
            speed: config.speed,
            color: config.color,
            palette_index: 0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            last_spawn: None,
        }
    }

    /// Emits a spawn command when the interval has elapsed and the store accepts particles.
    ///
    /// Blocking stores that are full are left alone regardless of elapsed time.
    /// Returns `true` when a command was emitted.
    pub fn try_spawn(
        &mut self,
        now: Timestamp,
        store: &ParticleStore,
        out: &mut Vec<Command>,
    ) -> bool {
        if store.mode() == AdmissionMode::Blocking && store.is_full() {
            return false;
        }

        if let Some(last_spawn) = self.last_spawn {
            if now.saturating_duration_since(last_spawn) < self.spawn_interval {
                return false;
            }
        }

        let seed = self.next_seed();
        out.push(Command::SpawnParticle { seed });
        self.last_spawn = Some(now);
        true
    }

    /// Time of the most recent successful spawn, if any.
    #[must_use]
    pub const fn last_spawn(&self) -> Option<Timestamp> {
        self.last_spawn
    }

    fn next_seed(&mut self) -> ParticleSeed {
        let radius = self.rng.gen_range(self.min_radius..=self.max_radius);
        let right_edge = (self.width.max(0.0) as u32).saturating_sub(radius).max(radius);
        let x = self.rng.gen_range(radius..=right_edge);
        let color = self.next_color();

        ParticleSeed {
            x: x as f32,
            y: 0.0,
            radius: radius as f32,
            dx: 0.0,
            dy: self.speed,
            color,
        }
    }

    fn next_color(&mut self) -> ParticleColor {
        match &self.color {
            ColorPolicy::Random => {
                ParticleColor::from_rgb(self.rng.gen(), self.rng.gen(), self.rng.gen())
            }
            ColorPolicy::Palette(colors) if !colors.is_empty() => {
                let color = colors[self.palette_index % colors.len()];
                self.palette_index = (self.palette_index + 1) % colors.len();
                color
            }
            ColorPolicy::Palette(_) => ParticleColor::from_rgb(0xff, 0xff, 0xff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_playfield_pins_spawn_to_radius() {
        let mut scheduler = SpawnScheduler::new(Config::new(
            Duration::from_millis(10),
            5,
            5,
            10.0,
            0.5,
            7,
        ));

        for _ in 0..16 {
            let seed = scheduler.next_seed();
            assert_eq!(seed.x, 5.0);
            assert_eq!(seed.radius, 5.0);
        }
    }

    #[test]
    fn palette_colors_wrap_around() {
        let palette = vec![
            ParticleColor::from_rgb(0x2f, 0x95, 0x32),
            ParticleColor::from_rgb(0xc8, 0x2a, 0x36),
        ];
        let mut scheduler = SpawnScheduler::new(
            Config::new(Duration::from_millis(10), 8, 16, 200.0, 0.5, 1)
                .with_colors(ColorPolicy::Palette(palette.clone())),
        );

        let drawn: Vec<_> = (0..4).map(|_| scheduler.next_color()).collect();

        assert_eq!(
            drawn,
            vec![palette[0], palette[1], palette[0], palette[1]]
        );
    }
}
