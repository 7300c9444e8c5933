#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame loop tying the Circlefall systems to the particle store.
//!
//! Each cycle spawns before it integrates and integrates before the renderer
//! sees the store. The measured cost of a cycle is only fed to the admission
//! controller once the cycle has finished, so any capacity change takes effect
//! from the next cycle on.

mod clock;
mod signal;

use std::time::Duration;

use serde::Serialize;

use circlefall_core::{Clock, Command, ConfigError, Event, SimulationConfig, Timestamp};
use circlefall_system_admission::{self as admission, AdmissionController, CapacityChange};
use circlefall_system_physics::{self as physics, PhysicsStepper, StepStats};
use circlefall_system_spawning::{self as spawning, SpawnScheduler};
use circlefall_world::{
    self as world,
    query::{self, ParticleView},
    ParticleStore,
};

pub use clock::{ManualClock, SystemClock};
pub use signal::{Deadline, FrameLimit, QuitSignal};

/// Consumer of the per-cycle particle snapshot.
pub trait Renderer {
    /// Receives the store contents after spawning and physics ran for the cycle.
    fn present(&mut self, view: ParticleView<'_>);
}

/// What happened during a single call to [`Simulation::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// Whether a particle joined the store this cycle.
    pub spawned: bool,
    /// Statistics of the physics tick, if one was due.
    pub physics: Option<StepStats>,
}

/// Totals accumulated over the lifetime of a simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Cycles stepped.
    pub frames: u64,
    /// Particles admitted into the store.
    pub spawned: u64,
    /// Spawn requests the store refused.
    pub refused: u64,
    /// Particles removed to honour the capacity.
    pub evicted: u64,
    /// Physics ticks that ran.
    pub physics_ticks: u64,
    /// Overlapping pairs resolved across all ticks.
    pub contacts: u64,
    /// Capacity decisions applied to the store.
    pub capacity_changes: u64,
    /// Capacity in force when the report was taken.
    pub final_capacity: usize,
    /// Particles stored when the report was taken.
    pub final_population: usize,
}

/// Owns the particle store together with every system that acts on it.
#[derive(Debug)]
pub struct Simulation {
    store: ParticleStore,
    spawner: SpawnScheduler,
    physics: PhysicsStepper,
    admission: AdmissionController,
    target_frame_time: Duration,
    commands: Vec<Command>,
    events: Vec<Event>,
    report: RunReport,
}

impl Simulation {
    /// Builds a simulation from a validated configuration and a spawn seed.
    pub fn new(config: &SimulationConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let admission = AdmissionController::new(admission::Config::from_simulation(config));
        let store = ParticleStore::new(admission.capacity(), config.admission.mode);
        Ok(Self::from_parts(
            store,
            SpawnScheduler::new(spawning::Config::from_simulation(config, seed)),
            PhysicsStepper::new(physics::Config::from_simulation(config)),
            admission,
            config.frame.target_frame_time(),
        ))
    }

    /// Assembles a simulation from individually configured components.
    #[must_use]
    pub fn from_parts(
        store: ParticleStore,
        spawner: SpawnScheduler,
        physics: PhysicsStepper,
        admission: AdmissionController,
        target_frame_time: Duration,
    ) -> Self {
        Self {
            store,
            spawner,
            physics,
            admission,
            target_frame_time,
            commands: Vec::new(),
            events: Vec::new(),
            report: RunReport::default(),
        }
    }

    /// Runs one cycle: spawn, then physics.
    pub fn step(&mut self, now: Timestamp) -> Frame {
        let mut frame = Frame::default();

        if self.spawner.try_spawn(now, &self.store, &mut self.commands) {
            self.apply_commands();
            frame.spawned = self
                .events
                .iter()
                .any(|event| matches!(event, Event::ParticleSpawned { .. }));
            self.record_events();
        }

        frame.physics = self.physics.tick(now, &mut self.store);
        if let Some(stats) = frame.physics {
            self.report.physics_ticks += 1;
            self.report.contacts += stats.contacts as u64;
        }

        self.report.frames += 1;
        frame
    }

    /// Read-only view of the store for the renderer.
    #[must_use]
    pub fn view(&self) -> ParticleView<'_> {
        query::particle_view(&self.store)
    }

    /// Reports the cost of the finished cycle to the admission controller.
    ///
    /// A resulting capacity change is applied to the store immediately.
    pub fn finish_frame(
        &mut self,
        frame_duration: Duration,
        now: Timestamp,
    ) -> Option<CapacityChange> {
        let change = self
            .admission
            .observe(frame_duration, now, &mut self.commands);
        self.apply_commands();
        self.record_events();
        change
    }

    /// Drives the simulation until `quit` asks it to stop.
    ///
    /// Cycles are paced to the target frame time through `clock`. The cycle in
    /// which the quit request is observed still completes.
    pub fn run<C, R, Q>(&mut self, clock: &C, renderer: &mut R, quit: &mut Q) -> RunReport
    where
        C: Clock,
        R: Renderer,
        Q: QuitSignal,
    {
        loop {
            let start = clock.now();
            let stop = quit.quit_requested(start);

            let _ = self.step(start);
            renderer.present(self.view());

            let cycle = clock.now().saturating_duration_since(start);
            if let Some(remaining) = self.target_frame_time.checked_sub(cycle) {
                if !remaining.is_zero() {
                    clock.sleep(remaining);
                }
            }
            let _ = self.finish_frame(cycle, clock.now());

            if stop {
                break;
            }
        }

        self.report()
    }

    /// Particle store driven by the simulation.
    #[must_use]
    pub const fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// Admission controller sizing the store.
    #[must_use]
    pub const fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// Totals accumulated so far.
    #[must_use]
    pub fn report(&self) -> RunReport {
        RunReport {
            final_capacity: self.store.capacity(),
            final_population: self.store.len(),
            ..self.report
        }
    }

    fn apply_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.store, command, &mut self.events);
        }
    }

    fn record_events(&mut self) {
        for event in self.events.drain(..) {
            match event {
                Event::ParticleSpawned { .. } => self.report.spawned += 1,
                Event::SpawnRefused => self.report.refused += 1,
                Event::ParticlesEvicted { ids } => self.report.evicted += ids.len() as u64,
                Event::CapacityChanged { .. } => self.report.capacity_changes += 1,
            }
        }
    }
}
