use std::time::Duration;

use circlefall_core::{AdmissionMode, Clock, ConfigError, SimulationConfig, Timestamp};
use circlefall_simulation::{Deadline, FrameLimit, ManualClock, Renderer, Simulation};
use circlefall_world::query::{ParticleSnapshot, ParticleView};

#[derive(Default)]
struct RecordingRenderer {
    populations: Vec<usize>,
}

impl Renderer for RecordingRenderer {
    fn present(&mut self, view: ParticleView<'_>) {
        self.populations.push(view.len());
    }
}

/// Spends a fixed amount of clock time per presented particle.
struct CostlyRenderer<'a> {
    clock: &'a ManualClock,
    per_particle: Duration,
}

impl Renderer for CostlyRenderer<'_> {
    fn present(&mut self, view: ParticleView<'_>) {
        let particles = u32::try_from(view.len()).unwrap_or(u32::MAX);
        self.clock.advance(self.per_particle * particles);
    }
}

fn small_world() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.admission.original_capacity = 40;
    config.admission.capacity_floor = 10;
    config.admission.step = 10;
    config.spawning.interval_ms = 50;
    config
}

#[test]
fn invalid_configuration_is_rejected() {
    let mut config = SimulationConfig::default();
    config.admission.step = 0;

    assert!(matches!(
        Simulation::new(&config, 1),
        Err(ConfigError::ZeroCapacityStep)
    ));
}

#[test]
fn unbounded_capacity_builds_and_steps() {
    let mut config = SimulationConfig::default();
    config.admission.original_capacity = usize::MAX;
    let mut simulation = Simulation::new(&config, 8).expect("config is valid");

    assert!(simulation.step(Timestamp::ZERO).spawned);
    assert_eq!(simulation.store().capacity(), usize::MAX);
}

#[test]
fn renderer_sees_the_particle_after_physics_moved_it() {
    let mut simulation =
        Simulation::new(&SimulationConfig::default(), 7).expect("default config is valid");

    let frame = simulation.step(Timestamp::ZERO);

    assert!(frame.spawned);
    assert!(frame.physics.is_some());
    let particles: Vec<ParticleSnapshot> = simulation.view().to_vec();
    assert_eq!(particles.len(), 1);
    assert_eq!(particles[0].y, 0.5);
    assert_eq!(particles[0].id.get(), 0);
}

#[test]
fn oldest_particle_is_evicted_when_a_full_store_admits_another() {
    let mut config = SimulationConfig::default();
    config.admission.original_capacity = 20;
    let mut simulation = Simulation::new(&config, 3).expect("config is valid");

    for index in 0..21 {
        let frame = simulation.step(Timestamp::from_millis(index * 600));
        assert!(frame.spawned);
    }

    let ids: Vec<u64> = simulation.view().iter().map(|particle| particle.id.get()).collect();
    assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    let report = simulation.report();
    assert_eq!(report.spawned, 21);
    assert_eq!(report.evicted, 1);
    assert_eq!(report.final_population, 20);
}

#[test]
fn blocking_store_stops_spawning_at_capacity() {
    let mut config = SimulationConfig::default();
    config.admission.mode = AdmissionMode::Blocking;
    config.admission.original_capacity = 3;
    config.admission.capacity_floor = 1;
    let mut simulation = Simulation::new(&config, 5).expect("config is valid");

    for index in 0..10 {
        let _ = simulation.step(Timestamp::from_millis(index * 600));
    }

    let report = simulation.report();
    assert_eq!(report.spawned, 3);
    assert_eq!(report.refused, 0);
    assert_eq!(report.evicted, 0);
    assert_eq!(simulation.store().len(), 3);
}

#[test]
fn capacity_tracks_load_without_overflowing_the_store() {
    let config = small_world();
    let mut simulation = Simulation::new(&config, 11).expect("config is valid");
    let clock = ManualClock::default();
    let per_particle = Duration::from_millis(2);
    let target = Duration::from_millis(33);
    let mut smallest_capacity = simulation.store().capacity();

    for _ in 0..3_000 {
        let start = clock.now();
        let _ = simulation.step(start);
        let population = u32::try_from(simulation.view().len()).unwrap_or(u32::MAX);
        clock.advance(per_particle * population);

        let cycle = clock.now().saturating_duration_since(start);
        if cycle < target {
            clock.sleep(target - cycle);
        }
        let _ = simulation.finish_frame(cycle, clock.now());

        let store = simulation.store();
        let admission = simulation.admission();
        assert!(store.len() <= store.capacity());
        assert_eq!(store.capacity(), admission.capacity());
        assert!(admission.capacity() >= admission.capacity_floor());
        assert!(admission.capacity() <= admission.original_capacity());
        smallest_capacity = smallest_capacity.min(store.capacity());
    }

    assert!(smallest_capacity < 40);
    assert!(simulation.report().capacity_changes > 0);
    assert!(simulation.report().evicted > 0);
}

#[test]
fn run_paces_cycles_and_stops_after_the_frame_limit() {
    let mut simulation =
        Simulation::new(&SimulationConfig::default(), 1).expect("default config is valid");
    let clock = ManualClock::default();
    let mut renderer = RecordingRenderer::default();

    let report = simulation.run(&clock, &mut renderer, &mut FrameLimit::new(5));

    assert_eq!(report.frames, 5);
    assert_eq!(renderer.populations, vec![1; 5]);
    assert_eq!(clock.now(), Timestamp::from_millis(5 * 33));
    assert_eq!(report.spawned, 1);
    assert_eq!(report.final_capacity, 400);
}

#[test]
fn run_completes_the_cycle_in_which_the_deadline_passes() {
    let mut simulation =
        Simulation::new(&SimulationConfig::default(), 1).expect("default config is valid");
    let clock = ManualClock::default();
    let mut renderer = RecordingRenderer::default();

    let report = simulation.run(
        &clock,
        &mut renderer,
        &mut Deadline::new(Timestamp::from_millis(100)),
    );

    assert_eq!(report.frames, 5);
    assert_eq!(clock.now(), Timestamp::from_millis(165));
}

#[test]
fn expensive_rendering_shrinks_the_store() {
    let config = small_world();
    let mut simulation = Simulation::new(&config, 2).expect("config is valid");
    let clock = ManualClock::default();
    let mut renderer = CostlyRenderer {
        clock: &clock,
        per_particle: Duration::from_millis(4),
    };

    let report = simulation.run(&clock, &mut renderer, &mut FrameLimit::new(200));

    assert!(report.capacity_changes > 0);
    assert!(report.final_capacity < 40);
    assert!(report.final_population <= report.final_capacity);
}

#[test]
fn same_seed_replays_the_same_run() {
    let config = small_world();
    let mut first = Simulation::new(&config, 99).expect("config is valid");
    let mut second = Simulation::new(&config, 99).expect("config is valid");

    for index in 0..400 {
        let now = Timestamp::from_millis(index * 16);
        assert_eq!(first.step(now), second.step(now));
    }

    assert_eq!(first.view().to_vec(), second.view().to_vec());
    assert_eq!(first.report(), second.report());
}

#[test]
fn report_serializes_with_snake_case_fields() {
    let mut simulation =
        Simulation::new(&SimulationConfig::default(), 4).expect("default config is valid");
    let _ = simulation.step(Timestamp::ZERO);

    let value = serde_json::to_value(simulation.report()).expect("report serializes");

    assert_eq!(value["frames"], 1);
    assert_eq!(value["spawned"], 1);
    assert_eq!(value["final_capacity"], 400);
    assert_eq!(value["final_population"], 1);
}
