#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Circlefall simulation headless.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use circlefall_core::{AdmissionMode, Clock, ResolverMode, SimulationConfig, Timestamp};
use circlefall_simulation::{
    Deadline, FrameLimit, QuitSignal, Renderer, RunReport, Simulation, SystemClock,
};
use circlefall_world::query::ParticleView;

const DEFAULT_DURATION_SECS: u64 = 10;

/// Command-line arguments accepted by the simulation binary.
#[derive(Debug, Parser)]
#[command(name = "circlefall", about = "Runs the falling-circles simulation headless")]
struct CliArgs {
    /// TOML file overriding the default configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for the spawn generator.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Wall-clock run length in seconds.
    #[arg(long, value_name = "SECONDS", conflicts_with = "frames")]
    duration_secs: Option<u64>,
    /// Number of cycles to run instead of a wall-clock duration.
    #[arg(long, value_name = "COUNT")]
    frames: Option<u64>,
    /// Overrides the admission mode of the store.
    #[arg(long, value_enum)]
    admission: Option<AdmissionArg>,
    /// Overrides the collision response.
    #[arg(long, value_enum)]
    resolver: Option<ResolverArg>,
    /// Simulated presentation cost per particle, in microseconds.
    #[arg(long, value_name = "MICROS", default_value_t = 0)]
    render_cost_us: u64,
    /// Format of the final report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AdmissionArg {
    Blocking,
    LiveTrim,
}

impl From<AdmissionArg> for AdmissionMode {
    fn from(value: AdmissionArg) -> Self {
        match value {
            AdmissionArg::Blocking => AdmissionMode::Blocking,
            AdmissionArg::LiveTrim => AdmissionMode::LiveTrim,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ResolverArg {
    Impulse,
    SeparationOnly,
}

impl From<ResolverArg> for ResolverMode {
    fn from(value: ResolverArg) -> Self {
        match value {
            ResolverArg::Impulse => ResolverMode::Impulse,
            ResolverArg::SeparationOnly => ResolverMode::SeparationOnly,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Entry point for the Circlefall command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing();

    let config = resolve_config(&args)?;
    let mut simulation =
        Simulation::new(&config, args.seed).context("invalid simulation configuration")?;

    let clock = SystemClock::new();
    let mut stop = StopCondition::from_args(&args, clock.now());
    let mut renderer = CostRenderer::new(Duration::from_micros(args.render_cost_us));

    tracing::info!(
        seed = args.seed,
        capacity = config.admission.original_capacity,
        mode = ?config.admission.mode,
        resolver = ?config.physics.resolver,
        "simulation started"
    );
    let report = simulation.run(&clock, &mut renderer, &mut stop);
    tracing::info!(
        frames = report.frames,
        peak_population = renderer.peak_population,
        "simulation finished"
    );

    println!("{}", format_report(&report, args.report)?);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(args: &CliArgs) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(admission) = args.admission {
        config.admission.mode = admission.into();
    }
    if let Some(resolver) = args.resolver {
        config.physics.resolver = resolver.into();
    }
    Ok(config)
}

fn load_config(path: &Path) -> Result<SimulationConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_config(contents: &str) -> Result<SimulationConfig> {
    let config: SimulationConfig = toml::from_str(contents)?;
    Ok(config)
}

fn format_report(report: &RunReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => {
            serde_json::to_string_pretty(report).context("failed to encode run report")
        }
        ReportFormat::Text => Ok(format!(
            "frames            {}\n\
             spawned           {}\n\
             refused           {}\n\
             evicted           {}\n\
             physics ticks     {}\n\
             contacts          {}\n\
             capacity changes  {}\n\
             final capacity    {}\n\
             final population  {}",
            report.frames,
            report.spawned,
            report.refused,
            report.evicted,
            report.physics_ticks,
            report.contacts,
            report.capacity_changes,
            report.final_capacity,
            report.final_population,
        )),
    }
}

/// How long the headless run lasts.
#[derive(Debug)]
enum StopCondition {
    Frames(FrameLimit),
    Deadline(Deadline),
}

impl StopCondition {
    fn from_args(args: &CliArgs, start: Timestamp) -> Self {
        match (args.frames, args.duration_secs) {
            (Some(frames), _) => Self::Frames(FrameLimit::new(frames)),
            (None, duration) => {
                let secs = duration.unwrap_or(DEFAULT_DURATION_SECS);
                Self::Deadline(Deadline::new(
                    start.saturating_add(Duration::from_secs(secs)),
                ))
            }
        }
    }
}

impl QuitSignal for StopCondition {
    fn quit_requested(&mut self, now: Timestamp) -> bool {
        match self {
            Self::Frames(limit) => limit.quit_requested(now),
            Self::Deadline(deadline) => deadline.quit_requested(now),
        }
    }
}

/// Stand-in presenter that blocks for a fixed cost per particle.
#[derive(Debug)]
struct CostRenderer {
    cost_per_particle: Duration,
    peak_population: usize,
}

impl CostRenderer {
    fn new(cost_per_particle: Duration) -> Self {
        Self {
            cost_per_particle,
            peak_population: 0,
        }
    }
}

impl Renderer for CostRenderer {
    fn present(&mut self, view: ParticleView<'_>) {
        self.peak_population = self.peak_population.max(view.len());
        if self.cost_per_particle.is_zero() {
            return;
        }
        let particles = u32::try_from(view.len()).unwrap_or(u32::MAX);
        std::thread::sleep(self.cost_per_particle.saturating_mul(particles));
    }
}
