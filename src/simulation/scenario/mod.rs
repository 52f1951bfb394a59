//! Experiment scenarios driving particle injection, absorption and output
//!
//! A scenario is picked by name at startup and owns everything that lives
//! for one run: its output sinks, histograms and injection counters. The run
//! driver calls four hooks, each a no-op unless the scenario overrides it:
//! - `initial_particles` once before the first push
//! - `new_timestep` at the input cadence, before pushing
//! - `after_push` every step, after all particles were advanced
//! - `finalize` once at the end of the run

use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{TracerError, TracerResult};
use crate::output::pattern::FilenamePattern;
use crate::output::snapshot::write_particles;
use crate::simulation::distribution::VelocitySampler;
use crate::simulation::fields::FieldSet;
use crate::simulation::params::ParticleParameters;
use crate::simulation::physics::{ELEMENTARY_CHARGE, PROTON_MASS};
use crate::simulation::states::{NVec3, Particle, Population};

pub mod analysator;
pub mod distribution;
pub mod precipitation;
pub mod reflectivity;
pub mod single;

pub use analysator::AnalysatorScenario;
pub use distribution::DistributionScenario;
pub use precipitation::PrecipitationScenario;
pub use reflectivity::ShockReflectivityScenario;
pub use single::SingleParticleScenario;

/// Experiment control hooks
pub trait Scenario: Send {
    fn kind(&self) -> ScenarioKind;

    /// Build the starting population
    fn initial_particles(&mut self, _fields: &FieldSet) -> Population {
        Vec::new()
    }

    /// Inject and/or persist at the start of an input interval
    /// `file_counter` counts input intervals starting from 1
    fn new_timestep(&mut self, _file_counter: i64, _step: usize, _time: f64, _population: &mut Population, _fields: &FieldSet) {}

    /// Boundary policy and statistics after all particles were pushed
    fn after_push(&mut self, _step: usize, _time: f64, _population: &mut Population, _fields: &FieldSet) {}

    /// Emit final artifacts
    fn finalize(&mut self, _population: &mut Population, _fields: &FieldSet) {}
}

/// Scenario identifiers accepted in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    Single,
    Distribution,
    Precipitation,
    Analysator,
    Reflectivity,
}

impl FromStr for ScenarioKind {
    type Err = TracerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(ScenarioKind::Single),
            "distribution" => Ok(ScenarioKind::Distribution),
            "precipitation" => Ok(ScenarioKind::Precipitation),
            "analysator" => Ok(ScenarioKind::Analysator),
            "reflectivity" | "shock_reflectivity" => Ok(ScenarioKind::Reflectivity),
            other => Err(TracerError::UnknownScenario(other.to_string())),
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioKind::Single => "single",
            ScenarioKind::Distribution => "distribution",
            ScenarioKind::Precipitation => "precipitation",
            ScenarioKind::Analysator => "analysator",
            ScenarioKind::Reflectivity => "reflectivity",
        };
        f.write_str(name)
    }
}

/// Where a scenario writes its artifacts and reads its input
pub struct ScenarioIo {
    pub output_dir: PathBuf, // snapshots and histograms
    pub snapshot_pattern: FilenamePattern, // counter-indexed snapshot names
    pub log: Box<dyn Write + Send>, // run log / event log
    pub input: Option<Box<dyn BufRead + Send>>, // analysator records, stdin if absent
}

impl ScenarioIo {
    pub fn new(output_dir: impl Into<PathBuf>, snapshot_pattern: FilenamePattern, log: Box<dyn Write + Send>) -> Self {
        Self {
            output_dir: output_dir.into(),
            snapshot_pattern,
            log,
            input: None,
        }
    }

    pub fn with_input(mut self, input: Box<dyn BufRead + Send>) -> Self {
        self.input = Some(input);
        self
    }

    /// Path of the snapshot for `counter`
    pub fn snapshot_path(&self, counter: i64) -> PathBuf {
        self.output_dir.join(self.snapshot_pattern.format(counter))
    }

    /// Write a snapshot, logging instead of failing
    pub fn write_snapshot(&self, population: &[Particle], path: &Path) {
        if let Err(e) = write_particles(population, path) {
            log::error!("failed to write snapshot {}: {}", path.display(), e);
        }
    }

    /// Append one run-log line `index time\tx0 x1 x2\tv0 v1 v2`
    pub fn log_particle(&mut self, index: usize, time: f64, p: &Particle) {
        let (x, v) = (&p.x, &p.v);
        if let Err(e) = writeln!(
            self.log,
            "{} {}\t{} {} {}\t{} {} {}",
            index, time, x[0], x[1], x[2], v[0], v[1], v[2]
        ) {
            log::error!("failed to write run log: {}", e);
        }
    }

    /// Append a free-form line to the run/event log
    pub fn log_line(&mut self, line: fmt::Arguments<'_>) {
        if let Err(e) = self.log.write_fmt(line).and_then(|_| self.log.write_all(b"\n")) {
            log::error!("failed to write event log: {}", e);
        }
    }
}

/// A proton at `x` moving with `v`
pub fn proton(x: NVec3, v: NVec3) -> Particle {
    Particle::new(PROTON_MASS, ELEMENTARY_CHARGE, x, v)
}

/// Build the scenario named by `kind`
/// Parameter problems surface here, before the run starts
pub fn build_scenario(kind: ScenarioKind, params: &ParticleParameters, io: ScenarioIo) -> TracerResult<Box<dyn Scenario>> {
    let needs_distribution = matches!(kind, ScenarioKind::Distribution | ScenarioKind::Reflectivity);
    if needs_distribution {
        // fail fast on bad distribution parameters
        VelocitySampler::new(params.random_seed, &params.distribution, PROTON_MASS, ELEMENTARY_CHARGE)?;
    }
    if matches!(kind, ScenarioKind::Distribution | ScenarioKind::Precipitation | ScenarioKind::Reflectivity)
        && params.num_particles == 0
    {
        return Err(TracerError::ConfigError(format!("scenario {kind} needs num_particles > 0")));
    }

    let scenario: Box<dyn Scenario> = match kind {
        ScenarioKind::Single => Box::new(SingleParticleScenario::new(params, io)),
        ScenarioKind::Distribution => Box::new(DistributionScenario::new(params, io)),
        ScenarioKind::Precipitation => Box::new(PrecipitationScenario::new(params, io)?),
        ScenarioKind::Analysator => Box::new(AnalysatorScenario::new(io)),
        ScenarioKind::Reflectivity => Box::new(ShockReflectivityScenario::new(params, io)?),
    };
    log::info!("scenario {} ready", kind);
    Ok(scenario)
}

/// Look a scenario up by its configured name
pub fn create_scenario(name: &str, params: &ParticleParameters, io: ScenarioIo) -> TracerResult<Box<dyn Scenario>> {
    build_scenario(name.parse()?, params, io)
}
