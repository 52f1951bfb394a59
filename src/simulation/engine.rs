//! Run driver for particle tracing
//!
//! `Engine` holds the stepping settings, `Tracer` owns the fields, the
//! scenario and the population and runs the per-step sequence
//! `new_timestep` (at input cadence) -> push -> `after_push`, then `finalize`.

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::PathBuf;

use crate::configuration::config::{EngineConfig, TracerConfig};
use crate::error::{TracerError, TracerResult};
use crate::output::pattern::FilenamePattern;
use crate::simulation::fields::FieldSet;
use crate::simulation::integrator::push_population;
use crate::simulation::params::ParticleParameters;
use crate::simulation::scenario::{build_scenario, Scenario, ScenarioIo, ScenarioKind};
use crate::simulation::states::Population;

#[derive(Debug, Clone)]
pub struct Engine {
    pub scenario: ScenarioKind, // which experiment runs
    pub dt: f64, // push timestep
    pub start_time: f64, // time of step 0
    pub end_time: f64, // run stops here
    pub input_dt: f64, // new_timestep cadence
}

impl Engine {
    /// Validate stepping settings; an unknown scenario name fails here
    pub fn from_config(cfg: &EngineConfig) -> TracerResult<Self> {
        let scenario: ScenarioKind = cfg.scenario.parse()?;
        let input_dt = cfg.input_dt.unwrap_or(cfg.dt);
        if !(cfg.dt > 0.0) || !(input_dt > 0.0) {
            return Err(TracerError::ConfigError(format!(
                "dt and input_dt must be positive, got dt={} input_dt={}",
                cfg.dt, input_dt
            )));
        }
        if !(cfg.end_time >= cfg.start_time) {
            return Err(TracerError::ConfigError(format!(
                "end_time {} precedes start_time {}",
                cfg.end_time, cfg.start_time
            )));
        }
        Ok(Self {
            scenario,
            dt: cfg.dt,
            start_time: cfg.start_time,
            end_time: cfg.end_time,
            input_dt,
        })
    }

    /// Number of pushes covering [start_time, end_time]
    pub fn total_steps(&self) -> usize {
        ((self.end_time - self.start_time) / self.dt).round() as usize
    }

    /// Pushes between consecutive new_timestep calls
    pub fn steps_per_input(&self) -> usize {
        ((self.input_dt / self.dt).round() as usize).max(1)
    }

    pub fn time_of(&self, step: usize) -> f64 {
        self.start_time + step as f64 * self.dt
    }
}

/// One tracing run: engine settings, fields, scenario and live population
pub struct Tracer {
    pub engine: Engine,
    pub fields: FieldSet,
    pub population: Population,
    scenario: Box<dyn Scenario>,
    step: usize,
    file_counter: i64,
}

impl Tracer {
    /// Set up the run and let the scenario build its starting population
    pub fn new(engine: Engine, fields: FieldSet, mut scenario: Box<dyn Scenario>) -> Self {
        let population = scenario.initial_particles(&fields);
        log::info!("{} scenario starts with {} particles", scenario.kind(), population.len());
        Self {
            engine,
            fields,
            population,
            scenario,
            step: 0,
            file_counter: 0,
        }
    }

    /// Build the complete run from configuration, writing run/event logs to `log`
    pub fn from_config(cfg: &TracerConfig, log: Box<dyn Write + Send>) -> TracerResult<Self> {
        let engine = Engine::from_config(&cfg.engine)?;
        let params = ParticleParameters::from(&cfg.parameters);
        let fields = FieldSet::from_config(&cfg.fields.e, &cfg.fields.b, &cfg.fields.v);

        let output_dir = cfg.engine.output_dir.as_deref().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&output_dir)?;
        let pattern = FilenamePattern::parse(&cfg.engine.output_filename_pattern)?;

        let mut io = ScenarioIo::new(output_dir, pattern, log);
        if let Some(input) = &cfg.engine.input_file {
            io = io.with_input(Box::new(BufReader::new(File::open(input)?)));
        }

        let scenario = build_scenario(engine.scenario, &params, io)?;
        Ok(Self::new(engine, fields, scenario))
    }

    /// Advance the run by one timestep
    pub fn step(&mut self) {
        let step = self.step;
        let time = self.engine.time_of(step);

        if step % self.engine.steps_per_input() == 0 {
            self.file_counter += 1;
            self.scenario
                .new_timestep(self.file_counter, step, time, &mut self.population, &self.fields);
        }

        push_population(&mut self.population, &self.fields, self.engine.dt);
        self.scenario.after_push(step, time, &mut self.population, &self.fields);
        self.step += 1;
    }

    /// Run to `end_time`, finalize, and hand back the final population
    pub fn run(mut self) -> Population {
        let total = self.engine.total_steps();
        while self.step < total {
            self.step();
            if self.step % 1000 == 0 {
                log::debug!("step {}/{}, {} particles", self.step, total, self.population.len());
            }
        }
        self.scenario.finalize(&mut self.population, &self.fields);
        let active = self.population.iter().filter(|p| !p.is_disabled()).count();
        log::info!("run finished after {} steps, {} of {} particles active", total, active, self.population.len());
        self.population
    }
}
