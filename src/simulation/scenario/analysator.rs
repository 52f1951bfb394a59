//! Replays externally chosen initial conditions.
//!
//! Reads `x y z vx vy vz` records until the input ends (or stops parsing)
//! and writes every live particle's state to the run log at each input interval.

use std::io::{self, BufReader};

use super::{proton, Scenario, ScenarioIo, ScenarioKind};
use crate::output::snapshot::read_sextuples;
use crate::simulation::fields::FieldSet;
use crate::simulation::states::Population;

pub struct AnalysatorScenario {
    io: ScenarioIo,
}

impl AnalysatorScenario {
    pub fn new(io: ScenarioIo) -> Self {
        Self { io }
    }
}

impl Scenario for AnalysatorScenario {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Analysator
    }

    fn initial_particles(&mut self, _fields: &FieldSet) -> Population {
        let records = match self.io.input.take() {
            Some(input) => read_sextuples(input),
            None => {
                log::info!("reading initial particle data from stdin (format: x y z vx vy vz)");
                read_sextuples(BufReader::new(io::stdin()))
            }
        };
        log::info!("read {} particles", records.len());
        records.into_iter().map(|(x, v)| proton(x, v)).collect()
    }

    fn new_timestep(&mut self, _file_counter: i64, _step: usize, time: f64, population: &mut Population, _fields: &FieldSet) {
        for (i, p) in population.iter().enumerate().filter(|(_, p)| !p.is_disabled()) {
            self.io.log_particle(i, time, p);
        }
    }
}
