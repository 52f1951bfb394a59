//! One proton started at a configured point with the local bulk velocity.
//! Its trajectory is written to the run log every step.

use super::{proton, Scenario, ScenarioIo, ScenarioKind};
use crate::simulation::fields::FieldSet;
use crate::simulation::params::ParticleParameters;
use crate::simulation::states::{NVec3, Population};

pub struct SingleParticleScenario {
    start: NVec3,
    io: ScenarioIo,
}

impl SingleParticleScenario {
    pub fn new(params: &ParticleParameters, io: ScenarioIo) -> Self {
        Self { start: params.init_position, io }
    }
}

impl Scenario for SingleParticleScenario {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Single
    }

    fn initial_particles(&mut self, fields: &FieldSet) -> Population {
        let bulk = fields.v.sample(&self.start);
        vec![proton(self.start, bulk)]
    }

    fn after_push(&mut self, _step: usize, time: f64, population: &mut Population, _fields: &FieldSet) {
        if let Some(p) = population.first() {
            self.io.log_particle(0, time, p);
        }
    }
}
