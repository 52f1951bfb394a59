//! A cluster of particles released from one point, velocities drawn from
//! the configured distribution and shifted by the local bulk flow. The
//! population is snapshotted at every input interval and once at the end.

use super::{Scenario, ScenarioIo, ScenarioKind};
use crate::configuration::config::DistributionConfig;
use crate::simulation::distribution::{ParticleSource, VelocitySampler};
use crate::simulation::fields::FieldSet;
use crate::simulation::params::ParticleParameters;
use crate::simulation::physics::{ELEMENTARY_CHARGE, PROTON_MASS};
use crate::simulation::states::{NVec3, Population};

pub const FINAL_SNAPSHOT: &str = "particles_final.psnap";

pub struct DistributionScenario {
    start: NVec3,
    count: usize,
    seed: u64,
    distribution: DistributionConfig,
    io: ScenarioIo,
}

impl DistributionScenario {
    pub fn new(params: &ParticleParameters, io: ScenarioIo) -> Self {
        Self {
            start: params.init_position,
            count: params.num_particles,
            seed: params.random_seed,
            distribution: params.distribution.clone(),
            io,
        }
    }
}

impl Scenario for DistributionScenario {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Distribution
    }

    fn initial_particles(&mut self, fields: &FieldSet) -> Population {
        let mut sampler = match VelocitySampler::new(self.seed, &self.distribution, PROTON_MASS, ELEMENTARY_CHARGE) {
            Ok(s) => s,
            Err(e) => {
                log::error!("cannot sample initial particles: {}", e);
                return Vec::new();
            }
        };

        let bulk = fields.v.sample(&self.start);
        (0..self.count)
            .map(|_| {
                let mut p = sampler.next_particle();
                p.v += bulk;
                p.x = self.start;
                p
            })
            .collect()
    }

    fn new_timestep(&mut self, file_counter: i64, _step: usize, _time: f64, population: &mut Population, _fields: &FieldSet) {
        let path = self.io.snapshot_path(file_counter - 1);
        self.io.write_snapshot(population, &path);
    }

    fn finalize(&mut self, population: &mut Population, _fields: &FieldSet) {
        let path = self.io.output_dir.join(FINAL_SNAPSHOT);
        self.io.write_snapshot(population, &path);
    }
}
