//! Particles injected along a line on the night side, traced until they
//! either reach the inner boundary (precipitate) or drift back out past
//! the outer boundary (lost).
//!
//! Every input interval a batch of `num_particles` protons is placed along
//! `start_x..stop_x`, each at the |B| minimum of a transverse z scan, moving
//! with the local bulk flow. Absorbed particles are tombstoned and written
//! to the event log as `index batch start_x latitude energy_eV`, or
//! `index batch start_x -5 -1` when lost.

use rayon::prelude::*;

use super::{proton, Scenario, ScenarioIo, ScenarioKind};
use crate::error::{TracerError, TracerResult};
use crate::simulation::fields::FieldSet;
use crate::simulation::params::{ParticleParameters, PrecipitationParams};
use crate::simulation::physics::{kinetic_energy_ev, latitude};
use crate::simulation::states::{NVec3, Particle, Population, Provenance};

/// Why a particle left the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Absorption {
    Precipitated { latitude: f64, energy_ev: f64 },
    Lost,
}

pub struct PrecipitationScenario {
    geometry: PrecipitationParams,
    batch_size: usize,
    batches: usize, // injection batches emitted so far
    io: ScenarioIo,
}

impl PrecipitationScenario {
    pub fn new(params: &ParticleParameters, io: ScenarioIo) -> TracerResult<Self> {
        let geometry = params.precipitation.clone();
        if !(geometry.scan_step > 0.0) {
            return Err(TracerError::ConfigError(format!(
                "precipitation scan_step must be positive, got {}",
                geometry.scan_step
            )));
        }
        Ok(Self {
            geometry,
            batch_size: params.num_particles,
            batches: 0,
            io,
        })
    }

    /// Point of the transverse scan at `x` with the weakest magnetic field
    fn weakest_field_point(&self, x: f64, fields: &FieldSet) -> NVec3 {
        let mut best = NVec3::new(x, 0.0, 0.0);
        let mut min_b = f64::INFINITY;
        for z in self.geometry.scan_points() {
            let candidate = NVec3::new(x, 0.0, z);
            let b = fields.b.sample(&candidate).norm();
            if b < min_b {
                best = candidate;
                min_b = b;
            }
        }
        best
    }

    /// Boundary test for one particle; tombstones it when absorbed
    fn absorb(geometry: &PrecipitationParams, p: &mut Particle) -> Option<Absorption> {
        if p.is_disabled() {
            return None;
        }
        let event = if p.x.norm() <= geometry.inner_boundary {
            Absorption::Precipitated {
                latitude: latitude(&p.x),
                energy_ev: kinetic_energy_ev(p),
            }
        } else if p.x[0] <= geometry.outer_boundary {
            Absorption::Lost
        } else {
            return None;
        };
        p.disable();
        Some(event)
    }
}

impl Scenario for PrecipitationScenario {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Precipitation
    }

    fn new_timestep(&mut self, file_counter: i64, _step: usize, time: f64, population: &mut Population, fields: &FieldSet) {
        let batch = self.batches;
        for i in 0..self.batch_size {
            let start_x = self.geometry.injection_x(i, self.batch_size);
            let pos = self.weakest_field_point(start_x, fields);
            let bulk = fields.v.sample(&pos);
            population.push(proton(pos, bulk).with_origin(Provenance { batch, time, x: start_x }));
        }
        self.batches += 1;
        log::debug!("injected batch {} ({} particles), population {}", batch, self.batch_size, population.len());

        let path = self.io.snapshot_path(file_counter - 1);
        self.io.write_snapshot(population, &path);
    }

    fn after_push(&mut self, _step: usize, _time: f64, population: &mut Population, _fields: &FieldSet) {
        let geometry = &self.geometry;
        // test in parallel, report in index order
        let events: Vec<(usize, Option<Provenance>, Absorption)> = population
            .par_iter_mut()
            .enumerate()
            .filter_map(|(i, p)| Self::absorb(geometry, p).map(|event| (i, p.origin, event)))
            .collect();

        for (i, origin, event) in events {
            let (batch, start_x) = origin.map_or((0, f64::NAN), |o| (o.batch, o.x));
            match event {
                Absorption::Precipitated { latitude, energy_ev } => self.io.log_line(format_args!(
                    "{} {} {:.6} {:.6} {:.6}",
                    i, batch, start_x, latitude, energy_ev
                )),
                Absorption::Lost => self.io.log_line(format_args!("{} {} {:.6} -5 -1", i, batch, start_x)),
            }
        }
    }
}
