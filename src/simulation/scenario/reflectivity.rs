//! Shock reflectivity experiment.
//!
//! Every input interval, clusters of particles are released just upstream
//! of a parabolic shock front whose position drifts with time. A particle
//! that ends up more than `downstream_boundary` behind the current front is
//! counted as transmitted, one more than `upstream_boundary` ahead of it as
//! reflected. Both are histogrammed as (y, injection time) and tombstoned.

use rayon::prelude::*;

use super::{Scenario, ScenarioIo, ScenarioKind};
use crate::configuration::config::DistributionConfig;
use crate::error::{TracerError, TracerResult};
use crate::simulation::distribution::{ParticleSource, VelocitySampler};
use crate::simulation::fields::FieldSet;
use crate::simulation::params::{ParticleParameters, ReflectivityParams};
use crate::simulation::physics::{ELEMENTARY_CHARGE, PROTON_MASS};
use crate::simulation::states::{NVec3, Particle, Population, Provenance};
use crate::simulation::statistics::Histogram;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    Transmitted,
    Reflected,
}

pub struct ShockReflectivityScenario {
    geometry: ReflectivityParams,
    cluster_size: usize,
    seed: u64,
    distribution: DistributionConfig,
    batches: usize,
    start_time: Option<f64>, // time of the first injection, fallback origin for foreign particles
    transmitted: Histogram,
    reflected: Histogram,
    io: ScenarioIo,
}

impl ShockReflectivityScenario {
    pub fn new(params: &ParticleParameters, io: ScenarioIo) -> TracerResult<Self> {
        let geometry = params.reflectivity.clone();
        if geometry.front.y_norm == 0.0 || geometry.front.drift_period == 0.0 {
            return Err(TracerError::ConfigError(
                "reflectivity start_y and drift_period must be non-zero".to_string(),
            ));
        }
        if geometry.front_points == 0 {
            return Err(TracerError::ConfigError("reflectivity front_points must be positive".to_string()));
        }
        Ok(Self {
            geometry,
            cluster_size: params.num_particles,
            seed: params.random_seed,
            distribution: params.distribution.clone(),
            batches: 0,
            start_time: None,
            transmitted: Histogram::new("transmitted"),
            reflected: Histogram::new("reflected"),
            io,
        })
    }

    pub fn transmitted(&self) -> &Histogram {
        &self.transmitted
    }

    pub fn reflected(&self) -> &Histogram {
        &self.reflected
    }

    /// Classify a particle against the front at `time`; tombstones it on a crossing
    fn classify(geometry: &ReflectivityParams, time: f64, p: &mut Particle) -> Option<Crossing> {
        if p.is_disabled() {
            return None;
        }
        let front = geometry.front.x_at(p.x[1], time);
        let crossing = if p.x[0] < front - geometry.downstream_boundary {
            Crossing::Transmitted
        } else if p.x[0] > front + geometry.upstream_boundary {
            Crossing::Reflected
        } else {
            return None;
        };
        p.disable();
        Some(crossing)
    }

    fn save_histogram(&self, histogram: &Histogram) {
        let data_file = format!("{}.dat", histogram.name());
        let data_path = self.io.output_dir.join(&data_file);
        let bov_path = self.io.output_dir.join(format!("{data_file}.bov"));
        if let Err(e) = histogram.save(&data_path) {
            log::error!("failed to save {}: {}", data_path.display(), e);
        }
        if let Err(e) = histogram.write_bov_ascii(&bov_path, 0, &data_file) {
            log::error!("failed to write {}: {}", bov_path.display(), e);
        }
    }
}

impl Scenario for ShockReflectivityScenario {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Reflectivity
    }

    fn new_timestep(&mut self, file_counter: i64, step: usize, time: f64, population: &mut Population, fields: &FieldSet) {
        // fresh generator per step so each batch is reproducible on its own
        let seed = self.seed.wrapping_add(step as u64);
        match VelocitySampler::new(seed, &self.distribution, PROTON_MASS, ELEMENTARY_CHARGE) {
            Ok(mut sampler) => {
                let batch = self.batches;
                for i in 0..self.geometry.front_points {
                    let y = self.geometry.injection_y(i);
                    let x = self.geometry.front.x_at(y, time);
                    let pos = NVec3::new(x, y, 0.0);
                    let bulk = fields.v.sample(&pos);
                    for _ in 0..self.cluster_size {
                        let mut p = sampler.next_particle();
                        p.v += bulk;
                        p.x = pos;
                        population.push(p.with_origin(Provenance { batch, time, x }));
                    }
                }
                self.batches += 1;
                if self.start_time.is_none() {
                    self.start_time = Some(time);
                }
                log::debug!("injected batch {} at t = {}, population {}", batch, time, population.len());
            }
            Err(e) => log::error!("skipping injection at step {}: {}", step, e),
        }

        let path = self.io.snapshot_path(file_counter - 1);
        self.io.write_snapshot(population, &path);
    }

    fn after_push(&mut self, _step: usize, time: f64, population: &mut Population, _fields: &FieldSet) {
        let geometry = &self.geometry;
        let fallback = self.start_time.unwrap_or(0.0);
        // partition in parallel, merge into the histograms in index order
        let events: Vec<(Crossing, [f64; 2])> = population
            .par_iter_mut()
            .filter_map(|p| {
                let y = p.x[1];
                let origin_time = p.origin.map_or(fallback, |o| o.time);
                Self::classify(geometry, time, p).map(|c| (c, [y, origin_time]))
            })
            .collect();

        let (transmitted, reflected): (Vec<_>, Vec<_>) =
            events.into_iter().partition(|(crossing, _)| *crossing == Crossing::Transmitted);
        self.transmitted.extend(transmitted.into_iter().map(|(_, pair)| pair));
        self.reflected.extend(reflected.into_iter().map(|(_, pair)| pair));
    }

    fn finalize(&mut self, _population: &mut Population, _fields: &FieldSet) {
        log::info!(
            "{} transmitted, {} reflected",
            self.transmitted.len(),
            self.reflected.len()
        );
        self.save_histogram(&self.transmitted);
        self.save_histogram(&self.reflected);
    }
}
