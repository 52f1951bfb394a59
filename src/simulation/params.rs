//! Runtime particle and scenario parameters
//!
//! `ParticleParameters` holds the settings scenarios read while running:
//! - particle counts and the base random seed,
//! - the velocity distribution for sampled particles,
//! - the initial point for single / distribution runs,
//! - precipitation and shock-reflectivity geometry

use crate::configuration::config::{DistributionConfig, ParametersConfig, PrecipitationConfig, ReflectivityConfig};
use crate::simulation::states::NVec3;

#[derive(Debug, Clone)]
pub struct ParticleParameters {
    pub num_particles: usize, // particles per point / per injection batch
    pub random_seed: u64, // base seed
    pub distribution: DistributionConfig, // velocity distribution
    pub init_position: NVec3, // initial point
    pub precipitation: PrecipitationParams,
    pub reflectivity: ReflectivityParams,
}

/// Injection line and absorbing boundaries of the precipitation scenario
#[derive(Debug, Clone)]
pub struct PrecipitationParams {
    pub inner_boundary: f64, // radius below which particles precipitate
    pub start_x: f64, // injection line start
    pub stop_x: f64, // injection line end (exclusive)
    pub outer_boundary: f64, // lost once x <= this
    pub scan_min: f64, // transverse z scan range and step
    pub scan_max: f64,
    pub scan_step: f64,
}

impl PrecipitationParams {
    /// x of the `i`-th of `n` injection points
    pub fn injection_x(&self, i: usize, n: usize) -> f64 {
        self.start_x + (i as f64) / (n as f64) * (self.stop_x - self.start_x)
    }

    /// z positions of the transverse scan, `scan_min` inclusive to `scan_max` exclusive
    pub fn scan_points(&self) -> impl Iterator<Item = f64> + '_ {
        let n = ((self.scan_max - self.scan_min) / self.scan_step).ceil().max(0.0) as usize;
        (0..n)
            .map(move |k| self.scan_min + k as f64 * self.scan_step)
            .filter(move |z| *z < self.scan_max)
    }
}

/// Parabolic shock front drifting linearly in time
/// x(y, t) = -(y / y_norm)^2 (y_scale - d) + x_offset + d,  d = drift (t - t_ref) / period
#[derive(Debug, Clone, Copy)]
pub struct ShockFront {
    pub y_norm: f64,
    pub y_scale: f64,
    pub x_offset: f64,
    pub drift: f64,
    pub reference_time: f64,
    pub drift_period: f64,
}

impl ShockFront {
    pub fn x_at(&self, y: f64, time: f64) -> f64 {
        let s = y / self.y_norm;
        let d = self.drift * (time - self.reference_time) / self.drift_period;
        -(s * s) * (self.y_scale - d) + self.x_offset + d
    }
}

/// Injection range and margins of the shock reflectivity scenario
#[derive(Debug, Clone)]
pub struct ReflectivityParams {
    pub front: ShockFront,
    pub start_y: f64,
    pub stop_y: f64,
    pub upstream_boundary: f64, // reflected beyond front + this
    pub downstream_boundary: f64, // transmitted beyond front - this
    pub front_points: usize, // injection points per batch
}

impl ReflectivityParams {
    /// y of the `i`-th injection point along the front
    pub fn injection_y(&self, i: usize) -> f64 {
        self.start_y + (i as f64) / (self.front_points as f64) * (self.stop_y - self.start_y)
    }
}

impl From<&PrecipitationConfig> for PrecipitationParams {
    fn from(c: &PrecipitationConfig) -> Self {
        Self {
            inner_boundary: c.inner_boundary,
            start_x: c.start_x,
            stop_x: c.stop_x,
            outer_boundary: c.outer_boundary.unwrap_or(c.start_x),
            scan_min: c.scan_min,
            scan_max: c.scan_max,
            scan_step: c.scan_step,
        }
    }
}

impl From<&ReflectivityConfig> for ReflectivityParams {
    fn from(c: &ReflectivityConfig) -> Self {
        Self {
            front: ShockFront {
                y_norm: c.start_y,
                y_scale: c.y_scale,
                x_offset: c.x_offset,
                drift: c.drift,
                reference_time: c.reference_time,
                drift_period: c.drift_period,
            },
            start_y: c.start_y,
            stop_y: c.stop_y,
            upstream_boundary: c.upstream_boundary,
            downstream_boundary: c.downstream_boundary,
            front_points: c.front_points,
        }
    }
}

impl From<&ParametersConfig> for ParticleParameters {
    fn from(c: &ParametersConfig) -> Self {
        Self {
            num_particles: c.num_particles,
            random_seed: c.random_seed,
            distribution: c.distribution.clone(),
            init_position: NVec3::new(c.init[0], c.init[1], c.init[2]),
            precipitation: (&c.precipitation).into(),
            reflectivity: (&c.reflectivity).into(),
        }
    }
}
