//! Configuration types for loading tracer runs from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! particle tracing run. A run consists of:
//!
//! - [`EngineConfig`]     – scenario name, timestep, run window and output files
//! - [`ParametersConfig`] – particle counts, seed, velocity distribution and
//!   scenario-specific geometry
//! - [`FieldsConfig`]     – the E, B and bulk-velocity field providers
//! - [`TracerConfig`]     – top-level wrapper used to load a run from YAML
//!
//! # YAML format
//! An example precipitation run matching these types:
//!
//! ```yaml
//! engine:
//!   scenario: "precipitation"   # single | distribution | precipitation | analysator | reflectivity
//!   dt: 0.01                    # push timestep [s]
//!   start_time: 0.0
//!   end_time: 20.0
//!   input_dt: 1.0               # new_timestep cadence [s]
//!   output_filename_pattern: "particles.%07i.psnap"
//!
//! parameters:
//!   num_particles: 64
//!   random_seed: 42
//!   distribution:
//!     family: maxwell_boltzmann
//!     temperature: 1.0e6        # [K]
//!   init: [ -1.0e8, 0.0, 0.0 ]
//!   precipitation:
//!     inner_boundary: 1.0e7
//!     start_x: -2.0e8
//!     stop_x: -1.0e8
//!
//! fields:
//!   e: { type: zero }
//!   b: { type: dipole, moment: [ 0.0, 0.0, -8.0e22 ], core_radius: 6.4e6 }
//!   v: { type: uniform, value: [ 0.0, 0.0, 0.0 ] }
//! ```
//!
//! The engine then maps this configuration into its runtime representation
//! (`Engine`, `ParticleParameters`, `FieldSet`).

use serde::Deserialize;

/// Field provider selection
/// `type: zero`, `type: uniform` or `type: dipole`
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldConfig {
    Zero, // identically zero
    Uniform { value: [f64; 3] }, // same vector everywhere
    Dipole {
        moment: [f64; 3], // dipole moment [A m^2], centred at the origin
        #[serde(default)]
        core_radius: f64, // field is zero inside this radius
    },
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig::Zero
    }
}

/// Velocity distribution family and its parameters
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum DistributionConfig {
    MaxwellBoltzmann { temperature: f64 }, // temperature [K]
    Monoenergetic { energy_ev: f64 }, // kinetic energy [eV], isotropic directions
    Kappa { kappa: f64, temperature: f64 }, // kappa > 3/2, temperature [K]
}

impl Default for DistributionConfig {
    fn default() -> Self {
        DistributionConfig::MaxwellBoltzmann { temperature: 1.0e6 }
    }
}

/// Engine-level configuration
/// Controls which scenario runs and how the run is stepped
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub scenario: String, // scenario identifier, resolved at startup
    pub dt: f64, // push timestep
    #[serde(default)]
    pub start_time: f64, // simulation time of the first step
    pub end_time: f64, // run stops once this time is reached
    pub input_dt: Option<f64>, // cadence of new_timestep calls, defaults to dt
    #[serde(default = "default_output_pattern")]
    pub output_filename_pattern: String, // snapshot names, one printf integer placeholder
    pub output_dir: Option<String>, // where snapshots and histograms land, defaults to cwd
    pub input_file: Option<String>, // analysator input, defaults to stdin
}

fn default_output_pattern() -> String {
    "particles.%07i.psnap".to_string()
}

/// Precipitation scenario geometry
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PrecipitationConfig {
    pub inner_boundary: f64, // particles closer than this to the origin precipitate
    pub start_x: f64, // first injection x
    pub stop_x: f64, // injection line end (exclusive)
    pub outer_boundary: Option<f64>, // lost once x <= this, defaults to start_x
    pub scan_min: f64, // transverse z scan for the |B| minimum
    pub scan_max: f64,
    pub scan_step: f64,
}

impl Default for PrecipitationConfig {
    fn default() -> Self {
        Self {
            inner_boundary: 1.0e7,
            start_x: -2.0e8,
            stop_x: -1.0e8,
            outer_boundary: None,
            scan_min: -1.0e7,
            scan_max: 1.0e7,
            scan_step: 1.0e5,
        }
    }
}

/// Shock reflectivity scenario geometry
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ReflectivityConfig {
    pub start_y: f64, // first injection y, also normalises the front parabola
    pub stop_y: f64, // injection y range end (exclusive)
    pub y_scale: f64, // front curvature scale at the reference time
    pub x_offset: f64, // front nose x at the reference time
    pub upstream_boundary: f64, // reflected once x > front + this
    pub downstream_boundary: f64, // transmitted once x < front - this
    pub front_points: usize, // injection points along the front per batch
    pub drift: f64, // front displacement over one drift period
    pub reference_time: f64, // time at which the front sits at x_offset
    pub drift_period: f64,
}

impl Default for ReflectivityConfig {
    fn default() -> Self {
        Self {
            start_y: -1.0e8,
            stop_y: 1.0e8,
            y_scale: 5.0e7,
            x_offset: 8.0e7,
            upstream_boundary: 2.0e7,
            downstream_boundary: 2.0e7,
            front_points: 200,
            drift: 1.0e7,
            reference_time: 250.0,
            drift_period: 435.0,
        }
    }
}

/// Particle and scenario parameters
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    #[serde(default = "default_num_particles")]
    pub num_particles: usize, // particles per point and per injection batch
    #[serde(default)]
    pub random_seed: u64, // base seed, makes runs reproducible
    #[serde(default)]
    pub distribution: DistributionConfig, // velocity distribution for sampled particles
    #[serde(default)]
    pub init: [f64; 3], // initial point for single / distribution scenarios
    #[serde(default)]
    pub precipitation: PrecipitationConfig,
    #[serde(default)]
    pub reflectivity: ReflectivityConfig,
}

fn default_num_particles() -> usize {
    1
}

/// E, B and bulk-velocity field providers
#[derive(Deserialize, Debug, Clone, Default)]
pub struct FieldsConfig {
    #[serde(default)]
    pub e: FieldConfig,
    #[serde(default)]
    pub b: FieldConfig,
    #[serde(default)]
    pub v: FieldConfig,
}

/// Top-level run configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct TracerConfig {
    pub engine: EngineConfig, // scenario, stepping and output files
    pub parameters: ParametersConfig, // particle and scenario parameters
    #[serde(default)]
    pub fields: FieldsConfig, // field providers
}
