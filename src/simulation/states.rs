//! Core state types for the particle tracer.
//!
//! Defines the test particle, its injection provenance and the population
//! container. A particle is either active (finite position) or disabled:
//! position `(NaN, 0, 0)`, velocity zero. Disabled is terminal.

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

/// Ordered, append-only collection of particles for one run
pub type Population = Vec<Particle>;

/// Where and when an injected particle entered the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Provenance {
    pub batch: usize, // index of the injection batch (one per new_timestep call)
    pub time: f64, // simulation time of injection
    pub x: f64, // x coordinate of the injection point
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub m: f64, // mass
    pub q: f64, // charge
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub origin: Option<Provenance>, // set for particles created by an injection batch
}

impl Particle {
    pub fn new(m: f64, q: f64, x: NVec3, v: NVec3) -> Self {
        Self { m, q, x, v, origin: None }
    }

    /// Attach injection provenance
    pub fn with_origin(mut self, origin: Provenance) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Tombstone the particle: position (NaN, 0, 0), velocity zero
    pub fn disable(&mut self) {
        self.x = NVec3::new(f64::NAN, 0.0, 0.0);
        self.v = NVec3::zeros();
    }

    /// True once the particle has been tombstoned
    pub fn is_disabled(&self) -> bool {
        self.x.norm().is_nan()
    }
}
