//! Physical constants (SI) and small relativistic helpers.
//!
//! Everything here is pure and NaN-propagating: a disabled particle's NaN
//! position survives any of these operations unchanged.

use std::f64::consts::PI;

use super::states::{NVec3, Particle};

/// Speed of light in vacuum [m/s]
pub const C: f64 = 299_792_458.0;

/// Proton mass [kg]
pub const PROTON_MASS: f64 = 1.672_621_923_69e-27;

/// Elementary charge [C]
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Vacuum permeability [H/m]
pub const MU_0: f64 = 4.0 * PI * 1e-7;

/// Boltzmann constant [J/K]
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// Lorentz factor of a momentum-like vector `u` (velocity times gamma)
/// gamma(u) = sqrt(1 + u.u / c^2)
pub fn gamma(u: &NVec3) -> f64 {
    (1.0 + u.dot(u) / (C * C)).sqrt()
}

/// Non-relativistic kinetic energy of the particle in electron volts
pub fn kinetic_energy_ev(p: &Particle) -> f64 {
    0.5 * p.m * p.v.dot(&p.v) / ELEMENTARY_CHARGE
}

/// Latitude of a position in the x-z plane, atan2(z, x)
pub fn latitude(x: &NVec3) -> f64 {
    x.z.atan2(x.x)
}
