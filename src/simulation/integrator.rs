//! Relativistic Boris pusher
//!
//! Advances charged particles by one fixed timestep given local E and B.
//! Half electric kick, magnetic rotation, half electric kick, drift.
//! The rotation is implicit in B but solved explicitly, which keeps |v|
//! exactly constant when E = 0.

use rayon::prelude::*;

use super::fields::FieldSet;
use super::physics::gamma;
use super::states::{NVec3, Particle};

/// Advance one particle by `dt` in local fields `b` and `e`
/// Mutates `p.x` and `p.v` in place. Disabled particles are not skipped here:
/// NaN goes in, NaN comes out
pub fn boris_push(p: &mut Particle, b: &NVec3, e: &NVec3, dt: f64) {
    // half electric kick: u- = v + q E dt / 2m
    let half_kick = (p.q * *e * dt) / (2.0 * p.m);
    let u_minus = p.v + half_kick;

    // rotation vector, scaled with gamma of the pre-rotation momentum
    let h = (p.q * *b * dt) / (2.0 * p.m * gamma(&u_minus));
    let u_prime = u_minus + u_minus.cross(&h);
    let h = (2.0 * h) / (1.0 + h.dot(&h));
    let u_plus = u_minus + u_prime.cross(&h);

    // second half kick, then drift with the new velocity
    p.v = u_plus + half_kick;
    p.x += dt * p.v;
}

/// Sample the fields at the particle and push it, leaving tombstones alone
fn push_one(p: &mut Particle, fields: &FieldSet, dt: f64) {
    if p.is_disabled() {
        return;
    }
    let b = fields.b.sample(&p.x);
    let e = fields.e.sample(&p.x);
    boris_push(p, &b, &e, dt);
}

/// Advance every active particle of the population by one step, in parallel
/// Particles are independent: each task reads the fields and writes only its own particle
pub fn push_population(population: &mut [Particle], fields: &FieldSet, dt: f64) {
    population.par_iter_mut().for_each(|p| push_one(p, fields, dt));
}

/// Single-threaded variant of [`push_population`]
pub fn push_population_serial(population: &mut [Particle], fields: &FieldSet, dt: f64) {
    for p in population.iter_mut() {
        push_one(p, fields, dt);
    }
}
