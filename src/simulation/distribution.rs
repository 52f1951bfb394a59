//! Seeded velocity distributions used to populate particle clusters.
//!
//! A [`VelocitySampler`] is built from an explicit seed and a
//! [`DistributionConfig`], used for one injection and dropped. Building it
//! again with the same seed replays the same particles.

use rand::prelude::*;
use rand_distr::{ChiSquared, Distribution, StandardNormal};

use crate::configuration::config::DistributionConfig;
use crate::error::{TracerError, TracerResult};
use crate::simulation::physics::{BOLTZMANN, C, ELEMENTARY_CHARGE};
use crate::simulation::states::{NVec3, Particle};

/// Anything producing fresh particle templates (mass, charge and velocity set, position zero)
pub trait ParticleSource {
    fn next_particle(&mut self) -> Particle;
}

#[derive(Debug, Clone, Copy)]
enum Family {
    Maxwell { sigma: f64 },
    Monoenergetic { speed: f64 },
    Kappa { sigma: f64, chi2: ChiSquared<f64>, dof: f64 },
}

/// Velocity sampler for one distribution family, seeded once on construction
#[derive(Debug, Clone)]
pub struct VelocitySampler {
    rng: StdRng,
    family: Family,
    mass: f64,
    charge: f64,
}

impl VelocitySampler {
    /// Build a sampler for particles of mass `mass` and charge `charge`
    /// Fails on non-physical parameters (negative temperature, kappa <= 3/2, ...)
    pub fn new(seed: u64, spec: &DistributionConfig, mass: f64, charge: f64) -> TracerResult<Self> {
        let family = match *spec {
            DistributionConfig::MaxwellBoltzmann { temperature } => {
                if !(temperature >= 0.0) {
                    return Err(TracerError::InvalidDistribution(format!(
                        "temperature must be non-negative, got {temperature}"
                    )));
                }
                Family::Maxwell { sigma: (BOLTZMANN * temperature / mass).sqrt() }
            }
            DistributionConfig::Monoenergetic { energy_ev } => {
                if !(energy_ev >= 0.0) {
                    return Err(TracerError::InvalidDistribution(format!(
                        "energy must be non-negative, got {energy_ev}"
                    )));
                }
                // gamma = 1 + E / (m c^2), |v| = c sqrt(1 - 1/gamma^2)
                let gamma = 1.0 + energy_ev * ELEMENTARY_CHARGE / (mass * C * C);
                Family::Monoenergetic { speed: C * (1.0 - 1.0 / (gamma * gamma)).sqrt() }
            }
            DistributionConfig::Kappa { kappa, temperature } => {
                if !(kappa > 1.5) || !(temperature >= 0.0) {
                    return Err(TracerError::InvalidDistribution(format!(
                        "kappa must exceed 3/2 and temperature be non-negative, got kappa={kappa} T={temperature}"
                    )));
                }
                // 3D kappa is a multivariate Student-t with 2 kappa - 1 degrees of freedom
                let theta2 = (2.0 * kappa - 3.0) / kappa * BOLTZMANN * temperature / mass;
                let dof = 2.0 * kappa - 1.0;
                let chi2 = ChiSquared::new(dof)
                    .map_err(|e| TracerError::InvalidDistribution(e.to_string()))?;
                Family::Kappa { sigma: (kappa * theta2 / dof).sqrt(), chi2, dof }
            }
        };

        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            family,
            mass,
            charge,
        })
    }

    fn normal3(&mut self) -> NVec3 {
        NVec3::new(
            StandardNormal.sample(&mut self.rng),
            StandardNormal.sample(&mut self.rng),
            StandardNormal.sample(&mut self.rng),
        )
    }

    /// Draw one velocity
    pub fn sample_velocity(&mut self) -> NVec3 {
        let family = self.family;
        match family {
            Family::Maxwell { sigma } => sigma * self.normal3(),
            Family::Monoenergetic { speed } => {
                // uniform direction on the sphere
                let phi = 2.0 * std::f64::consts::PI * self.rng.gen::<f64>();
                let cos_theta = 2.0 * self.rng.gen::<f64>() - 1.0;
                let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
                speed * NVec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
            }
            Family::Kappa { sigma, chi2, dof } => {
                let z = self.normal3();
                let w: f64 = chi2.sample(&mut self.rng);
                sigma * z / (w / dof).sqrt()
            }
        }
    }
}

impl ParticleSource for VelocitySampler {
    fn next_particle(&mut self) -> Particle {
        let v = self.sample_velocity();
        Particle::new(self.mass, self.charge, NVec3::zeros(), v)
    }
}
