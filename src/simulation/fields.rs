//! Field sources sampled by the tracer
//!
//! Defines the [`Field`] sampling trait, the [`FieldSet`] bundle of E, B and
//! bulk-velocity fields threaded through every scenario hook, and a few
//! analytic implementations standing in for the external field solver

use std::f64::consts::PI;

use crate::configuration::config::FieldConfig;
use crate::simulation::physics::MU_0;
use crate::simulation::states::NVec3;

/// A vector field: pure function of position for the duration of a timestep
/// Implementations must tolerate concurrent read-only sampling
pub trait Field: Send + Sync {
    fn sample(&self, x: &NVec3) -> NVec3;
}

impl<F> Field for F
where
    F: Fn(&NVec3) -> NVec3 + Send + Sync,
{
    fn sample(&self, x: &NVec3) -> NVec3 {
        self(x)
    }
}

/// Electric, magnetic and bulk-velocity fields handed to scenarios and the pusher
pub struct FieldSet {
    pub e: Box<dyn Field>,
    pub b: Box<dyn Field>,
    pub v: Box<dyn Field>,
}

impl FieldSet {
    pub fn new<E, B, V>(e: E, b: B, v: V) -> Self
    where
        E: Field + 'static,
        B: Field + 'static,
        V: Field + 'static,
    {
        Self {
            e: Box::new(e),
            b: Box::new(b),
            v: Box::new(v),
        }
    }

    /// Build all three fields from their configuration
    pub fn from_config(e: &FieldConfig, b: &FieldConfig, v: &FieldConfig) -> Self {
        Self {
            e: e.build(),
            b: b.build(),
            v: v.build(),
        }
    }
}

/// Same value everywhere
#[derive(Debug, Clone, Copy)]
pub struct UniformField {
    pub value: NVec3,
}

impl UniformField {
    pub fn new(value: NVec3) -> Self {
        Self { value }
    }

    pub fn zero() -> Self {
        Self { value: NVec3::zeros() }
    }
}

impl Field for UniformField {
    fn sample(&self, _x: &NVec3) -> NVec3 {
        self.value
    }
}

/// Magnetic field of a point dipole at the origin
/// B = mu0/4pi * (3 (m.r^) r^ - m) / r^3, zero inside `core_radius`
#[derive(Debug, Clone, Copy)]
pub struct DipoleField {
    pub moment: NVec3, // dipole moment [A m^2]
    pub core_radius: f64, // no field inside this radius
}

impl Field for DipoleField {
    fn sample(&self, x: &NVec3) -> NVec3 {
        let r = x.norm();
        if r <= self.core_radius {
            return NVec3::zeros();
        }
        let r_hat = *x / r;
        let inv_r3 = (r * r * r).recip();
        (MU_0 / (4.0 * PI)) * (3.0 * self.moment.dot(&r_hat) * r_hat - self.moment) * inv_r3
    }
}

impl FieldConfig {
    pub fn build(&self) -> Box<dyn Field> {
        match self {
            FieldConfig::Zero => Box::new(UniformField::zero()),
            FieldConfig::Uniform { value } => Box::new(UniformField::new(NVec3::new(value[0], value[1], value[2]))),
            FieldConfig::Dipole { moment, core_radius } => Box::new(DipoleField {
                moment: NVec3::new(moment[0], moment[1], moment[2]),
                core_radius: *core_radius,
            }),
        }
    }
}
