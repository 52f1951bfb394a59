pub mod simulation;
pub mod configuration;
pub mod output;
pub mod benchmark;
pub mod error;

pub use simulation::states::{Particle, Population, Provenance, NVec3};
pub use simulation::fields::{Field, FieldSet, UniformField, DipoleField};
pub use simulation::integrator::{boris_push, push_population};
pub use simulation::scenario::{Scenario, ScenarioKind, ScenarioIo, build_scenario, create_scenario};
pub use simulation::engine::{Engine, Tracer};

pub use configuration::config::{TracerConfig, EngineConfig, ParametersConfig, FieldConfig, DistributionConfig};

pub use error::{TracerError, TracerResult};

pub use benchmark::benchmark::{bench_push, bench_push_curve};
