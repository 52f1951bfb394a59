pub mod states;
pub mod physics;
pub mod params;
pub mod engine;
pub mod fields;
pub mod distribution;
pub mod integrator;
pub mod scenario;
pub mod statistics;
