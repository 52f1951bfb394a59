pub mod pattern;
pub mod snapshot;
