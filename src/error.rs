use thiserror::Error;

#[derive(Error, Debug)]
pub enum TracerError {
    #[error("Unknown scenario \"{0}\"")]
    UnknownScenario(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid distribution parameters: {0}")]
    InvalidDistribution(String),

    #[error("Invalid filename pattern \"{pattern}\": {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Malformed snapshot {path}: {message}")]
    MalformedSnapshot { path: String, message: String },

    #[error("Array \"{0}\" not found in snapshot")]
    MissingArray(String),

    #[error("NPZ write error: {0}")]
    NpzWrite(#[from] ndarray_npy::WriteNpzError),

    #[error("NPZ read error: {0}")]
    NpzRead(#[from] ndarray_npy::ReadNpzError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type TracerResult<T> = Result<T, TracerError>;
