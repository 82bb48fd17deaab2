//! Construction-time errors
//!
//! Nothing on the per-frame path returns an error; these only come out of
//! building a system or loading a scenario.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PsimError {
    #[error("particle pool capacity must be greater than zero")]
    ZeroCapacity,

    #[error("unknown particle shape `{0}`")]
    UnknownShape(String),

    #[error("invalid value {value} for `{name}`")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("no emitter registered under `{0}`")]
    UnknownEmitter(String),

    #[error("failed to read scenario file")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario yaml")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, PsimError>;
