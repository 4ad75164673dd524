use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityId;

/// Caller misuse of the random helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RngError {
    #[error("{operation} requires at least one item")]
    EmptyInput { operation: &'static str },
    #[error("items and weights must have the same length ({items} items, {weights} weights)")]
    LengthMismatch { items: usize, weights: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("time step must be finite and positive, got {0}")]
    InvalidTimeStep(f64),
    #[error("entity {id:?} has invalid mass {mass}")]
    InvalidMass { id: EntityId, mass: f64 },
    #[error("verlet integration selected but old positions were never initialised")]
    VerletNotInitialized,
}
