//! Error types for the simulation harness.

use fairdrift_core::{ConfigError, FairDivisionError};
use thiserror::Error;

/// Errors surfaced by the harness and CLI.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] FairDivisionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
