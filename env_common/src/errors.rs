use dbx_defs::{GenerationError, UnknownCapability, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TablesError {
    #[error("Failed to read tables file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid tables file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("Invalid tables: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    UnknownCapability(#[from] UnknownCapability),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
