//! Error types for Wavesend

use thiserror::Error;

/// Main error type for Wavesend
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Wavesend
pub type Result<T> = std::result::Result<T, Error>;
