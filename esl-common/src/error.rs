//! Common error types for the ESL player crates

use thiserror::Error;

/// Common result type for ESL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the ESL crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON input (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or data (e.g. a segment with start >= end)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
