//! Error types for esl-player
//!
//! Controller operations never fail (bad indices and a missing player are
//! no-ops); errors come from loading transcripts and configuration.

use thiserror::Error;

/// Main error type for esl-player
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transcript parsing or validation errors
    #[error("Transcript error: {0}")]
    Transcript(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<esl_common::Error> for Error {
    fn from(err: esl_common::Error) -> Self {
        match err {
            esl_common::Error::Config(msg) => Error::Config(msg),
            esl_common::Error::Json(e) => Error::Transcript(e.to_string()),
            esl_common::Error::InvalidInput(msg) => Error::Transcript(msg),
            esl_common::Error::Io(e) => Error::Io(e),
        }
    }
}

/// Convenience Result type using esl-player Error
pub type Result<T> = std::result::Result<T, Error>;
