//! Error types for BptDb.

use std::io;
use thiserror::Error;

/// The result type used throughout BptDb.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for BptDb operations.
///
/// Lookups collapse every variant into "no value"; the checked entry points
/// (`try_search`, `try_get`, `try_load`) hand the cause back to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred, including short reads.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The index file is malformed.
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// The record decoder rejected a payload.
    #[error("Decode error: {0}")]
    Decode(String),

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Creates a new corruption error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Creates a new decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Returns true if the error came from the underlying stream.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}
