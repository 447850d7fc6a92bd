//! Error taxonomy for the cache engine.
//!
//! Only [`CareError::InvalidInput`] is ever returned from the public
//! canonicalization and translation entry points. The remaining variants
//! describe failures that are absorbed (logged, then folded into default
//! records or cache misses) so the caller always gets a displayable record.

use thiserror::Error;

/// Result alias used across the core crate.
pub type Result<T> = std::result::Result<T, CareError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CareError {
    /// Raw input was empty, too small, or malformed. Never cached.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network failure, non-2xx response, or timeout from the model.
    #[error("model transport failed: {0}")]
    TransportFailure(String),

    /// The model reply was not JSON or not the expected envelope.
    #[error("model response could not be parsed: {0}")]
    ParseFailure(String),

    /// A durable entry could not be read back.
    #[error("cache entry '{key}' is unreadable: {reason}")]
    CacheCorruption { key: String, reason: String },
}
