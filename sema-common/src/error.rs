//! Common error types for SEMA
//!
//! Failure domains with richer structure (dataset validation, inference,
//! storage, feedback) carry their own enums in `sema-engine`; this shared
//! type only covers what the common crate itself can fail at.

use thiserror::Error;

/// Common result type for SEMA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the shared crate (configuration loading)
#[derive(Error, Debug)]
pub enum Error {
    /// Reading a configuration file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
