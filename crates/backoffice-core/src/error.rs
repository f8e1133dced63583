//! Error types for backoffice-core

use thiserror::Error;

/// Result type alias for backoffice-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in backoffice-core
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An identifier string was not a valid UUID.
    #[error("invalid {kind} identifier '{value}'")]
    InvalidId {
        /// Which identifier was being parsed ("principal", "record").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}
