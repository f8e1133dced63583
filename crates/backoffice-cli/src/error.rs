//! Error types for backoffice-cli

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for backoffice-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in backoffice-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Configuration could not be loaded, edited or validated.
    #[error("Config error: {0}")]
    Config(String),

    /// Filesystem failure on a specific path.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Error from backoffice-api
    #[error("Server error: {0}")]
    Api(#[from] backoffice_api::ApiError),

    /// Error from backoffice-acl
    #[error("ACL error: {0}")]
    Acl(#[from] backoffice_acl::Error),
}

impl Error {
    /// Shorthand for [`Error::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Wrap an I/O error with the path it concerns.
    pub fn io_with_path(source: std::io::Error, path: &Path) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<backoffice_api::ConfigError> for Error {
    fn from(e: backoffice_api::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
