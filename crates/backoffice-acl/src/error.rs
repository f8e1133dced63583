//! Error types for backoffice-acl

use thiserror::Error;

use backoffice_core::PrincipalId;

use crate::BasePermission;

/// Result type alias for backoffice-acl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in backoffice-acl
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The principal holds neither the `:any` nor the `:own` grant.
    #[error("missing permission {missing}")]
    Forbidden {
        /// The base permission that was required.
        missing: BasePermission,
    },

    /// The identifier does not resolve to a living principal.
    #[error("principal {0} not found")]
    PrincipalNotFound(PrincipalId),

    /// A string is not a `resource:action:scope` key.
    #[error("invalid permission key '{0}'")]
    InvalidPermissionKey(String),

    /// A resource name is empty or contains the key separator.
    #[error("invalid resource name '{0}'")]
    InvalidResource(String),

    /// Error from backoffice-storage
    #[error("Storage error: {0}")]
    Storage(#[from] backoffice_storage::Error),
}
