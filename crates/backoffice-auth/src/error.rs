//! Auth-specific error types.

/// Errors that can occur during authentication.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header or bearer token present.
    #[error("missing authentication token")]
    MissingToken,

    /// Token format is invalid (not a valid JWT).
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    /// JWT signature verification failed.
    #[error("invalid token signature: {0}")]
    InvalidSignature(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token was not issued by this service.
    #[error("invalid issuer")]
    InvalidIssuer,

    /// Token audience doesn't match the configured audience.
    #[error("invalid audience")]
    InvalidAudience,

    /// The `sub` claim is not a principal identifier.
    #[error("invalid subject '{0}'")]
    InvalidSubject(String),

    /// Signing a new token failed.
    #[error("failed to issue token: {0}")]
    Issue(String),

    /// Hashing or parsing a stored password hash failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    /// Whether this error should result in a 401 (vs. a 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::InvalidFormat(_)
                | AuthError::InvalidSignature(_)
                | AuthError::Expired
                | AuthError::InvalidIssuer
                | AuthError::InvalidAudience
                | AuthError::InvalidSubject(_)
        )
    }
}
