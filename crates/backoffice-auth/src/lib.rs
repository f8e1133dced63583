//! Authentication primitives for backoffice.
//!
//! Provides:
//! - [`AuthenticatedPrincipal`]: identity extracted from a validated token
//! - [`TokenValidator`]: trait for async token validation (implemented in `backoffice-auth-jwt`)
//! - [`AuthLayer`] / [`AuthService`]: Tower middleware parameterised over `TokenValidator`
//! - [`AuthConfig`]: configuration for the auth layer
//! - [`AuthError`]: auth-specific error types
//! - [`password`]: Argon2 password hashing

mod error;
mod middleware;
pub mod password;
mod principal;

pub use error::AuthError;
pub use middleware::{AuthLayer, AuthService};
pub use principal::{AuthenticatedPrincipal, principal_from_parts};

/// Configuration for the auth middleware.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Expected `iss` claim.
    pub issuer: String,
    /// Expected `aud` claim, if tokens carry one.
    pub audience: Option<String>,
    /// Clock skew tolerated when checking `exp`, in seconds.
    pub leeway_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "backoffice".to_string(),
            audience: None,
            leeway_secs: 30,
        }
    }
}

/// Trait for validating tokens and extracting principal identity.
///
/// The middleware calls `validate()` with the bearer token and, on success,
/// stores the returned principal in the request extensions.
pub trait TokenValidator: Send + Sync + 'static {
    /// Validate a token and return the authenticated principal.
    fn validate(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<AuthenticatedPrincipal, AuthError>> + Send + '_>,
    >;
}
