//! Authenticated principal identity and extraction helpers.

use backoffice_core::PrincipalId;

/// An authenticated principal, extracted from a validated token.
///
/// Stored in HTTP request extensions by the auth middleware. It only proves
/// who the caller is; roles and permissions are resolved per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    /// The principal identifier (from the `sub` claim).
    pub subject: PrincipalId,
    /// The email the token was issued for.
    pub email: String,
}

/// Extract the `AuthenticatedPrincipal` from HTTP request `Parts`, if present.
pub fn principal_from_parts(parts: &http::request::Parts) -> Option<&AuthenticatedPrincipal> {
    parts.extensions.get::<AuthenticatedPrincipal>()
}
