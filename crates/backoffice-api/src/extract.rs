//! Request extractors.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use http::request::Parts;

use backoffice_acl::{IdentityResolver, Principal};
use backoffice_auth::principal_from_parts;

use crate::ApiError;

/// The resolved caller of a request behind the auth layer.
///
/// Reads the [`backoffice_auth::AuthenticatedPrincipal`] left by the auth
/// middleware and resolves its roles and permissions. A request that reached
/// the handler without one, or whose principal no longer exists, is
/// rejected with 401.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    Arc<IdentityResolver>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticated = principal_from_parts(parts)
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))?;
        let identity = Arc::<IdentityResolver>::from_ref(state);
        let principal = identity.resolve(authenticated.subject).await?;
        Ok(Caller(principal))
    }
}
