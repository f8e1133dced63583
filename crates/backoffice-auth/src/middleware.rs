//! Tower authentication middleware.
//!
//! `AuthLayer` and `AuthService` wrap any inner service with bearer token
//! validation. Generic over `TokenValidator`.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Request, StatusCode};
use tower::{Layer, Service};

use crate::{AuthConfig, TokenValidator};

/// Tower `Layer` that wraps services with token authentication.
pub struct AuthLayer<V: TokenValidator> {
    validator: Arc<V>,
    config: AuthConfig,
}

// `V` sits behind an `Arc` and need not be `Clone`.
impl<V: TokenValidator> Clone for AuthLayer<V> {
    fn clone(&self) -> Self {
        Self {
            validator: self.validator.clone(),
            config: self.config.clone(),
        }
    }
}

impl<V: TokenValidator> AuthLayer<V> {
    /// Create a new auth layer with the given validator and config.
    pub fn new(validator: Arc<V>, config: AuthConfig) -> Self {
        Self { validator, config }
    }
}

impl<V: TokenValidator, S> Layer<S> for AuthLayer<V> {
    type Service = AuthService<V, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            validator: self.validator.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower `Service` that validates tokens before forwarding requests.
///
/// On successful validation, inserts `AuthenticatedPrincipal` into request
/// extensions where it's available to downstream handlers. Every failure is
/// answered with 401 before the inner service runs.
pub struct AuthService<V: TokenValidator, S> {
    inner: S,
    validator: Arc<V>,
    config: AuthConfig,
}

impl<V: TokenValidator, S: Clone> Clone for AuthService<V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            validator: self.validator.clone(),
            config: self.config.clone(),
        }
    }
}

impl<V, S> Service<Request<Body>> for AuthService<V, S>
where
    V: TokenValidator,
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let validator = self.validator.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let token = match extract_bearer_token(&req) {
                Some(t) => t.to_string(),
                None => return Ok(unauthorized_response("missing or invalid bearer token")),
            };

            match validator.validate(&token, &config).await {
                Ok(principal) => {
                    req.extensions_mut().insert(principal);
                    let resp = inner
                        .call(req)
                        .await
                        .unwrap_or_else(|infallible| match infallible {});
                    Ok(resp.into_response())
                }
                Err(auth_err) => {
                    log::warn!("Authentication failed: {auth_err}");
                    Ok(unauthorized_response(&auth_err.to_string()))
                }
            }
        })
    }
}

/// Extract bearer token from the Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Build a 401 Unauthorized response with a `WWW-Authenticate` header.
fn unauthorized_response(message: &str) -> axum::response::Response {
    let body = serde_json::json!({
        "error": "unauthorized",
        "message": message,
    });

    (
        StatusCode::UNAUTHORIZED,
        [
            (http::header::CONTENT_TYPE, "application/json"),
            (http::header::WWW_AUTHENTICATE, "Bearer"),
        ],
        serde_json::to_string(&body).unwrap_or_default(),
    )
        .into_response()
}
