//! Endpoints outside the generic resource factory.

pub mod auth;
pub mod dashboard;
pub mod me;

use axum::Json;
use axum::Router;
use axum::routing::{get, post};
use serde_json::{Value, json};

use crate::context::AppContext;

/// Routes reachable without a bearer token.
pub fn public() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/token", post(auth::token))
}

/// Routes that require an authenticated caller.
pub fn protected() -> Router<AppContext> {
    Router::new()
        .route("/me", get(me::me))
        .route("/dashboard/summary", get(dashboard::summary))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
