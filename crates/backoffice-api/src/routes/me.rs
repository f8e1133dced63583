//! The caller's own identity.

use axum::Json;
use serde_json::{Value, json};

use crate::extract::Caller;

/// `GET /me`: id, email, name, role names and sorted permission keys.
pub async fn me(Caller(caller): Caller) -> Json<Value> {
    let mut permissions: Vec<String> = caller.permissions.iter().map(ToString::to_string).collect();
    permissions.sort();
    Json(json!({
        "data": {
            "id": caller.id,
            "email": caller.email,
            "name": caller.name,
            "roles": caller.roles,
            "permissions": permissions,
        },
    }))
}
