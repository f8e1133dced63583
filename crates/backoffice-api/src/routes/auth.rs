//! Registration and login.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use http::StatusCode;
use serde_json::{Map, Value, json};

use backoffice_acl::User;
use backoffice_acl::seed::USER_ROLE;
use backoffice_storage::{Entity, Patch, Predicate};

use crate::context::AppContext;
use crate::credentials;
use crate::factory::parse_payload;
use crate::hooks::{MutationAction, MutationEvent};
use crate::{ApiError, Result};

/// Message for every failed login, whichever part was wrong.
pub const INVALID_CREDENTIALS: &str = "invalid email or password";

/// `POST /auth/register` with `{name, email, password}`.
///
/// The new account always gets the User role; a client cannot choose roles.
pub async fn register(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>)> {
    let payload = parse_payload(&body)?;
    let name = required(&payload, "name")?;
    let email = required(&payload, "email")?.to_lowercase();
    let password = raw_password(&payload)?;
    if !email.contains('@') {
        return Err(ApiError::validation("email must be a valid address"));
    }

    let users = &ctx.repos.users;
    if users
        .find_one(&Predicate::eq("email", email.as_str()))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("email is already registered".to_string()));
    }

    let role = ctx
        .repos
        .roles
        .find_one(&Predicate::eq("name", USER_ROLE))
        .await?
        .ok_or_else(|| ApiError::internal(format!("default role {USER_ROLE} is missing")))?;

    let mut fields = Map::new();
    fields.insert("name".into(), Value::String(name.to_string()));
    fields.insert("email".into(), Value::String(email));
    fields.insert(
        "password_hash".into(),
        Value::String(credentials::hash(password.to_string()).await?),
    );
    fields.insert(
        "role_ids".into(),
        Value::Array(vec![Value::String(role.id.to_string())]),
    );
    let user = users.save(users.create(fields)?).await?;
    log::info!("registered account {} ({})", user.email, user.id);

    ctx.hooks
        .dispatch(MutationEvent::new(
            User::KIND,
            user.id,
            MutationAction::Create,
            None,
        ))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registered",
            "data": { "id": user.id, "email": user.email, "name": user.name },
        })),
    ))
}

/// `POST /auth/token` with `{email, password}`.
pub async fn token(State(ctx): State<AppContext>, body: Bytes) -> Result<Json<Value>> {
    let payload = parse_payload(&body)?;
    let email = required(&payload, "email")?.to_lowercase();
    let password = raw_password(&payload)?;

    let user = ctx
        .repos
        .users
        .find_one(&Predicate::eq("email", email.as_str()))
        .await?;
    let Some(user) = user else {
        log::debug!("login for unknown account {email}");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };
    if user.password_hash.is_empty()
        || !credentials::verify(password.to_string(), user.password_hash.clone()).await?
    {
        log::debug!("login with wrong password for {}", user.id);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let principal = ctx.identity.resolve(user.principal_id()).await?;
    let issued = ctx.issuer.issue(principal.id, &principal.email)?;
    log::info!("issued token for {}", principal.id);

    Ok(Json(json!({
        "data": {
            "token": issued.token,
            "token_type": "Bearer",
            "expires_at": issued.expires_at,
            "user": {
                "id": principal.id,
                "email": principal.email,
                "name": principal.name,
                "roles": principal.roles,
            },
        },
    })))
}

fn required<'a>(payload: &'a Patch, field: &str) -> Result<&'a str> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("{field} is required")))
}

/// The password exactly as sent; only an empty one is refused.
fn raw_password(payload: &Patch) -> Result<&str> {
    payload
        .get("password")
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation("password is required"))
}
