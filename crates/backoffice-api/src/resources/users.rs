//! Account management.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use backoffice_acl::model::ROLE_IDS_FIELD;
use backoffice_acl::{Role, Scope, User};
use backoffice_storage::{Patch, Repository};

use crate::credentials;
use crate::resource::{Ownership, References, ResourceSpec, SaveContext, SaveStep};
use crate::{ApiError, Result};

/// Field carrying the clear-text password in requests.
pub const PASSWORD_FIELD: &str = "password";
/// Stored credential field; never read from or written to clients.
pub const PASSWORD_HASH_FIELD: &str = "password_hash";

/// The `users` resource. Under `own` scope a principal sees and edits only
/// its own account and cannot change its roles. Assigned roles must exist.
pub fn spec(roles: Arc<dyn Repository<Role>>) -> ResourceSpec<User> {
    ResourceSpec::new("users", Ownership::SelfIdentified)
        .with_crud_permissions("users")
        .with_pre_save(prepare_account)
        .with_save_step(Arc::new(References::new(ROLE_IDS_FIELD, roles)))
        .with_save_step(Arc::new(HashPassword))
        .with_sanitizer(hide_credentials)
}

/// Remove credential material from a rendered account.
pub fn hide_credentials(value: &mut Value) {
    if let Some(fields) = value.as_object_mut() {
        fields.remove(PASSWORD_HASH_FIELD);
    }
}

fn prepare_account(payload: &mut Patch, ctx: &SaveContext<'_, User>) -> Result<()> {
    payload.remove(PASSWORD_HASH_FIELD);
    if ctx.scope == Scope::Own {
        payload.remove(ROLE_IDS_FIELD);
    }

    if let Some(email) = payload.get("email") {
        if !email.as_str().is_some_and(|e| e.contains('@')) {
            return Err(ApiError::validation("email must be a valid address"));
        }
    }

    match payload.get(PASSWORD_FIELD) {
        Some(Value::String(password)) if !password.is_empty() => {}
        None if !ctx.is_create() => {}
        Some(Value::Null) if !ctx.is_create() => {
            payload.remove(PASSWORD_FIELD);
        }
        None | Some(Value::Null) => return Err(ApiError::validation("password is required")),
        Some(_) => return Err(ApiError::validation("password must be a non-empty string")),
    }
    Ok(())
}

/// Replaces the clear-text password with its hash, exactly as sent.
struct HashPassword;

#[async_trait]
impl SaveStep<User> for HashPassword {
    async fn apply(&self, payload: &mut Patch, _existing: Option<&User>) -> Result<()> {
        match payload.remove(PASSWORD_FIELD) {
            Some(Value::String(password)) => {
                let hash = credentials::hash(password).await?;
                payload.insert(PASSWORD_HASH_FIELD.to_string(), Value::String(hash));
                Ok(())
            }
            None => Ok(()),
            Some(_) => Err(ApiError::validation("password must be a non-empty string")),
        }
    }
}
