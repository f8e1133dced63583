//! Permission catalog management.
//!
//! Entries are guarded by the `roles` permissions: reading needs
//! `roles:read`, every change needs `roles:manage`. While an entry is
//! assigned to a role it can neither be deleted nor have its
//! `(resource, action, scope)` rewritten.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use backoffice_acl::catalog::validate_resource;
use backoffice_acl::model::PERMISSION_IDS_FIELD;
use backoffice_acl::{Action, BasePermission, Permission, Role, Scope};
use backoffice_core::RecordId;
use backoffice_storage::{Patch, Predicate, Repository};

use crate::resource::{
    DeleteGuard, Operation, Ownership, ResourceSpec, SaveContext, SaveStep, WriteLock,
};
use crate::{ApiError, Result};

/// The `permissions` resource.
///
/// `catalog_writes` must be the lock shared with the `roles` resource.
pub fn spec(
    roles: Arc<dyn Repository<Role>>,
    catalog_writes: WriteLock,
) -> ResourceSpec<Permission> {
    let read = BasePermission::new("roles", Action::Read);
    let manage = BasePermission::new("roles", Action::Manage);
    let assigned = Arc::new(AssignedToRole { roles });
    ResourceSpec::new("permissions", Ownership::Unowned)
        .with_permission(Operation::List, read)
        .with_permission(Operation::Create, manage.clone())
        .with_permission(Operation::Update, manage.clone())
        .with_permission(Operation::Delete, manage)
        .with_pre_save(check_tuple)
        .with_save_step(assigned.clone())
        .with_delete_guard(assigned)
        .with_write_lock(catalog_writes)
}

/// The key is always derived from the tuple; a client value is discarded.
fn check_tuple(payload: &mut Patch, ctx: &SaveContext<'_, Permission>) -> Result<()> {
    payload.remove("key");

    let resource = match payload.get("resource") {
        Some(Value::String(r)) => Some(r.as_str()),
        Some(_) => return Err(ApiError::validation("resource must be a string")),
        None => ctx.existing.map(|p| p.resource.as_str()),
    };
    if let Some(resource) = resource {
        validate_resource(resource)?;
    }

    let retupled = ctx.existing.is_none_or(|p| changes_tuple(&*payload, p));
    if retupled && !payload.contains_key("description") {
        let action = payload
            .get("action")
            .and_then(Value::as_str)
            .and_then(|a| a.parse::<Action>().ok())
            .or(ctx.existing.map(|p| p.action));
        let scope = payload
            .get("scope")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Scope>().ok())
            .or(ctx.existing.map(|p| p.scope));
        if let (Some(resource), Some(action), Some(scope)) = (resource, action, scope) {
            let description = format!("Allow to {action} {resource} ({scope})");
            payload.insert("description".to_string(), Value::String(description));
        }
    }
    Ok(())
}

/// Whether `payload` sets any tuple field to something other than `stored`'s.
fn changes_tuple(payload: &Patch, stored: &Permission) -> bool {
    let differs = |field: &str, current: &str| {
        payload
            .get(field)
            .is_some_and(|v| v.as_str() != Some(current))
    };
    differs("resource", &stored.resource)
        || differs("action", stored.action.as_str())
        || differs("scope", stored.scope.as_str())
}

struct AssignedToRole {
    roles: Arc<dyn Repository<Role>>,
}

impl AssignedToRole {
    async fn refuse_if_held(&self, id: RecordId, doing: &str) -> Result<()> {
        let holders = self
            .roles
            .count(&Predicate::contains_id(PERMISSION_IDS_FIELD, id))
            .await?;
        if holders > 0 {
            log::debug!("refusing to {doing} permission {id}: held by {holders} role(s)");
            return Err(ApiError::Conflict(format!(
                "permission is assigned to {holders} role(s)"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DeleteGuard for AssignedToRole {
    async fn check(&self, id: RecordId) -> Result<()> {
        self.refuse_if_held(id, "delete").await
    }
}

#[async_trait]
impl SaveStep<Permission> for AssignedToRole {
    async fn apply(&self, payload: &mut Patch, existing: Option<&Permission>) -> Result<()> {
        match existing {
            Some(stored) if changes_tuple(payload, stored) => {
                self.refuse_if_held(stored.id, "rewrite").await
            }
            _ => Ok(()),
        }
    }
}
