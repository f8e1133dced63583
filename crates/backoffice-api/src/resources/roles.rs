//! Role management.
//!
//! Roles belong to nobody, so every operation requires the `:any` grant.
//! Updating `permission_ids` replaces the role's whole permission set, and
//! every listed id must name a stored permission.

use std::sync::Arc;

use serde_json::Value;

use backoffice_acl::model::PERMISSION_IDS_FIELD;
use backoffice_acl::{Permission, Role};
use backoffice_storage::{Patch, Repository};

use crate::Result;
use crate::resource::{Ownership, References, ResourceSpec, SaveContext, WriteLock};

/// The `roles` resource, checking assignments against `permissions`.
///
/// `catalog_writes` must be the lock shared with the `permissions` resource.
pub fn spec(
    permissions: Arc<dyn Repository<Permission>>,
    catalog_writes: WriteLock,
) -> ResourceSpec<Role> {
    ResourceSpec::new("roles", Ownership::Unowned)
        .with_crud_permissions("roles")
        .with_pre_save(clear_on_null)
        .with_save_step(Arc::new(References::new(PERMISSION_IDS_FIELD, permissions)))
        .with_write_lock(catalog_writes)
}

/// `permission_ids: null` empties the set.
fn clear_on_null(payload: &mut Patch, _ctx: &SaveContext<'_, Role>) -> Result<()> {
    if payload.get(PERMISSION_IDS_FIELD) == Some(&Value::Null) {
        payload.insert(PERMISSION_IDS_FIELD.to_string(), Value::Array(Vec::new()));
    }
    Ok(())
}
