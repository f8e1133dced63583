//! Default roles.

use std::collections::HashMap;

use serde_json::{Map, Value};

use backoffice_core::RecordId;
use backoffice_storage::{Order, Predicate, Repository};

use crate::{Permission, Result, Role};

/// Name of the role holding every catalog permission.
pub const ADMIN_ROLE: &str = "Admin";
/// Name of the role given to self-registered accounts.
pub const USER_ROLE: &str = "User";

/// Keys granted to the [`USER_ROLE`].
pub const USER_ROLE_KEYS: &[&str] = &[
    "dashboard:read:any",
    "settings:read:own",
    "settings:update:own",
    "calculate:read:own",
    "calculate:create:own",
    "users:read:own",
    "users:update:own",
];

/// Create the Admin and User roles if they do not exist yet.
///
/// Existing roles are left untouched, so grants edited by an operator
/// survive a restart. Returns the two roles.
pub async fn seed_roles(
    roles: &dyn Repository<Role>,
    permissions: &dyn Repository<Permission>,
) -> Result<(Role, Role)> {
    let catalog: HashMap<String, RecordId> = permissions
        .find(&Predicate::All, Order::OldestFirst)
        .await?
        .into_iter()
        .map(|p| (p.key, p.id))
        .collect();

    let all: Vec<RecordId> = catalog.values().copied().collect();
    let admin = ensure_role(roles, ADMIN_ROLE, "Full access to every resource", all).await?;

    let user_grants = USER_ROLE_KEYS
        .iter()
        .filter_map(|key| {
            let id = catalog.get(*key).copied();
            if id.is_none() {
                log::warn!("permission {key} missing from catalog; not granted to {USER_ROLE}");
            }
            id
        })
        .collect();
    let user = ensure_role(roles, USER_ROLE, "Standard account", user_grants).await?;

    Ok((admin, user))
}

async fn ensure_role(
    roles: &dyn Repository<Role>,
    name: &str,
    description: &str,
    permission_ids: Vec<RecordId>,
) -> Result<Role> {
    if let Some(existing) = roles.find_one(&Predicate::eq("name", name)).await? {
        log::debug!("role {name} already present");
        return Ok(existing);
    }

    let mut fields = Map::new();
    fields.insert("name".into(), Value::String(name.to_string()));
    fields.insert("description".into(), Value::String(description.to_string()));
    fields.insert(
        "permission_ids".into(),
        Value::Array(
            permission_ids
                .iter()
                .map(|id| Value::String(id.to_string()))
                .collect(),
        ),
    );

    let role = roles.save(roles.create(fields)?).await?;
    log::info!(
        "created role {name} with {} permission(s)",
        role.permission_ids.len()
    );
    Ok(role)
}
