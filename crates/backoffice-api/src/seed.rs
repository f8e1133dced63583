//! Startup seeding: permission catalog, default roles and demo accounts.
//!
//! Every step looks records up before inserting them, so running it against
//! an already seeded or partially seeded store changes nothing that exists.

use serde_json::{Map, Value};

use backoffice_acl::catalog::{DEFAULT_RESOURCES, seed_catalog};
use backoffice_acl::seed::seed_roles;
use backoffice_acl::{Role, User};
use backoffice_storage::{Predicate, Repository};

use crate::Result;
use crate::context::AppContext;
use crate::credentials;

/// A demo account created when `seed.demo_accounts` is on.
#[derive(Debug, Clone, Copy)]
pub struct DemoAccount {
    /// Login email.
    pub email: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Clear-text password.
    pub password: &'static str,
    /// Avatar image.
    pub avatar_url: &'static str,
}

/// Demo administrator, holding the Admin role.
pub const DEMO_ADMIN: DemoAccount = DemoAccount {
    email: "admin@example.com",
    name: "Admin Dashboard",
    password: "Admin123!",
    avatar_url: "https://i.pravatar.cc/150?u=admin",
};

/// Demo standard account, holding the User role.
pub const DEMO_USER: DemoAccount = DemoAccount {
    email: "user@example.com",
    name: "Users Tester",
    password: "User123!",
    avatar_url: "https://i.pravatar.cc/150?u=rina",
};

/// Seed everything the configuration asks for.
pub async fn bootstrap(ctx: &AppContext) -> Result<()> {
    if !ctx.config.seed.enabled {
        log::info!("seeding disabled");
        return Ok(());
    }

    seed_catalog(ctx.repos.permissions.as_ref(), DEFAULT_RESOURCES).await?;
    let (admin, user) = seed_roles(ctx.repos.roles.as_ref(), ctx.repos.permissions.as_ref()).await?;

    if ctx.config.seed.demo_accounts {
        let users = ctx.repos.users.as_ref();
        ensure_account(users, &DEMO_ADMIN, &admin).await?;
        ensure_account(users, &DEMO_USER, &user).await?;
    }
    Ok(())
}

/// Create `account` with `role` unless its email is already registered.
pub async fn ensure_account(
    users: &dyn Repository<User>,
    account: &DemoAccount,
    role: &Role,
) -> Result<Option<User>> {
    if users
        .find_one(&Predicate::eq("email", account.email))
        .await?
        .is_some()
    {
        log::debug!("account {} already present", account.email);
        return Ok(None);
    }

    let mut fields = Map::new();
    fields.insert("email".into(), Value::String(account.email.to_string()));
    fields.insert("name".into(), Value::String(account.name.to_string()));
    fields.insert("avatar_url".into(), Value::String(account.avatar_url.to_string()));
    fields.insert(
        "password_hash".into(),
        Value::String(credentials::hash(account.password.to_string()).await?),
    );
    fields.insert(
        "role_ids".into(),
        Value::Array(vec![Value::String(role.id.to_string())]),
    );

    let created = users.save(users.create(fields)?).await?;
    log::info!("created demo account {} ({})", created.email, role.name);
    Ok(Some(created))
}
