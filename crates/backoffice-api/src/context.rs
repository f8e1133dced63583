//! The explicitly constructed application context.
//!
//! Everything a request needs (repositories, the identity resolver with its
//! permission cache, token signing and validation, mutation hooks) is built
//! once in [`AppContext::new`] and handed to the router as axum state.

use std::sync::Arc;

use axum::extract::FromRef;

use backoffice_acl::{IdentityResolver, Permission, Role, User};
use backoffice_auth_jwt::{JwtTokenValidator, TokenIssuer};
use backoffice_storage::{MemoryRepository, Repository};

use crate::audit::{AuditRecord, AuditRecorder};
use crate::config::{Config, ConfigError};
use crate::hooks::{CacheInvalidator, HookSet, MutationHook};
use crate::resource::WriteLock;
use crate::resources::calculations::Calculation;

/// One repository per entity type.
#[derive(Clone)]
pub struct Repositories {
    /// Accounts.
    pub users: Arc<dyn Repository<User>>,
    /// Roles.
    pub roles: Arc<dyn Repository<Role>>,
    /// Permission catalog.
    pub permissions: Arc<dyn Repository<Permission>>,
    /// ROI calculations.
    pub calculations: Arc<dyn Repository<Calculation>>,
    /// Audit trail.
    pub audit: Arc<dyn Repository<AuditRecord>>,
}

impl Repositories {
    /// Fresh process-local stores.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryRepository::<User>::new()),
            roles: Arc::new(MemoryRepository::<Role>::new()),
            permissions: Arc::new(MemoryRepository::<Permission>::new()),
            calculations: Arc::new(MemoryRepository::<Calculation>::new()),
            audit: Arc::new(MemoryRepository::<AuditRecord>::new()),
        }
    }
}

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppContext {
    /// Effective configuration.
    pub config: Arc<Config>,
    /// Stores.
    pub repos: Repositories,
    /// Principal lookup with the permission cache.
    pub identity: Arc<IdentityResolver>,
    /// Access token signer.
    pub issuer: Arc<TokenIssuer>,
    /// Access token verifier used by the auth layer.
    pub validator: Arc<JwtTokenValidator>,
    /// Post-commit mutation hooks.
    pub hooks: HookSet,
    /// Serializes role and permission writes.
    pub catalog_writes: WriteLock,
}

impl AppContext {
    /// Build the context over `repos`. Fails when `config` is not runnable.
    pub fn new(config: Config, repos: Repositories) -> Result<Self, ConfigError> {
        config.validate()?;

        let identity = Arc::new(IdentityResolver::new(
            repos.users.clone(),
            repos.roles.clone(),
            repos.permissions.clone(),
            config.cache.permission_ttl(),
        ));

        let secret = config.auth.jwt_secret.as_bytes();
        let issuer = Arc::new(TokenIssuer::new(
            secret,
            &config.auth.auth_config(),
            config.auth.token_ttl(),
        ));
        let validator = Arc::new(JwtTokenValidator::new(secret));

        let recorder: Arc<dyn MutationHook> = Arc::new(AuditRecorder::new(
            repos.audit.clone(),
            config.audit.entities.iter().cloned(),
        ));
        let invalidator: Arc<dyn MutationHook> = Arc::new(CacheInvalidator::new(identity.clone()));
        let hooks = HookSet::new(vec![recorder, invalidator]);

        log::debug!(
            "context ready: {} hook(s), permission cache ttl {:?}",
            hooks.len(),
            config.cache.permission_ttl()
        );

        Ok(Self {
            config: Arc::new(config),
            repos,
            identity,
            issuer,
            validator,
            hooks,
            catalog_writes: WriteLock::default(),
        })
    }
}

impl FromRef<AppContext> for Arc<IdentityResolver> {
    fn from_ref(ctx: &AppContext) -> Self {
        ctx.identity.clone()
    }
}
