//! Principal resolution.
//!
//! [`IdentityResolver`] turns an authenticated principal identifier into a
//! [`Principal`]: the account, its roles, and the union of every permission
//! key those roles grant. Results are cached per principal for a short TTL
//! and dropped explicitly whenever users, roles or permissions change.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;

use backoffice_core::{PrincipalId, RecordId};
use backoffice_storage::{Order, Predicate, Repository};

use crate::{Error, Permission, PermissionSet, Result, Role, User};

/// A resolved caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    /// Principal identifier (the account record id).
    pub id: PrincipalId,
    /// Account email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Names of the assigned roles.
    pub roles: Vec<String>,
    /// Effective permission keys.
    pub permissions: PermissionSet,
}

struct CachedPrincipal {
    principal: Principal,
    fetched_at: Instant,
}

/// Per-principal cache of resolved identities.
///
/// A zero TTL disables caching.
pub struct PermissionCache {
    ttl: Duration,
    entries: RwLock<HashMap<PrincipalId, CachedPrincipal>>,
}

impl PermissionCache {
    /// Cache entries for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A fresh entry for `id`, if any.
    pub fn get(&self, id: &PrincipalId) -> Option<Principal> {
        let entries = self.entries.read().ok()?;
        let cached = entries.get(id)?;
        (cached.fetched_at.elapsed() < self.ttl).then(|| cached.principal.clone())
    }

    /// Remember `principal`.
    pub fn insert(&self, principal: Principal) {
        if self.ttl.is_zero() {
            return;
        }
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, c| c.fetched_at.elapsed() < self.ttl);
            entries.insert(
                principal.id,
                CachedPrincipal {
                    principal,
                    fetched_at: Instant::now(),
                },
            );
        }
    }

    /// Drop the entry for `id`.
    pub fn invalidate(&self, id: &PrincipalId) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(id);
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Number of entries currently held (fresh or not).
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or_default()
    }

    /// Whether no entry is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loads principals and their effective permissions from the store.
pub struct IdentityResolver {
    users: Arc<dyn Repository<User>>,
    roles: Arc<dyn Repository<Role>>,
    permissions: Arc<dyn Repository<Permission>>,
    cache: PermissionCache,
}

impl IdentityResolver {
    /// Resolver over the given repositories, caching results for `ttl`.
    pub fn new(
        users: Arc<dyn Repository<User>>,
        roles: Arc<dyn Repository<Role>>,
        permissions: Arc<dyn Repository<Permission>>,
        ttl: Duration,
    ) -> Self {
        Self {
            users,
            roles,
            permissions,
            cache: PermissionCache::new(ttl),
        }
    }

    /// The underlying cache.
    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    /// Resolve `id` to a principal with its effective permission set.
    ///
    /// Returns [`Error::PrincipalNotFound`] when no account matches, e.g.
    /// for a token issued to an account that was deleted since.
    pub async fn resolve(&self, id: PrincipalId) -> Result<Principal> {
        if let Some(principal) = self.cache.get(&id) {
            return Ok(principal);
        }

        let user = self
            .users
            .find_one(&Predicate::id(id.into()))
            .await?
            .ok_or(Error::PrincipalNotFound(id))?;

        let principal = self.load(user).await?;
        log::debug!(
            "resolved principal {} with {} permission(s)",
            principal.id,
            principal.permissions.len()
        );
        self.cache.insert(principal.clone());
        Ok(principal)
    }

    async fn load(&self, user: User) -> Result<Principal> {
        let roles = if user.role_ids.is_empty() {
            Vec::new()
        } else {
            self.roles
                .find(
                    &Predicate::id_in(user.role_ids.iter().copied()),
                    Order::OldestFirst,
                )
                .await?
        };

        let permission_ids: BTreeSet<RecordId> = roles
            .iter()
            .flat_map(|r| r.permission_ids.iter().copied())
            .collect();

        let mut permissions = PermissionSet::new();
        if !permission_ids.is_empty() {
            let granted = self
                .permissions
                .find(&Predicate::id_in(permission_ids), Order::OldestFirst)
                .await?;
            for permission in granted {
                match permission.permission_key() {
                    Ok(key) => {
                        permissions.insert(key);
                    }
                    Err(e) => log::warn!("skipping permission {}: {e}", permission.id),
                }
            }
        }

        Ok(Principal {
            id: user.principal_id(),
            email: user.email,
            name: user.name,
            roles: roles.into_iter().map(|r| r.name).collect(),
            permissions,
        })
    }
}
