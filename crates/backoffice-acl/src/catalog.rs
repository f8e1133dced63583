//! The permission catalog.
//!
//! A permission is a `(resource, action, scope)` triple. Its key,
//! `"<resource>:<action>:<scope>"`, is the only unit of authorization
//! exchanged between the identity resolver, the scope resolver and the
//! seeded store. [`resolve`] and [`PermissionKey::from_str`] are inverse
//! views of the same tuple.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use backoffice_core::RecordId;
use backoffice_storage::{Entity, Predicate, Repository};

use crate::{Error, Result};

/// Separator between key segments.
pub const KEY_SEPARATOR: char = ':';

/// Resources seeded into the catalog by default.
pub const DEFAULT_RESOURCES: &[&str] = &["dashboard", "users", "roles", "calculate", "settings"];

// ============================================================================
// Action / Scope
// ============================================================================

/// What a permission allows doing to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// List or fetch.
    Read,
    /// Create new records.
    Create,
    /// Modify existing records.
    Update,
    /// Remove records.
    Delete,
    /// Administrative control over the resource.
    Manage,
}

impl Action {
    /// Every action, in catalog order.
    pub const ALL: [Action; 5] = [
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Manage,
    ];

    /// The key segment for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Manage => "manage",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| Error::InvalidPermissionKey(s.to_string()))
    }
}

/// Which records a grant reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every record of the resource.
    Any,
    /// Only records owned by the caller.
    Own,
}

impl Scope {
    /// Both scopes, broadest first.
    pub const ALL: [Scope; 2] = [Scope::Any, Scope::Own];

    /// The key segment for this scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Any => "any",
            Scope::Own => "own",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "any" => Ok(Scope::Any),
            "own" => Ok(Scope::Own),
            other => Err(Error::InvalidPermissionKey(other.to_string())),
        }
    }
}

/// Check that `resource` can be used as a key segment.
pub fn validate_resource(resource: &str) -> Result<()> {
    if resource.is_empty()
        || resource.contains(KEY_SEPARATOR)
        || resource.chars().any(char::is_whitespace)
    {
        return Err(Error::InvalidResource(resource.to_string()));
    }
    Ok(())
}

// ============================================================================
// BasePermission
// ============================================================================

/// A `resource:action` pair; the authorization anchor of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasePermission {
    resource: String,
    action: Action,
}

impl BasePermission {
    /// Anchor for `action` on `resource`.
    pub fn new(resource: impl Into<String>, action: Action) -> Self {
        Self {
            resource: resource.into(),
            action,
        }
    }

    /// The resource segment.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The action segment.
    pub fn action(&self) -> Action {
        self.action
    }

    /// The full key for this anchor at `scope`.
    pub fn with_scope(&self, scope: Scope) -> PermissionKey {
        PermissionKey {
            resource: self.resource.clone(),
            action: self.action,
            scope,
        }
    }
}

impl fmt::Display for BasePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.resource, self.action)
    }
}

impl FromStr for BasePermission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidPermissionKey(s.to_string());
        let (resource, action) = s.split_once(KEY_SEPARATOR).ok_or_else(invalid)?;
        validate_resource(resource).map_err(|_| invalid())?;
        Ok(Self::new(resource, action.parse().map_err(|_| invalid())?))
    }
}

// ============================================================================
// PermissionKey
// ============================================================================

/// A `resource:action:scope` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey {
    resource: String,
    action: Action,
    scope: Scope,
}

/// Build the key for a tuple. The catalog's forward mapping.
pub fn resolve(resource: &str, action: Action, scope: Scope) -> Result<PermissionKey> {
    PermissionKey::new(resource, action, scope)
}

impl PermissionKey {
    /// Key for `(resource, action, scope)`; rejects unusable resource names.
    pub fn new(resource: &str, action: Action, scope: Scope) -> Result<Self> {
        validate_resource(resource)?;
        Ok(Self {
            resource: resource.to_string(),
            action,
            scope,
        })
    }

    /// The resource segment.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The action segment.
    pub fn action(&self) -> Action {
        self.action
    }

    /// The scope segment.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// The key without its scope.
    pub fn base(&self) -> BasePermission {
        BasePermission::new(self.resource.clone(), self.action)
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
            self.resource, self.action, self.scope
        )
    }
}

impl FromStr for PermissionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidPermissionKey(s.to_string());
        let mut parts = s.split(KEY_SEPARATOR);
        let (Some(resource), Some(action), Some(scope), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        Self::new(
            resource,
            action.parse().map_err(|_| invalid())?,
            scope.parse().map_err(|_| invalid())?,
        )
        .map_err(|_| invalid())
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PermissionKey> for String {
    fn from(key: PermissionKey) -> Self {
        key.to_string()
    }
}

/// Every key of the cross product `resources × actions × scopes`.
pub fn catalog_keys(resources: &[&str]) -> Result<Vec<PermissionKey>> {
    let mut keys = Vec::with_capacity(resources.len() * Action::ALL.len() * Scope::ALL.len());
    for resource in resources {
        for action in Action::ALL {
            for scope in Scope::ALL {
                keys.push(resolve(resource, action, scope)?);
            }
        }
    }
    Ok(keys)
}

// ============================================================================
// Permission record
// ============================================================================

/// A stored catalog entry.
///
/// `key` is derived from the tuple whenever the record is built or merged,
/// so the two views can never diverge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Permission {
    /// Record identifier.
    pub id: RecordId,
    /// Resource category, e.g. "users".
    pub resource: String,
    /// Granted action.
    pub action: Action,
    /// Granted scope.
    pub scope: Scope,
    /// Derived `resource:action:scope` key.
    #[serde(default)]
    pub key: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// The typed key of this permission.
    pub fn permission_key(&self) -> Result<PermissionKey> {
        PermissionKey::new(&self.resource, self.action, self.scope)
    }
}

impl Entity for Permission {
    const KIND: &'static str = "Permission";
    const UNIQUE: &'static [&'static str] = &["key"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn normalize(&mut self) {
        self.key = format!(
            "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
            self.resource, self.action, self.scope
        );
    }
}

/// Outcome of a catalog seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Entries inserted by this run.
    pub created: usize,
    /// Entries that were already present.
    pub existing: usize,
}

/// Populate the catalog with every key for `resources`.
///
/// Idempotent: entries are looked up by key first and only missing ones are
/// inserted, so the run is safe against a partially populated store. An
/// insert that loses a race to a concurrent seeder counts as existing.
pub async fn seed_catalog(
    repo: &dyn Repository<Permission>,
    resources: &[&str],
) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for key in catalog_keys(resources)? {
        let lookup = Predicate::eq("key", key.to_string());
        if repo.find_one(&lookup).await?.is_some() {
            report.existing += 1;
            continue;
        }

        let mut fields = Map::new();
        fields.insert("resource".into(), Value::String(key.resource().to_string()));
        fields.insert("action".into(), Value::String(key.action().to_string()));
        fields.insert("scope".into(), Value::String(key.scope().to_string()));
        fields.insert(
            "description".into(),
            Value::String(format!(
                "Allow to {} {} ({})",
                key.action(),
                key.resource(),
                key.scope()
            )),
        );

        let permission = repo.create(fields)?;
        match repo.save(permission).await {
            Ok(_) => report.created += 1,
            Err(backoffice_storage::Error::Conflict { .. }) => report.existing += 1,
            Err(e) => return Err(e.into()),
        }
    }

    log::info!(
        "permission catalog seeded: {} created, {} already present",
        report.created,
        report.existing
    );
    Ok(report)
}
