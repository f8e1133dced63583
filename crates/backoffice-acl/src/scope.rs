//! Effective scope resolution.
//!
//! Given the permissions a principal holds and the base permission an
//! operation requires, decide whether the principal may act on every record
//! ([`Scope::Any`]), only on its own records ([`Scope::Own`]), or not at all.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{BasePermission, Error, PermissionKey, Result, Scope};

/// The set of permission keys a principal holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet {
    keys: BTreeSet<PermissionKey>,
}

impl PermissionSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key`; returns whether it was new.
    pub fn insert(&mut self, key: PermissionKey) -> bool {
        self.keys.insert(key)
    }

    /// Whether the exact key is held.
    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.keys.contains(key)
    }

    /// Whether `base` is held at `scope`.
    pub fn grants(&self, base: &BasePermission, scope: Scope) -> bool {
        self.contains(&base.with_scope(scope))
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no key is held.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Held keys in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionKey> {
        self.keys.iter()
    }
}

impl FromIterator<PermissionKey> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = PermissionKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl Extend<PermissionKey> for PermissionSet {
    fn extend<I: IntoIterator<Item = PermissionKey>>(&mut self, iter: I) {
        self.keys.extend(iter);
    }
}

/// Resolve the effective scope of `base` for a holder of `permissions`.
///
/// An operation without a base permission is unrestricted and resolves to
/// [`Scope::Any`]. Otherwise `:any` wins over `:own`, and holding neither is
/// [`Error::Forbidden`].
pub fn resolve_scope(permissions: &PermissionSet, base: Option<&BasePermission>) -> Result<Scope> {
    let Some(base) = base else {
        return Ok(Scope::Any);
    };

    if permissions.grants(base, Scope::Any) {
        Ok(Scope::Any)
    } else if permissions.grants(base, Scope::Own) {
        Ok(Scope::Own)
    } else {
        log::debug!("scope check failed for {base}");
        Err(Error::Forbidden {
            missing: base.clone(),
        })
    }
}
