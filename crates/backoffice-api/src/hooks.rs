//! Post-commit mutation hooks.
//!
//! The resource handlers emit a [`MutationEvent`] after every successful
//! create, update or delete. Hooks observe; they never change the outcome of
//! the mutation, and a failing hook is logged and skipped.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use backoffice_acl::IdentityResolver;
use backoffice_core::{PrincipalId, RecordId};

use crate::Result;

/// The kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationAction {
    /// A record was inserted.
    Create,
    /// A record was modified.
    Update,
    /// A record was removed.
    Delete,
}

impl fmt::Display for MutationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MutationAction::Create => "CREATE",
            MutationAction::Update => "UPDATE",
            MutationAction::Delete => "DELETE",
        })
    }
}

/// A committed mutation of a governed entity.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationEvent {
    /// Entity kind, e.g. "Role".
    pub entity_kind: &'static str,
    /// Identifier of the affected record.
    pub entity_id: RecordId,
    /// What happened.
    pub action: MutationAction,
    /// Who did it, when known.
    pub actor: Option<PrincipalId>,
    /// Optional structured detail (e.g. changed field names).
    pub detail: Option<Value>,
}

impl MutationEvent {
    /// Event without detail.
    pub fn new(
        entity_kind: &'static str,
        entity_id: RecordId,
        action: MutationAction,
        actor: Option<PrincipalId>,
    ) -> Self {
        Self {
            entity_kind,
            entity_id,
            action,
            actor,
            detail: None,
        }
    }

    /// Attach detail.
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Observer of committed mutations.
#[async_trait]
pub trait MutationHook: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &'static str;

    /// React to `event`. Errors are logged by the caller, never propagated.
    async fn after_commit(&self, event: &MutationEvent) -> Result<()>;
}

/// An ordered list of hooks, run one after another.
#[derive(Clone, Default)]
pub struct HookSet {
    hooks: Arc<Vec<Arc<dyn MutationHook>>>,
}

impl HookSet {
    /// Hooks run in the given order.
    pub fn new(hooks: Vec<Arc<dyn MutationHook>>) -> Self {
        Self {
            hooks: Arc::new(hooks),
        }
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook for `event`. Failures are logged and skipped.
    pub async fn dispatch(&self, event: MutationEvent) {
        for hook in self.hooks.iter() {
            if let Err(e) = hook.after_commit(&event).await {
                log::warn!(
                    "{} hook failed for {} {} {}: {e}",
                    hook.name(),
                    event.action,
                    event.entity_kind,
                    event.entity_id
                );
            }
        }
    }
}

/// Drops cached permission sets when principals, roles or permissions change.
pub struct CacheInvalidator {
    identity: Arc<IdentityResolver>,
}

impl CacheInvalidator {
    /// Invalidate entries of `identity`'s cache.
    pub fn new(identity: Arc<IdentityResolver>) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl MutationHook for CacheInvalidator {
    fn name(&self) -> &'static str {
        "permission-cache"
    }

    async fn after_commit(&self, event: &MutationEvent) -> Result<()> {
        match event.entity_kind {
            "User" => {
                self.identity
                    .cache()
                    .invalidate(&PrincipalId::from(event.entity_id));
            }
            "Role" | "Permission" => {
                log::debug!(
                    "{} {} changed; clearing permission cache",
                    event.entity_kind,
                    event.entity_id
                );
                self.identity.cache().clear();
            }
            _ => {}
        }
        Ok(())
    }
}
