//! Resource descriptions consumed by the handler factory.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use backoffice_acl::{Action, BasePermission, Principal, Scope};
use backoffice_core::RecordId;
use backoffice_storage::{Entity, Patch, Predicate, Repository};

use crate::{ApiError, Result};

/// How records of a resource relate to principals.
///
/// Every resource states this explicitly; there is no inferred default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The named field references the owning principal.
    Relation(&'static str),
    /// Each record is a principal; its own id is compared to the caller's.
    SelfIdentified,
    /// Records belong to nobody; an `own` grant reaches none of them.
    Unowned,
}

/// The five operations the factory produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// List all visible records.
    List,
    /// Insert a record.
    Create,
    /// Fetch one record.
    Get,
    /// Modify one record.
    Update,
    /// Remove one record.
    Delete,
}

impl Operation {
    /// The catalog action this operation is authorized against.
    pub fn action(&self) -> Action {
        match self {
            Operation::List | Operation::Get => Action::Read,
            Operation::Create => Action::Create,
            Operation::Update => Action::Update,
            Operation::Delete => Action::Delete,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

/// What a pre-save transform can see.
pub struct SaveContext<'a, T> {
    /// The caller.
    pub caller: &'a Principal,
    /// The caller's effective scope for this operation.
    pub scope: Scope,
    /// The stored record on update; `None` on create.
    pub existing: Option<&'a T>,
}

impl<T> SaveContext<'_, T> {
    /// Whether this save creates a new record.
    pub fn is_create(&self) -> bool {
        self.existing.is_none()
    }
}

/// Resource-specific payload transform run before every save.
pub type PreSave<T> = Arc<dyn Fn(&mut Patch, &SaveContext<'_, T>) -> Result<()> + Send + Sync>;

/// Output transform applied to every record before it is returned.
pub type Sanitizer = Arc<dyn Fn(&mut Value) + Send + Sync>;

/// Asynchronous save step, run after the [`PreSave`] transform.
///
/// For work that needs another store or the blocking pool. `existing` is the
/// stored record on update and `None` on create.
#[async_trait]
pub trait SaveStep<T: Sync>: Send + Sync {
    /// Check or rewrite `payload`; fail to refuse the save.
    async fn apply(&self, payload: &mut Patch, existing: Option<&T>) -> Result<()>;
}

/// Veto on deleting a record, checked after authorization.
#[async_trait]
pub trait DeleteGuard: Send + Sync {
    /// Fail to refuse the delete of `id`.
    async fn check(&self, id: RecordId) -> Result<()>;
}

/// Serializes the writes of resources whose checks read each other's stores.
///
/// A guard or reference check and the write it protects run while the lock
/// is held, so no write of a sibling resource can land in between.
pub type WriteLock = Arc<Mutex<()>>;

/// Requires every id in the list field `field` to name a stored `R`.
pub struct References<R: Entity> {
    field: &'static str,
    target: Arc<dyn Repository<R>>,
}

impl<R: Entity> References<R> {
    /// Check `field` against the records of `target`.
    pub fn new(field: &'static str, target: Arc<dyn Repository<R>>) -> Self {
        Self { field, target }
    }
}

#[async_trait]
impl<T: Entity, R: Entity> SaveStep<T> for References<R> {
    async fn apply(&self, payload: &mut Patch, _existing: Option<&T>) -> Result<()> {
        let field = self.field;
        let ids = match payload.get(field) {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .and_then(|s| s.parse::<RecordId>().ok())
                        .ok_or_else(|| {
                            ApiError::validation(format!("{field} contains an invalid id: {item}"))
                        })
                })
                .collect::<Result<BTreeSet<_>>>()?,
            Some(_) => return Err(ApiError::validation(format!("{field} must be a list of ids"))),
        };
        if ids.is_empty() {
            return Ok(());
        }

        let found = self.target.count(&Predicate::id_in(ids.iter().copied())).await?;
        if found != ids.len() {
            log::debug!("{field} names {} unknown {} id(s)", ids.len() - found, R::KIND);
            return Err(ApiError::validation(format!(
                "{field} references {} unknown {} record(s)",
                ids.len() - found,
                R::KIND
            )));
        }
        Ok(())
    }
}

/// Everything the factory needs to know about one resource type.
pub struct ResourceSpec<T: Entity> {
    pub(crate) name: &'static str,
    pub(crate) ownership: Ownership,
    read: Option<BasePermission>,
    create: Option<BasePermission>,
    update: Option<BasePermission>,
    delete: Option<BasePermission>,
    pub(crate) pre_save: Option<PreSave<T>>,
    pub(crate) sanitize: Option<Sanitizer>,
    pub(crate) save_steps: Vec<Arc<dyn SaveStep<T>>>,
    pub(crate) delete_guard: Option<Arc<dyn DeleteGuard>>,
    pub(crate) write_lock: Option<WriteLock>,
}

impl<T: Entity> ResourceSpec<T> {
    /// A resource mounted at `/{name}` with no permission requirements yet.
    pub fn new(name: &'static str, ownership: Ownership) -> Self {
        Self {
            name,
            ownership,
            read: None,
            create: None,
            update: None,
            delete: None,
            pre_save: None,
            sanitize: None,
            save_steps: Vec::new(),
            delete_guard: None,
            write_lock: None,
        }
    }

    /// Require `<resource>:read|create|update|delete` for the matching operations.
    pub fn with_crud_permissions(mut self, resource: &str) -> Self {
        self.read = Some(BasePermission::new(resource, Action::Read));
        self.create = Some(BasePermission::new(resource, Action::Create));
        self.update = Some(BasePermission::new(resource, Action::Update));
        self.delete = Some(BasePermission::new(resource, Action::Delete));
        self
    }

    /// Require `base` for `operation` (list and get share the read slot).
    pub fn with_permission(mut self, operation: Operation, base: BasePermission) -> Self {
        *self.slot(operation) = Some(base);
        self
    }

    /// Run `f` on the payload before create and update.
    pub fn with_pre_save<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Patch, &SaveContext<'_, T>) -> Result<()> + Send + Sync + 'static,
    {
        self.pre_save = Some(Arc::new(f));
        self
    }

    /// Run `f` on every record before it leaves the handler.
    pub fn with_sanitizer<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Value) + Send + Sync + 'static,
    {
        self.sanitize = Some(Arc::new(f));
        self
    }

    /// Append an asynchronous step run after the pre-save transform.
    pub fn with_save_step(mut self, step: Arc<dyn SaveStep<T>>) -> Self {
        self.save_steps.push(step);
        self
    }

    /// Consult `guard` before deleting.
    pub fn with_delete_guard(mut self, guard: Arc<dyn DeleteGuard>) -> Self {
        self.delete_guard = Some(guard);
        self
    }

    /// Hold `lock` across every create, update and delete.
    pub fn with_write_lock(mut self, lock: WriteLock) -> Self {
        self.write_lock = Some(lock);
        self
    }

    /// Mount point name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared ownership.
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Base permission required by `operation`, if any.
    pub fn permission(&self, operation: Operation) -> Option<&BasePermission> {
        match operation {
            Operation::List | Operation::Get => self.read.as_ref(),
            Operation::Create => self.create.as_ref(),
            Operation::Update => self.update.as_ref(),
            Operation::Delete => self.delete.as_ref(),
        }
    }

    fn slot(&mut self, operation: Operation) -> &mut Option<BasePermission> {
        match operation {
            Operation::List | Operation::Get => &mut self.read,
            Operation::Create => &mut self.create,
            Operation::Update => &mut self.update,
            Operation::Delete => &mut self.delete,
        }
    }
}
