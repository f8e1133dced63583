//! The generic resource handler factory.
//!
//! [`ResourceHandlers`] turns a [`ResourceSpec`] and a repository into the
//! five scoped operations. Every operation authorizes first and only then
//! touches the repository:
//!
//! 1. resolve the effective scope for the operation's base permission
//! 2. turn the scope into a filter ([`Grant`]) using the declared ownership
//! 3. run the repository call under that filter
//!
//! Single-record operations conjoin the filter with the target id, so a
//! record outside the caller's scope is indistinguishable from a missing one.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::Path;
use axum::routing::get;
use axum::{Router, extract::FromRef};
use http::StatusCode;
use serde_json::{Value, json};
use tokio::sync::MutexGuard;

use backoffice_acl::{BasePermission, IdentityResolver, Principal, Scope, resolve_scope};
use backoffice_core::RecordId;
use backoffice_storage::entity::strip_protected;
use backoffice_storage::{Entity, Order, Patch, Predicate, Repository};

use crate::extract::Caller;
use crate::hooks::{HookSet, MutationAction, MutationEvent};
use crate::resource::{Operation, Ownership, ResourceSpec, SaveContext};
use crate::{ApiError, Result};

/// An authorized operation: the effective scope and the record filter it implies.
#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    scope: Scope,
    filter: Predicate,
}

impl Grant {
    /// Effective scope.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Filter every repository call must respect.
    pub fn filter(&self) -> &Predicate {
        &self.filter
    }

    fn for_record(&self, id: RecordId) -> Predicate {
        self.filter.clone().and(Predicate::id(id))
    }
}

/// Scoped list/create/get/update/delete over one repository.
pub struct ResourceHandlers<T: Entity> {
    spec: ResourceSpec<T>,
    repo: Arc<dyn Repository<T>>,
    hooks: HookSet,
}

impl<T: Entity> ResourceHandlers<T> {
    /// Handlers for `spec` backed by `repo`, emitting events to `hooks`.
    pub fn new(spec: ResourceSpec<T>, repo: Arc<dyn Repository<T>>, hooks: HookSet) -> Self {
        Self { spec, repo, hooks }
    }

    /// The resource description.
    pub fn spec(&self) -> &ResourceSpec<T> {
        &self.spec
    }

    /// Decide whether `caller` may run `operation`, and on which records.
    ///
    /// Never touches the repository.
    pub fn authorize(&self, caller: &Principal, operation: Operation) -> Result<Grant> {
        let base = self.spec.permission(operation);
        let scope = resolve_scope(&caller.permissions, base).map_err(|e| {
            log::warn!(
                "{} denied {operation} on {}: {e}",
                caller.id,
                self.spec.name
            );
            ApiError::from(e)
        })?;

        let filter = match (scope, self.spec.ownership) {
            (Scope::Any, _) => Predicate::All,
            (Scope::Own, Ownership::Relation(field)) => Predicate::owned_by(field, caller.id),
            (Scope::Own, Ownership::SelfIdentified) if operation != Operation::Create => {
                Predicate::id(caller.id.into())
            }
            // Creating another principal, or owning an unowned record, needs `:any`.
            (Scope::Own, Ownership::SelfIdentified | Ownership::Unowned) => {
                return Err(self.require_any(caller, operation, base));
            }
        };

        Ok(Grant { scope, filter })
    }

    /// List every record visible to `caller`, newest first.
    pub async fn list(&self, caller: &Principal) -> Result<Vec<Value>> {
        let grant = self.authorize(caller, Operation::List)?;
        self.list_in(&grant).await
    }

    /// Create a record owned by `caller` from `payload`.
    pub async fn create(&self, caller: &Principal, payload: Patch) -> Result<Value> {
        let grant = self.authorize(caller, Operation::Create)?;
        self.create_in(caller, &grant, payload).await
    }

    /// Fetch record `id` if it is visible to `caller`.
    pub async fn get(&self, caller: &Principal, id: &str) -> Result<Value> {
        let grant = self.authorize(caller, Operation::Get)?;
        self.get_in(&grant, id).await
    }

    /// Apply `payload` to record `id` if it is visible to `caller`.
    pub async fn update(&self, caller: &Principal, id: &str, payload: Patch) -> Result<Value> {
        let grant = self.authorize(caller, Operation::Update)?;
        self.update_in(caller, &grant, id, payload).await
    }

    /// Delete record `id` if it is visible to `caller`.
    pub async fn delete(&self, caller: &Principal, id: &str) -> Result<Value> {
        let grant = self.authorize(caller, Operation::Delete)?;
        self.delete_in(caller, &grant, id).await
    }

    async fn list_in(&self, grant: &Grant) -> Result<Vec<Value>> {
        let records = self.repo.find(&grant.filter, Order::NewestFirst).await?;
        records.iter().map(|r| self.render(r)).collect()
    }

    async fn create_in(&self, caller: &Principal, grant: &Grant, mut payload: Patch) -> Result<Value> {
        let _serial = self.serialize_writes().await;
        self.prepare(&mut payload, caller, grant.scope, None).await?;

        let record = self.repo.create(payload)?;
        let saved = self.repo.save(record).await?;
        log::info!("{} created {} {}", caller.id, T::KIND, saved.id());

        self.hooks
            .dispatch(MutationEvent::new(
                T::KIND,
                saved.id(),
                MutationAction::Create,
                Some(caller.id),
            ))
            .await;
        self.render(&saved)
    }

    async fn get_in(&self, grant: &Grant, id: &str) -> Result<Value> {
        let id = parse_id(id)?;
        let record = self
            .repo
            .find_one(&grant.for_record(id))
            .await?
            .ok_or(ApiError::NotFound)?;
        self.render(&record)
    }

    async fn update_in(
        &self,
        caller: &Principal,
        grant: &Grant,
        id: &str,
        mut payload: Patch,
    ) -> Result<Value> {
        let id = parse_id(id)?;
        let _serial = self.serialize_writes().await;
        let existing = self
            .repo
            .find_one(&grant.for_record(id))
            .await?
            .ok_or(ApiError::NotFound)?;

        self.prepare(&mut payload, caller, grant.scope, Some(&existing))
            .await?;

        let changed: Vec<String> = payload.keys().cloned().collect();
        let merged = self.repo.merge(&existing, payload)?;
        let saved = self.repo.save(merged).await?;
        log::info!("{} updated {} {}", caller.id, T::KIND, saved.id());

        self.hooks
            .dispatch(
                MutationEvent::new(
                    T::KIND,
                    saved.id(),
                    MutationAction::Update,
                    Some(caller.id),
                )
                .with_detail(json!({ "fields": changed })),
            )
            .await;
        self.render(&saved)
    }

    async fn delete_in(&self, caller: &Principal, grant: &Grant, id: &str) -> Result<Value> {
        let id = parse_id(id)?;
        let _serial = self.serialize_writes().await;
        if let Some(guard) = &self.spec.delete_guard {
            guard.check(id).await?;
        }

        let result = self.repo.delete(&grant.for_record(id)).await?;
        if result.affected == 0 {
            return Err(ApiError::NotFound);
        }
        log::info!("{} deleted {} {id}", caller.id, T::KIND);

        self.hooks
            .dispatch(MutationEvent::new(
                T::KIND,
                id,
                MutationAction::Delete,
                Some(caller.id),
            ))
            .await;
        Ok(json!({ "id": id }))
    }

    /// Run the resource's save pipeline over a client payload.
    ///
    /// Protected fields and the ownership relation are fixed again after the
    /// resource's own steps.
    async fn prepare(
        &self,
        payload: &mut Patch,
        caller: &Principal,
        scope: Scope,
        existing: Option<&T>,
    ) -> Result<()> {
        let creating = existing.is_none();
        strip_protected(payload);
        self.assign_owner(payload, caller, scope, creating);

        if let Some(pre_save) = &self.spec.pre_save {
            let ctx = SaveContext {
                caller,
                scope,
                existing,
            };
            pre_save(payload, &ctx)?;
        }
        for step in &self.spec.save_steps {
            step.apply(payload, existing).await?;
        }

        strip_protected(payload);
        self.assign_owner(payload, caller, scope, creating);
        Ok(())
    }

    /// Take the resource's write lock, if it shares one.
    async fn serialize_writes(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.spec.write_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }

    /// Fix the ownership relation of `payload`.
    ///
    /// On create, and on update under `own` scope, the relation is set to the
    /// caller. On update under `any` scope a client-supplied value is dropped,
    /// so the stored owner is kept.
    fn assign_owner(&self, payload: &mut Patch, caller: &Principal, scope: Scope, creating: bool) {
        if let Ownership::Relation(field) = self.spec.ownership {
            if creating || scope == Scope::Own {
                payload.insert(field.to_string(), Value::String(caller.id.to_string()));
            } else {
                payload.remove(field);
            }
        }
    }

    fn require_any(
        &self,
        caller: &Principal,
        operation: Operation,
        base: Option<&BasePermission>,
    ) -> ApiError {
        let missing = base
            .map(|b| b.with_scope(Scope::Any).to_string())
            .unwrap_or_else(|| format!("{}:{}:any", self.spec.name, operation.action()));
        log::warn!(
            "{} denied {operation} on {}: own scope does not apply, needs {missing}",
            caller.id,
            self.spec.name
        );
        ApiError::Forbidden(format!("missing permission {missing}"))
    }

    fn render(&self, record: &T) -> Result<Value> {
        let mut value = serde_json::to_value(record).map_err(ApiError::internal)?;
        if let Some(sanitize) = &self.spec.sanitize {
            sanitize(&mut value);
        }
        Ok(value)
    }
}

/// Path ids that are not UUIDs name no record.
fn parse_id(id: &str) -> Result<RecordId> {
    id.parse().map_err(|_| ApiError::NotFound)
}

/// Parse a request body into a JSON object payload.
pub fn parse_payload(body: &[u8]) -> Result<Patch> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::validation("request body is required"));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ApiError::validation("request body must be a JSON object")),
        Err(e) => Err(ApiError::validation(format!("malformed JSON: {e}"))),
    }
}

impl<T: Entity> ResourceHandlers<T> {
    /// Routes `GET|POST /{name}` and `GET|PUT|DELETE /{name}/{id}`.
    ///
    /// Request bodies are parsed only after the caller is authorized.
    pub fn routes<S>(self: Arc<Self>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
        Arc<IdentityResolver>: FromRef<S>,
    {
        let collection = format!("/{}", self.spec.name);
        let item = format!("/{}/{{id}}", self.spec.name);

        let list = self.clone();
        let create = self.clone();
        let fetch = self.clone();
        let update = self.clone();
        let delete = self;

        Router::new()
            .route(
                &collection,
                get(move |Caller(caller): Caller| {
                    let h = list.clone();
                    async move {
                        let data = h.list(&caller).await?;
                        Ok::<_, ApiError>(Json(json!({ "data": data })))
                    }
                })
                .post(move |Caller(caller): Caller, body: Bytes| {
                    let h = create.clone();
                    async move {
                        let grant = h.authorize(&caller, Operation::Create)?;
                        let payload = parse_payload(&body)?;
                        let data = h.create_in(&caller, &grant, payload).await?;
                        Ok::<_, ApiError>((
                            StatusCode::CREATED,
                            Json(json!({ "message": "Created", "data": data })),
                        ))
                    }
                }),
            )
            .route(
                &item,
                get(move |Caller(caller): Caller, Path(id): Path<String>| {
                    let h = fetch.clone();
                    async move {
                        let data = h.get(&caller, &id).await?;
                        Ok::<_, ApiError>(Json(json!({ "data": data })))
                    }
                })
                .put(
                    move |Caller(caller): Caller, Path(id): Path<String>, body: Bytes| {
                        let h = update.clone();
                        async move {
                            let grant = h.authorize(&caller, Operation::Update)?;
                            let payload = parse_payload(&body)?;
                            let data = h.update_in(&caller, &grant, &id, payload).await?;
                            Ok::<_, ApiError>(Json(json!({ "data": data })))
                        }
                    },
                )
                .delete(move |Caller(caller): Caller, Path(id): Path<String>| {
                    let h = delete.clone();
                    async move {
                        let data = h.delete(&caller, &id).await?;
                        Ok::<_, ApiError>(Json(json!({ "data": data })))
                    }
                }),
            )
    }
}
