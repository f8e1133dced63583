//! The audit recorder.
//!
//! Appends one [`AuditRecord`] per committed mutation of a designated entity
//! kind. Records are write-once; nothing in this crate updates or deletes
//! them.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use backoffice_core::{PrincipalId, RecordId};
use backoffice_storage::{Entity, Repository};

use crate::Result;
use crate::hooks::{MutationAction, MutationEvent, MutationHook};

/// One change-log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    /// Record identifier.
    pub id: RecordId,
    /// Kind of the mutated entity.
    pub entity_name: String,
    /// Identifier of the mutated entity.
    pub entity_id: RecordId,
    /// What happened.
    pub action: MutationAction,
    /// Optional structured detail.
    #[serde(default)]
    pub detail: Option<Value>,
    /// Acting principal, when known.
    #[serde(default)]
    pub actor_id: Option<PrincipalId>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
    /// Equal to `created_at`.
    pub updated_at: DateTime<Utc>,
}

impl Entity for AuditRecord {
    const KIND: &'static str = "AuditRecord";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Mutation hook writing [`AuditRecord`]s.
pub struct AuditRecorder {
    repo: Arc<dyn Repository<AuditRecord>>,
    entities: HashSet<String>,
}

impl AuditRecorder {
    /// Record mutations of the given entity kinds into `repo`.
    pub fn new<I, S>(repo: Arc<dyn Repository<AuditRecord>>, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repo,
            entities: entities.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether mutations of `kind` are recorded.
    pub fn observes(&self, kind: &str) -> bool {
        self.entities.contains(kind)
    }
}

#[async_trait]
impl MutationHook for AuditRecorder {
    fn name(&self) -> &'static str {
        "audit"
    }

    async fn after_commit(&self, event: &MutationEvent) -> Result<()> {
        if !self.observes(event.entity_kind) {
            return Ok(());
        }

        let mut fields = Map::new();
        fields.insert("entity_name".into(), Value::String(event.entity_kind.to_string()));
        fields.insert("entity_id".into(), Value::String(event.entity_id.to_string()));
        fields.insert("action".into(), Value::String(event.action.to_string()));
        if let Some(detail) = &event.detail {
            fields.insert("detail".into(), detail.clone());
        }
        if let Some(actor) = event.actor {
            fields.insert("actor_id".into(), Value::String(actor.to_string()));
        }

        let record = self.repo.create(fields)?;
        self.repo.save(record).await?;
        log::debug!(
            "audit: {} {} {}",
            event.action,
            event.entity_kind,
            event.entity_id
        );
        Ok(())
    }
}
