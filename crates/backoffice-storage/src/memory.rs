//! Process-local repository.
//!
//! Records are held behind one `RwLock` per repository, so every `save`
//! and `delete` (including the unique checks and the predicate scan) runs
//! under a single write guard.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::entity::{Entity, to_record_value};
use crate::{DeleteResult, Error, Order, Predicate, Repository, Result};

/// In-memory [`Repository`] for one entity type.
#[derive(Debug)]
pub struct MemoryRepository<T: Entity> {
    records: RwLock<Vec<T>>,
}

impl<T: Entity> MemoryRepository<T> {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Create a repository pre-loaded with `records` (unique checks skipped).
    pub fn with_records(records: Vec<T>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the repository holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_unique(existing: &[T], candidate: &T, candidate_value: &Value) -> Result<()> {
        for field in T::UNIQUE {
            let Some(wanted) = candidate_value.get(*field) else {
                continue;
            };
            for other in existing.iter().filter(|r| r.id() != candidate.id()) {
                if to_record_value(other)?.get(*field) == Some(wanted) {
                    let value = match wanted {
                        Value::String(s) => s.clone(),
                        v => v.to_string(),
                    };
                    return Err(Error::Conflict {
                        kind: T::KIND,
                        field: *field,
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn find(&self, predicate: &Predicate, order: Order) -> Result<Vec<T>> {
        let records = self.records.read().await;
        let mut found = Vec::new();
        for record in records.iter() {
            if predicate.matches(&to_record_value(record)?) {
                found.push(record.clone());
            }
        }
        match order {
            Order::NewestFirst => found.sort_by_key(|r| std::cmp::Reverse(r.created_at())),
            Order::OldestFirst => found.sort_by_key(|r| r.created_at()),
        }
        Ok(found)
    }

    async fn find_one(&self, predicate: &Predicate) -> Result<Option<T>> {
        let records = self.records.read().await;
        for record in records.iter() {
            if predicate.matches(&to_record_value(record)?) {
                return Ok(Some(record.clone()));
            }
        }
        Ok(None)
    }

    async fn save(&self, entity: T) -> Result<T> {
        let value = to_record_value(&entity)?;
        let mut records = self.records.write().await;
        Self::check_unique(&records, &entity, &value)?;

        match records.iter().position(|r| r.id() == entity.id()) {
            Some(index) => records[index] = entity.clone(),
            None => records.push(entity.clone()),
        }
        log::debug!("saved {} {}", T::KIND, entity.id());
        Ok(entity)
    }

    async fn delete(&self, predicate: &Predicate) -> Result<DeleteResult> {
        let mut records = self.records.write().await;
        let mut keep = Vec::with_capacity(records.len());
        for record in records.iter() {
            keep.push(!predicate.matches(&to_record_value(record)?));
        }

        let before = records.len();
        let mut flags = keep.into_iter();
        records.retain(|_| flags.next().unwrap_or(true));
        let affected = before - records.len();

        log::debug!("deleted {affected} {} record(s)", T::KIND);
        Ok(DeleteResult { affected })
    }
}
