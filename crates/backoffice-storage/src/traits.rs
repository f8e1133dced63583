//! The repository contract consumed by the access layer.

use async_trait::async_trait;

use crate::entity::{Entity, Patch, hydrate, merge_into};
use crate::{Order, Predicate, Result};

/// Outcome of a predicate-constrained delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    /// Number of records removed.
    pub affected: usize,
}

/// One repository per entity type.
///
/// `create` and `merge` only build values in memory; nothing is persisted
/// until `save`. Each `save` and `delete` is atomic on its own; the access
/// layer never spans several of them in one transaction.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// All records matching `predicate`, in `order`.
    async fn find(&self, predicate: &Predicate, order: Order) -> Result<Vec<T>>;

    /// The first record matching `predicate`, if any.
    async fn find_one(&self, predicate: &Predicate) -> Result<Option<T>>;

    /// Build a new record from a creation payload without persisting it.
    fn create(&self, partial: Patch) -> Result<T> {
        hydrate(partial)
    }

    /// Overlay an update payload on `existing` without persisting it.
    fn merge(&self, existing: &T, partial: Patch) -> Result<T> {
        merge_into(existing, partial)
    }

    /// Insert or replace `entity` (keyed by its identifier).
    async fn save(&self, entity: T) -> Result<T>;

    /// Remove every record matching `predicate` in one step.
    async fn delete(&self, predicate: &Predicate) -> Result<DeleteResult>;

    /// Number of records matching `predicate`.
    async fn count(&self, predicate: &Predicate) -> Result<usize> {
        Ok(self.find(predicate, Order::default()).await?.len())
    }
}
