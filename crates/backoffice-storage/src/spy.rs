//! Call-recording repository wrapper for tests.
//!
//! [`SpyRepository`] forwards every call to an inner repository and keeps
//! the name of each primitive invoked, so a test can assert that a request
//! was rejected before the store was touched.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::entity::{Entity, Patch};
use crate::{DeleteResult, Order, Predicate, Repository, Result};

/// Repository wrapper that records the primitives it is asked to run.
pub struct SpyRepository<T: Entity> {
    inner: Arc<dyn Repository<T>>,
    calls: Mutex<Vec<&'static str>>,
}

impl<T: Entity> SpyRepository<T> {
    /// Wrap `inner`.
    pub fn new(inner: Arc<dyn Repository<T>>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Names of the primitives called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of primitives called so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Forget the recorded calls.
    pub fn reset(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, name: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(name);
        }
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for SpyRepository<T> {
    async fn find(&self, predicate: &Predicate, order: Order) -> Result<Vec<T>> {
        self.record("find");
        self.inner.find(predicate, order).await
    }

    async fn find_one(&self, predicate: &Predicate) -> Result<Option<T>> {
        self.record("find_one");
        self.inner.find_one(predicate).await
    }

    fn create(&self, partial: Patch) -> Result<T> {
        self.record("create");
        self.inner.create(partial)
    }

    fn merge(&self, existing: &T, partial: Patch) -> Result<T> {
        self.record("merge");
        self.inner.merge(existing, partial)
    }

    async fn save(&self, entity: T) -> Result<T> {
        self.record("save");
        self.inner.save(entity).await
    }

    async fn delete(&self, predicate: &Predicate) -> Result<DeleteResult> {
        self.record("delete");
        self.inner.delete(predicate).await
    }

    async fn count(&self, predicate: &Predicate) -> Result<usize> {
        self.record("count");
        self.inner.count(predicate).await
    }
}
