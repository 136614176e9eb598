//! In-memory batch registry.
//!
//! Batches live only in process memory while they run; terminal items
//! are mirrored into the durable job store by the pipeline.

use std::collections::HashMap;

use promo_models::{Batch, BatchId};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct BatchRegistry {
    inner: RwLock<HashMap<String, Batch>>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, batch: Batch) {
        let mut inner = self.inner.write().await;
        inner.insert(batch.batch_id.as_str().to_string(), batch);
    }

    pub async fn get(&self, id: &BatchId) -> Option<Batch> {
        let inner = self.inner.read().await;
        inner.get(id.as_str()).cloned()
    }

    /// Mutate a batch in place. Returns the updated snapshot, or `None`
    /// if the batch is unknown.
    pub async fn update<F>(&self, id: &BatchId, f: F) -> Option<Batch>
    where
        F: FnOnce(&mut Batch),
    {
        let mut inner = self.inner.write().await;
        let batch = inner.get_mut(id.as_str())?;
        f(batch);
        Some(batch.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promo_models::{BackendKind, BatchItem, BatchStatus};

    fn sample_batch() -> Batch {
        let items = vec![BatchItem::new("Mug", vec!["sturdy".to_string()])];
        Batch::new(items, BackendKind::Seedance, false, false, "")
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = BatchRegistry::new();
        let batch = sample_batch();
        let id = batch.batch_id.clone();
        registry.insert(batch).await;

        let loaded = registry.get(&id).await.unwrap();
        assert_eq!(loaded.total(), 1);
        assert_eq!(loaded.status, BatchStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_mutates_in_place() {
        let registry = BatchRegistry::new();
        let batch = sample_batch();
        let id = batch.batch_id.clone();
        registry.insert(batch).await;

        let updated = registry
            .update(&id, |b| b.status = BatchStatus::Processing)
            .await
            .unwrap();
        assert_eq!(updated.status, BatchStatus::Processing);
        assert_eq!(registry.get(&id).await.unwrap().status, BatchStatus::Processing);
    }

    #[tokio::test]
    async fn test_unknown_batch() {
        let registry = BatchRegistry::new();
        let id = BatchId::from_string("nope");
        assert!(registry.get(&id).await.is_none());
        assert!(registry.update(&id, |_| {}).await.is_none());
    }
}
