//! Sync checkpoint persistence
//!
//! The checkpoint is the engine's only durable memory of prior state: per
//! record id, the fingerprint observed at the end of the last successful
//! sync. It is written as a complete snapshot after every merge — never
//! patched — and loading degrades to an empty map on any failure, which
//! drops the next cycle back to pure timestamp-based resolution.

use std::collections::HashMap;
use std::sync::Arc;

use super::KvStore;
use crate::error::Result;
use crate::model::Collection;

const COLLECTIONS: [Collection; 3] = [
    Collection::Expenses,
    Collection::Loans,
    Collection::Categories,
];

#[derive(Clone)]
pub struct CheckpointStore {
    kv: Arc<dyn KvStore>,
}

impl CheckpointStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn key(collection: Collection) -> String {
        format!("sync_checkpoint:{}", collection.name())
    }

    /// Last-known fingerprints for one collection. Missing, unreadable or
    /// corrupt checkpoints all read as empty.
    pub async fn load(&self, collection: Collection) -> HashMap<String, String> {
        let raw = match self.kv.get(&Self::key(collection)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return HashMap::new(),
            Err(e) => {
                tracing::warn!(collection = %collection, error = %e, "Checkpoint unreadable");
                return HashMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(collection = %collection, error = %e, "Checkpoint corrupt, resetting");
                HashMap::new()
            }
        }
    }

    /// Replace the whole snapshot for one collection
    pub async fn save(&self, collection: Collection, checkpoint: &HashMap<String, String>) -> Result<()> {
        let raw = serde_json::to_string(checkpoint)?;
        self.kv.put(&Self::key(collection), &raw).await
    }

    /// Recovery tool: forget everything we knew about prior syncs
    pub async fn clear_all(&self) -> Result<()> {
        for collection in COLLECTIONS {
            self.kv.remove(&Self::key(collection)).await?;
        }
        tracing::info!("Sync checkpoints cleared");
        Ok(())
    }
}
