//! Local persistence
//!
//! The engine treats local storage as a generic persistent key-value map:
//! one JSON blob per collection, plus fixed keys for sync checkpoints and
//! backend bookkeeping. `KvStore` is the collaborator boundary; everything
//! above it is typed convenience.

mod checkpoint;
mod records;
mod sqlite;

pub use checkpoint::CheckpointStore;
pub use records::RecordStore;
pub use sqlite::SqliteKvStore;

use async_trait::async_trait;

use crate::error::Result;

/// Durable key-value map collaborator
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store for tests and ephemeral use
#[derive(Default)]
pub struct MemoryKvStore {
    entries: tokio::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
