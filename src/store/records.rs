//! Typed record access over the key-value map
//!
//! Each collection lives under one key as a JSON array. Reads fail soft: a
//! missing or corrupt blob is an empty collection, never a fatal error.

use std::sync::Arc;

use chrono::Utc;

use super::KvStore;
use crate::error::Result;
use crate::model::{Collection, SyncStatus, Syncable};

/// Record store collaborator: get/replace per collection, plus the local
/// CRUD helpers the (out-of-scope) UI layer drives.
#[derive(Clone)]
pub struct RecordStore {
    kv: Arc<dyn KvStore>,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn key(collection: Collection) -> String {
        format!("records:{}", collection.name())
    }

    /// All records of one collection, in stored order
    pub async fn get_all<T: Syncable>(&self) -> Result<Vec<T>> {
        let collection = T::schema().collection;
        let Some(raw) = self.kv.get(&Self::key(collection)).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(
                    collection = %collection,
                    error = %e,
                    "Corrupt record blob, treating collection as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Replace a collection wholesale
    pub async fn replace_all<T: Syncable>(&self, records: &[T]) -> Result<()> {
        let collection = T::schema().collection;
        let raw = serde_json::to_string(records)?;
        self.kv.put(&Self::key(collection), &raw).await
    }

    /// Insert or update one record, restamping its modification time and
    /// marking it pending for the next sync cycle.
    pub async fn upsert<T: Syncable>(&self, mut record: T) -> Result<T> {
        record.set_timestamp(Utc::now());
        record.set_sync_status(SyncStatus::Pending);

        let mut records: Vec<T> = self.get_all().await?;
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }

        self.replace_all(&records).await?;
        Ok(record)
    }

    /// Delete one record by id; returns whether anything was removed
    pub async fn remove<T: Syncable>(&self, id: &str) -> Result<bool> {
        let mut records: Vec<T> = self.get_all().await?;
        let before = records.len();
        records.retain(|r| r.id() != id);

        if records.len() == before {
            return Ok(false);
        }

        self.replace_all(&records).await?;
        Ok(true)
    }

    pub async fn count<T: Syncable>(&self) -> Result<usize> {
        Ok(self.get_all::<T>().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Currency, Expense};
    use crate::store::MemoryKvStore;

    fn store() -> RecordStore {
        RecordStore::new(Arc::new(MemoryKvStore::new()))
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let records = store();
        let expenses: Vec<Expense> = records.get_all().await.unwrap();
        assert!(expenses.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let records = store();

        let expense = Expense::new(10.0, Currency::Dzd, "bread", "food", None, "2024-01-01");
        let id = expense.id.clone();
        records.upsert(expense).await.unwrap();
        assert_eq!(records.count::<Expense>().await.unwrap(), 1);

        let mut updated: Vec<Expense> = records.get_all().await.unwrap();
        updated[0].amount = 12.0;
        records.upsert(updated.remove(0)).await.unwrap();

        let all: Vec<Expense> = records.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].amount, 12.0);
        assert_eq!(all[0].sync_status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn test_remove() {
        let records = store();
        let expense = Expense::new(10.0, Currency::Dzd, "bread", "food", None, "2024-01-01");
        let id = expense.id.clone();
        records.upsert(expense).await.unwrap();

        assert!(records.remove::<Expense>(&id).await.unwrap());
        assert!(!records.remove::<Expense>(&id).await.unwrap());
        assert_eq!(records.count::<Expense>().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_blob_reads_as_empty() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.put("records:expenses", "{not json").await.unwrap();

        let records = RecordStore::new(kv);
        let expenses: Vec<Expense> = records.get_all().await.unwrap();
        assert!(expenses.is_empty());
    }
}
