use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use thiserror::Error;

use super::transaction::TransactionRecord;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The insert collided with a record sharing the same dedup key.
    #[error("Record with the same message and timestamps already exists")]
    Conflict,
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// The narrow persistence boundary the ingest pipeline depends on.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn find_by(
        &self,
        message: &str,
        date: DateTime<Utc>,
        date_sent: DateTime<Utc>,
    ) -> Result<Option<TransactionRecord>, StoreError>;

    /// Inserts a single record atomically.
    async fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError>;
}

/// A `Vec`-backed store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<TransactionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TransactionRecord> {
        self.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<TransactionRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn find_by(
        &self,
        message: &str,
        date: DateTime<Utc>,
        date_sent: DateTime<Utc>,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .find(|r| r.message == message && r.date == date && r.date_sent == date_sent)
            .cloned())
    }

    async fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        if records.iter().any(|r| r.dedup_key() == record.dedup_key()) {
            return Err(StoreError::Conflict);
        }
        records.push(record.clone());
        Ok(())
    }
}
