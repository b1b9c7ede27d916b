use async_trait::async_trait;
use chrono::{DateTime, Utc};
use momo_core::{StoreError, TransactionRecord, TransactionStore};
use tracing::debug;

use crate::db::{format_timestamp, DbPool, StorageError, TransactionRow, RECORD_COLUMNS};

/// SQLite-backed [`TransactionStore`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn find_by(
        &self,
        message: &str,
        date: DateTime<Utc>,
        date_sent: DateTime<Utc>,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM transactions WHERE message = ? AND date = ? AND date_sent = ?"
        ))
        .bind(message)
        .bind(format_timestamp(date))
        .bind(format_timestamp(date_sent))
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(TransactionRecord::try_from)
            .transpose()
            .map_err(backend)
    }

    async fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO transactions (id, address, message, service_center, amount_cents, category, transaction_type, counterparty, date, date_sent) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.address)
        .bind(&record.message)
        .bind(&record.service_center)
        .bind(record.amount.map(|a| a.to_cents()))
        .bind(record.category.label())
        .bind(record.transaction_type.label())
        .bind(&record.counterparty)
        .bind(format_timestamp(record.date))
        .bind(format_timestamp(record.date_sent))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(id = %record.id, "Inserted transaction");
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Conflict),
            Err(e) => Err(backend(StorageError::from(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_db;
    use chrono::TimeZone;
    use momo_core::{Amount, Category, TransactionType};
    use uuid::Uuid;

    async fn store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("momo.db")).await.unwrap();
        (dir, SqliteStore::new(pool))
    }

    fn record() -> TransactionRecord {
        TransactionRecord {
            id: Uuid::new_v4(),
            address: "M-Money".to_string(),
            message: "You have received 2,000 RWF from Jane Smith (*********013)".to_string(),
            service_center: Some("+250788110381".to_string()),
            amount: Some(Amount::from_units(2000)),
            category: Category::Coming,
            transaction_type: TransactionType::IncomingMoney,
            counterparty: Some("Jane Smith".to_string()),
            date: Utc.with_ymd_and_hms(2024, 5, 10, 14, 30, 58).unwrap(),
            date_sent: Utc.with_ymd_and_hms(2024, 5, 10, 14, 30, 51).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_then_find_by_key() {
        let (_dir, store) = store().await;
        let rec = record();
        store.insert(&rec).await.unwrap();

        let found = store
            .find_by(&rec.message, rec.date, rec.date_sent)
            .await
            .unwrap();
        assert_eq!(found, Some(rec));
    }

    #[tokio::test]
    async fn find_by_other_timestamp_is_none() {
        let (_dir, store) = store().await;
        let rec = record();
        store.insert(&rec).await.unwrap();

        let found = store
            .find_by(&rec.message, rec.date_sent, rec.date_sent)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn duplicate_key_insert_is_conflict() {
        let (_dir, store) = store().await;
        let rec = record();
        store.insert(&rec).await.unwrap();

        let copy = TransactionRecord {
            id: Uuid::new_v4(),
            ..rec
        };
        assert!(matches!(store.insert(&copy).await, Err(StoreError::Conflict)));
    }

    #[tokio::test]
    async fn optional_fields_round_trip_as_null() {
        let (_dir, store) = store().await;
        let rec = TransactionRecord {
            amount: None,
            service_center: None,
            counterparty: None,
            message: "Your transaction has been reversed".to_string(),
            category: Category::BothWays,
            transaction_type: TransactionType::Reversed,
            ..record()
        };
        store.insert(&rec).await.unwrap();
        let found = store
            .find_by(&rec.message, rec.date, rec.date_sent)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, rec);
    }

    #[tokio::test]
    async fn closed_pool_is_backend_error() {
        let (_dir, store) = store().await;
        store.pool().close().await;
        let rec = record();
        assert!(matches!(
            store.find_by(&rec.message, rec.date, rec.date_sent).await,
            Err(StoreError::Backend(_))
        ));
    }
}
