use chrono::{DateTime, NaiveDateTime, Utc};
use momo_core::{Amount, TransactionRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub type DbPool = Pool<Sqlite>;

/// Timestamps are stored as UTC text at second precision so the dedup key
/// compares byte-for-byte and `strftime` works on it.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),
}

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;
    debug!("Opened transaction database at {}", path.display());

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            address TEXT NOT NULL,
            message TEXT NOT NULL,
            service_center TEXT,
            amount_cents INTEGER,
            category TEXT NOT NULL,
            transaction_type TEXT NOT NULL,
            counterparty TEXT,
            date TEXT NOT NULL,
            date_sent TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_dedup ON transactions (message, date, date_sent)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions (transaction_type)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions (date)")
        .execute(pool)
        .await?;

    Ok(())
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| StorageError::InvalidRow(format!("bad {column} '{raw}': {e}")))
}

/// Column order shared by every `SELECT` that yields full records.
pub(crate) const RECORD_COLUMNS: &str = "id, address, message, service_center, amount_cents, \
     category, transaction_type, counterparty, date, date_sent";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TransactionRow {
    id: String,
    address: String,
    message: String,
    service_center: Option<String>,
    amount_cents: Option<i64>,
    category: String,
    transaction_type: String,
    counterparty: Option<String>,
    date: String,
    date_sent: String,
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = StorageError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| StorageError::InvalidRow(format!("bad id '{}': {e}", row.id)))?;
        let amount = row
            .amount_cents
            .map(|cents| {
                Amount::from_cents(cents)
                    .ok_or_else(|| StorageError::InvalidRow(format!("bad amount_cents {cents}")))
            })
            .transpose()?;

        Ok(TransactionRecord {
            id,
            amount,
            category: row.category.parse().map_err(StorageError::InvalidRow)?,
            transaction_type: row.transaction_type.parse().map_err(StorageError::InvalidRow)?,
            date: parse_timestamp("date", &row.date)?,
            date_sent: parse_timestamp("date_sent", &row.date_sent)?,
            address: row.address,
            message: row.message,
            service_center: row.service_center,
            counterparty: row.counterparty,
        })
    }
}

pub(crate) fn into_records(rows: Vec<TransactionRow>) -> Result<Vec<TransactionRecord>, StorageError> {
    rows.into_iter().map(TransactionRecord::try_from).collect()
}
