use chrono::NaiveDate;
use momo_core::{Amount, DateRange, TransactionRecord, TransactionType};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::db::{into_records, DbPool, StorageError, TransactionRow, RECORD_COLUMNS};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub items: Vec<TransactionRecord>,
    /// 1-based.
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

/// All set criteria must hold. An empty filter matches every record.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    /// Exact calendar day (UTC) of `date`.
    pub date: Option<NaiveDate>,
    pub range: Option<DateRange>,
    pub amount: Option<Amount>,
    pub min_amount: Option<Amount>,
    pub max_amount: Option<Amount>,
    /// Case-insensitive substring over address, message, service center,
    /// transaction type and category.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Type,
    Month,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    /// Transaction type label or `YYYY-MM`.
    pub key: String,
    pub total: Amount,
    pub count: i64,
}

pub async fn count_transactions(pool: &DbPool) -> Result<i64, StorageError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn list_transactions(
    pool: &DbPool,
    page: u32,
    per_page: u32,
) -> Result<Page, StorageError> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let offset = i64::from(page - 1) * i64::from(per_page);

    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM transactions ORDER BY date, rowid LIMIT ? OFFSET ?"
    ))
    .bind(i64::from(per_page))
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total = count_transactions(pool).await?;
    let per_page_i64 = i64::from(per_page);
    Ok(Page {
        items: into_records(rows)?,
        page,
        per_page,
        total,
        total_pages: (total + per_page_i64 - 1) / per_page_i64,
    })
}

pub async fn get_transaction(
    pool: &DbPool,
    id: Uuid,
) -> Result<Option<TransactionRecord>, StorageError> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM transactions WHERE id = ?"
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(TransactionRecord::try_from).transpose()
}

pub async fn find_transactions(
    pool: &DbPool,
    filter: &TransactionFilter,
) -> Result<Vec<TransactionRecord>, StorageError> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {RECORD_COLUMNS} FROM transactions WHERE 1 = 1"
    ));

    if let Some(tx_type) = filter.transaction_type {
        qb.push(" AND transaction_type = ").push_bind(tx_type.label());
    }
    if let Some(day) = filter.date {
        qb.push(" AND substr(date, 1, 10) = ")
            .push_bind(day.format(DATE_FORMAT).to_string());
    }
    if let Some(range) = filter.range {
        if let Some(start) = range.start {
            qb.push(" AND substr(date, 1, 10) >= ")
                .push_bind(start.format(DATE_FORMAT).to_string());
        }
        if let Some(end) = range.end {
            qb.push(" AND substr(date, 1, 10) <= ")
                .push_bind(end.format(DATE_FORMAT).to_string());
        }
    }
    if let Some(amount) = filter.amount {
        qb.push(" AND amount_cents = ").push_bind(amount.to_cents());
    }
    if let Some(min) = filter.min_amount {
        qb.push(" AND amount_cents >= ").push_bind(min.to_cents());
    }
    if let Some(max) = filter.max_amount {
        qb.push(" AND amount_cents <= ").push_bind(max.to_cents());
    }
    qb.push(" ORDER BY date, rowid");

    let rows = qb.build_query_as::<TransactionRow>().fetch_all(pool).await?;
    let mut records = into_records(rows)?;

    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let needle = term.to_lowercase();
        records.retain(|record| matches_search(record, &needle));
    }
    Ok(records)
}

/// Plain substring match on lowercased text. Done here rather than with
/// `LIKE`, since SQLite's `lower()` folds only ASCII and `%`/`_` are wildcards.
fn matches_search(record: &TransactionRecord, needle: &str) -> bool {
    [
        record.address.as_str(),
        record.message.as_str(),
        record.service_center.as_deref().unwrap_or_default(),
        record.transaction_type.label(),
        record.category.label(),
    ]
    .into_iter()
    .any(|field| field.to_lowercase().contains(needle))
}

pub async fn summarize(pool: &DbPool, group_by: GroupBy) -> Result<Vec<SummaryRow>, StorageError> {
    let key = match group_by {
        GroupBy::Type => "transaction_type",
        GroupBy::Month => "strftime('%Y-%m', date)",
    };
    let rows = sqlx::query_as::<_, (String, i64, i64)>(&format!(
        "SELECT {key} AS group_key, COALESCE(SUM(amount_cents), 0), COUNT(*) FROM transactions GROUP BY group_key ORDER BY group_key"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(key, cents, count)| {
            let total = Amount::from_cents(cents)
                .ok_or_else(|| StorageError::InvalidRow(format!("negative total for {key}")))?;
            Ok(SummaryRow { key, total, count })
        })
        .collect()
}
