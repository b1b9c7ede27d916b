use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::amount::Amount;
use super::category::{Category, TransactionType};

/// One `sms` element exactly as it appeared in the export.
///
/// Attributes stay as raw strings so malformed values can be reported
/// verbatim in the rejection log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSmsEntry {
    pub address: Option<String>,
    pub body: Option<String>,
    pub date: Option<String>,
    pub date_sent: Option<String>,
    pub service_center: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("Missing required attribute: {0}")]
    MissingAttribute(&'static str),
    #[error("Malformed timestamp in {attribute}: '{value}'")]
    MalformedTimestamp { attribute: &'static str, value: String },
}

/// A normalized, persisted mobile-money transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub address: String,
    pub message: String,
    pub service_center: Option<String>,
    pub amount: Option<Amount>,
    pub category: Category,
    pub transaction_type: TransactionType,
    pub counterparty: Option<String>,
    pub date: DateTime<Utc>,
    pub date_sent: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn dedup_key(&self) -> DedupKey<'_> {
        DedupKey {
            message: &self.message,
            date: self.date,
            date_sent: self.date_sent,
        }
    }
}

/// The `(message, date, date_sent)` triple identifying a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupKey<'a> {
    pub message: &'a str,
    pub date: DateTime<Utc>,
    pub date_sent: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    Unclassified,
    Malformed(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Unclassified => write!(f, "unclassified"),
            RejectReason::Malformed(detail) => write!(f, "malformed: {detail}"),
        }
    }
}

/// An entry kept out of the transaction store, queued for manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnprocessedEntry {
    pub raw: RawSmsEntry,
    pub reason: RejectReason,
}

impl UnprocessedEntry {
    pub fn unclassified(raw: RawSmsEntry) -> Self {
        UnprocessedEntry {
            raw,
            reason: RejectReason::Unclassified,
        }
    }

    pub fn malformed(raw: RawSmsEntry, error: &EntryError) -> Self {
        UnprocessedEntry {
            raw,
            reason: RejectReason::Malformed(error.to_string()),
        }
    }
}
