use momo_core::{EntryError, RawSmsEntry, TransactionRecord};
use quick_xml::de::{from_str, DeError};
use serde::Deserialize;
use uuid::Uuid;

use crate::extract::{extract_amount, extract_counterparty, parse_timestamp_attr};
use crate::rules::Classifier;

/// Root of an "SMS Backup & Restore" style export; only `sms` children matter.
#[derive(Debug, Deserialize)]
struct SmsBackup {
    #[serde(rename = "sms", default)]
    entries: Vec<SmsElement>,
}

#[derive(Debug, Deserialize)]
struct SmsElement {
    #[serde(rename = "@address", default)]
    address: Option<String>,
    #[serde(rename = "@body", default)]
    body: Option<String>,
    #[serde(rename = "@date", default)]
    date: Option<String>,
    #[serde(rename = "@date_sent", default)]
    date_sent: Option<String>,
    #[serde(rename = "@service_center", default)]
    service_center: Option<String>,
}

impl From<SmsElement> for RawSmsEntry {
    fn from(el: SmsElement) -> Self {
        RawSmsEntry {
            address: el.address,
            body: el.body,
            date: el.date,
            date_sent: el.date_sent,
            service_center: el.service_center,
        }
    }
}

/// Reads every `sms` element of the document, in document order.
///
/// Fails only when the markup itself is malformed.
pub fn parse_document(xml: &str) -> Result<Vec<RawSmsEntry>, DeError> {
    let backup: SmsBackup = from_str(xml)?;
    Ok(backup.entries.into_iter().map(RawSmsEntry::from).collect())
}

/// What a single, well-formed entry turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEntry {
    Record(TransactionRecord),
    /// No rule recognised the message; it belongs in the rejection log.
    Unclassified,
}

/// Turns one raw entry into a candidate record.
pub fn build_record(raw: &RawSmsEntry, classifier: &Classifier) -> Result<ParsedEntry, EntryError> {
    let body = raw
        .body
        .as_deref()
        .ok_or(EntryError::MissingAttribute("body"))?;
    let date_raw = raw
        .date
        .as_deref()
        .ok_or(EntryError::MissingAttribute("date"))?;
    let date_sent_raw = raw
        .date_sent
        .as_deref()
        .ok_or(EntryError::MissingAttribute("date_sent"))?;

    let date = parse_timestamp_attr("date", date_raw)?;
    let date_sent = parse_timestamp_attr("date_sent", date_sent_raw)?;

    let classification = classifier.classify(body);
    if classification.is_unknown() {
        return Ok(ParsedEntry::Unclassified);
    }

    Ok(ParsedEntry::Record(TransactionRecord {
        id: Uuid::new_v4(),
        address: raw.address.clone().unwrap_or_default(),
        message: body.to_string(),
        service_center: raw.service_center.clone().filter(|s| !s.is_empty() && s != "null"),
        amount: extract_amount(body),
        category: classification.category,
        transaction_type: classification.transaction_type,
        counterparty: extract_counterparty(body),
        date,
        date_sent,
    }))
}
