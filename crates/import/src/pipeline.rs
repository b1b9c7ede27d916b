use std::io::Write;
use std::path::Path;

use momo_core::{RawSmsEntry, TransactionStore, UnprocessedEntry};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::dedup::{StoreGateway, StoreOutcome};
use crate::rejection::RejectionLog;
use crate::rules::Classifier;
use crate::sms::{build_record, parse_document, ParsedEntry};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Unparseable markup or text that is not UTF-8.
    #[error("Malformed SMS document: {0}")]
    MalformedDocument(String),
}

/// Aggregate result of one batch.
///
/// `skipped` holds duplicates and unclassified messages; `errors` holds
/// malformed entries and store failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl IngestSummary {
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.errors
    }
}

/// How a single entry ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Inserted,
    Duplicate,
    Unclassified,
    Malformed(String),
    StoreFailed(String),
}

/// Orchestrates: parse document → per entry (extract, classify, dedup, store).
pub struct SmsIngestor<'a, S: TransactionStore + ?Sized, W: Write> {
    classifier: Classifier,
    gateway: StoreGateway<'a, S>,
    rejections: RejectionLog<W>,
}

impl<'a, S: TransactionStore + ?Sized, W: Write> SmsIngestor<'a, S, W> {
    pub fn new(store: &'a S, rejections: RejectionLog<W>) -> Self {
        Self {
            classifier: Classifier::default(),
            gateway: StoreGateway::new(store),
            rejections,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Read and ingest an export on disk.
    pub async fn ingest_file(&mut self, path: &Path) -> Result<IngestSummary, IngestError> {
        info!("Starting to process SMS data from {}", path.display());
        let bytes = tokio::fs::read(path).await.inspect_err(|e| {
            error!("Error reading SMS export {}: {e}", path.display());
        })?;
        let xml = String::from_utf8(bytes).map_err(|e| {
            error!("SMS export {} is not valid UTF-8: {e}", path.display());
            IngestError::MalformedDocument(e.to_string())
        })?;
        self.ingest_str(&xml).await
    }

    /// Ingest an in-memory export.
    ///
    /// Only unparseable markup fails the whole batch; every per-entry problem
    /// is counted in the summary instead.
    pub async fn ingest_str(&mut self, xml: &str) -> Result<IngestSummary, IngestError> {
        let entries = parse_document(xml).map_err(|e| {
            error!("Error processing XML document: {e}");
            IngestError::MalformedDocument(e.to_string())
        })?;
        debug!("Found {} <sms> elements", entries.len());

        let mut summary = IngestSummary::default();
        for raw in entries {
            match self.process_entry(raw).await {
                EntryOutcome::Inserted => summary.processed += 1,
                EntryOutcome::Duplicate | EntryOutcome::Unclassified => summary.skipped += 1,
                EntryOutcome::Malformed(_) | EntryOutcome::StoreFailed(_) => summary.errors += 1,
            }
        }

        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            errors = summary.errors,
            "Processing complete"
        );
        Ok(summary)
    }

    /// Runs one entry through the pipeline; never fails the batch.
    pub async fn process_entry(&mut self, raw: RawSmsEntry) -> EntryOutcome {
        let parsed = match build_record(&raw, &self.classifier) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Error processing SMS: {e}");
                let detail = e.to_string();
                self.reject(UnprocessedEntry::malformed(raw, &e));
                return EntryOutcome::Malformed(detail);
            }
        };

        let record = match parsed {
            ParsedEntry::Record(record) => record,
            ParsedEntry::Unclassified => {
                warn!(
                    "Unprocessed message: {}",
                    raw.body.as_deref().unwrap_or_default()
                );
                self.reject(UnprocessedEntry::unclassified(raw));
                return EntryOutcome::Unclassified;
            }
        };

        match self.gateway.store(&record).await {
            StoreOutcome::Inserted => {
                info!(
                    transaction_type = %record.transaction_type,
                    "Processed SMS: {}",
                    record.message
                );
                EntryOutcome::Inserted
            }
            StoreOutcome::Duplicate => EntryOutcome::Duplicate,
            StoreOutcome::Failed(reason) => EntryOutcome::StoreFailed(reason),
        }
    }

    pub fn rejections(&self) -> &RejectionLog<W> {
        &self.rejections
    }

    pub fn into_rejections(self) -> RejectionLog<W> {
        self.rejections
    }

    fn reject(&mut self, entry: UnprocessedEntry) {
        if let Err(e) = self.rejections.record(&entry) {
            warn!("Could not write to rejection log: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use momo_core::{MemoryStore, StoreError, TransactionRecord, TransactionType};

    const RECEIVED: &str = "You have received 2,000 RWF from Jane Smith (*********013) on your mobile money account at 2024-05-10 16:30:51.";

    fn sms(body: &str, date: &str, date_sent: &str) -> String {
        format!(
            r#"  <sms protocol="0" address="M-Money" date="{date}" type="1" body="{body}" service_center="+250788110381" date_sent="{date_sent}" />
"#
        )
    }

    fn document(entries: &[String]) -> String {
        format!(
            "<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>\n<smses count=\"{}\">\n{}</smses>\n",
            entries.len(),
            entries.concat()
        )
    }

    fn three_entry_document() -> String {
        document(&[
            sms(RECEIVED, "1715351458724", "1715351451000"),
            sms("Hello world", "1715369560245", "1715369557000"),
            sms("Your payment of 500 RWF has been completed", "not-a-number", "1715369557000"),
        ])
    }

    fn ingestor(store: &MemoryStore) -> SmsIngestor<'_, MemoryStore, Vec<u8>> {
        SmsIngestor::new(store, RejectionLog::new(Vec::new()))
    }

    #[tokio::test]
    async fn mixed_document_summary() {
        let store = MemoryStore::new();
        let mut ingestor = ingestor(&store);

        let summary = ingestor.ingest_str(&three_entry_document()).await.unwrap();

        assert_eq!(
            summary,
            IngestSummary {
                processed: 1,
                skipped: 1,
                errors: 1
            }
        );
        assert_eq!(summary.total(), 3);

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transaction_type, TransactionType::IncomingMoney);
        assert_eq!(records[0].message, RECEIVED);
    }

    #[tokio::test]
    async fn rejected_entries_reach_the_log() {
        let store = MemoryStore::new();
        let mut ingestor = ingestor(&store);
        ingestor.ingest_str(&three_entry_document()).await.unwrap();

        assert_eq!(ingestor.rejections().written(), 2);
        let log = String::from_utf8(ingestor.into_rejections().into_inner()).unwrap();
        let lines: Vec<_> = log.lines().collect();
        assert!(lines[0].contains("\tunclassified\t"));
        assert!(lines[0].contains("Hello world"));
        assert!(lines[1].contains("malformed: Malformed timestamp in date: 'not-a-number'"));
        assert!(!log.contains("received 2,000"));
    }

    #[tokio::test]
    async fn reprocessing_is_idempotent() {
        let store = MemoryStore::new();
        let xml = document(&[
            sms(RECEIVED, "1715351458724", "1715351451000"),
            sms(
                "TxId: 73214484437. Your payment of 1,000 RWF to Jane Smith 12845 has been completed.",
                "1715351506754",
                "1715351498000",
            ),
            sms(
                "*165*S*10000 RWF transferred to Samuel Carter (250791666666) from 36521838.",
                "1715452495316",
                "1715452487000",
            ),
        ]);

        let first = ingestor(&store).ingest_str(&xml).await.unwrap();
        assert_eq!(first.processed, 3);

        let second = ingestor(&store).ingest_str(&xml).await.unwrap();
        assert_eq!(
            second,
            IngestSummary {
                processed: 0,
                skipped: 3,
                errors: 0
            }
        );
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn missing_body_does_not_abort_batch() {
        let store = MemoryStore::new();
        let xml = format!(
            "<smses>\n  <sms address=\"M-Money\" date=\"1715351458724\" date_sent=\"1715351451000\" />\n{}</smses>",
            sms(RECEIVED, "1715351458724", "1715351451000")
        );
        let summary = ingestor(&store).ingest_str(&xml).await.unwrap();
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.total(), 2);
    }

    #[tokio::test]
    async fn duplicate_within_one_document() {
        let store = MemoryStore::new();
        let entry = sms(RECEIVED, "1715351458724", "1715351451000");
        let summary = ingestor(&store)
            .ingest_str(&document(&[entry.clone(), entry]))
            .await
            .unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn malformed_document_is_fatal() {
        let store = MemoryStore::new();
        let result = ingestor(&store)
            .ingest_str("<smses><sms body=\"x\"></smses>")
            .await;
        assert!(matches!(result, Err(IngestError::MalformedDocument(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn empty_document_yields_empty_summary() {
        let store = MemoryStore::new();
        let summary = ingestor(&store).ingest_str("<smses count=\"0\" />").await.unwrap();
        assert_eq!(summary, IngestSummary::default());
    }

    #[tokio::test]
    async fn custom_classifier_is_used() {
        let store = MemoryStore::new();
        let classifier = Classifier::from_toml(
            r#"
[[rules]]
name = "greeting"
keywords = ["hello"]
category = "No change"
transaction_type = "Unknown"
"#,
        )
        .unwrap();
        let mut ingestor = ingestor(&store).with_classifier(classifier);
        let summary = ingestor
            .ingest_str(&document(&[sms("Hello world", "1715369560245", "1715369557000")]))
            .await
            .unwrap();
        assert_eq!(summary.processed, 1);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let result = ingestor(&store)
            .ingest_file(&dir.path().join("missing.xml"))
            .await;
        assert!(matches!(result, Err(IngestError::Io(_))));
    }

    #[tokio::test]
    async fn non_utf8_export_is_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sms.xml");
        let mut bytes = b"<smses><sms body=\"caf".to_vec();
        bytes.extend_from_slice(&[0xE9, 0xFF]);
        bytes.extend_from_slice(b"\" date=\"1\" date_sent=\"1\" /></smses>");
        std::fs::write(&path, bytes).unwrap();

        let store = MemoryStore::new();
        let result = ingestor(&store).ingest_file(&path).await;
        assert!(matches!(result, Err(IngestError::MalformedDocument(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn ingest_file_reads_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sms.xml");
        std::fs::write(&path, three_entry_document()).unwrap();

        let store = MemoryStore::new();
        let summary = ingestor(&store).ingest_file(&path).await.unwrap();
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.processed, 1);
    }

    /// A store whose connection is gone: every call fails.
    struct UnavailableStore;

    #[async_trait]
    impl TransactionStore for UnavailableStore {
        async fn find_by(
            &self,
            _message: &str,
            _date: DateTime<Utc>,
            _date_sent: DateTime<Utc>,
        ) -> Result<Option<TransactionRecord>, StoreError> {
            Err(StoreError::Backend("database is locked".to_string()))
        }

        async fn insert(&self, _record: &TransactionRecord) -> Result<(), StoreError> {
            Err(StoreError::Backend("database is locked".to_string()))
        }
    }

    #[tokio::test]
    async fn unavailable_store_degrades_every_entry() {
        let xml = document(&[
            sms(RECEIVED, "1715351458724", "1715351451000"),
            sms("Your payment of 500 RWF has been completed", "1715369560245", "1715369557000"),
            sms("Hello world", "1715369560245", "1715369557000"),
        ]);
        let mut ingestor = SmsIngestor::new(&UnavailableStore, RejectionLog::new(Vec::new()));
        let summary = ingestor.ingest_str(&xml).await.unwrap();
        assert_eq!(
            summary,
            IngestSummary {
                processed: 0,
                skipped: 1,
                errors: 2
            }
        );
    }
}
