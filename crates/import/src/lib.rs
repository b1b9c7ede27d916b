pub mod dedup;
pub mod extract;
pub mod pipeline;
pub mod rejection;
pub mod rules;
pub mod sms;

pub use dedup::{StoreGateway, StoreOutcome};
pub use extract::{extract_amount, extract_counterparty, from_epoch_millis, parse_timestamp};
pub use pipeline::{EntryOutcome, IngestError, IngestSummary, SmsIngestor};
pub use rejection::RejectionLog;
pub use rules::{classify, Classification, ClassificationRule, Classifier, DEFAULT_RULES};
pub use sms::{build_record, parse_document, ParsedEntry};
