use std::path::Path;

use anyhow::{anyhow, Context};
use momo_core::{DateRange, TransactionRecord};
use momo_import::{Classifier, IngestSummary, RejectionLog, SmsIngestor};
use momo_storage::{DbPool, Page, SqliteStore, SummaryRow, TransactionFilter};
use serde::Serialize;
use uuid::Uuid;

use crate::cli::{Commands, SearchArgs};
use crate::config::AppConfig;

pub async fn run(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    let db = momo_storage::create_db(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    match command {
        Commands::Ingest { file, rules } => {
            let rules = rules.as_deref().or(config.rules_path.as_deref());
            print_json(&ingest(&db, config, &file, rules).await?)
        }
        Commands::List { page, per_page } => print_json(&list(&db, page, per_page).await?),
        Commands::Show { id } => print_json(&show(&db, id).await?),
        Commands::Search(args) => print_json(&search(&db, args).await?),
        Commands::Summary { group_by } => {
            print_json(&summary(&db, group_by.into()).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn load_classifier(rules: Option<&Path>) -> anyhow::Result<Classifier> {
    let Some(path) = rules else {
        return Ok(Classifier::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule file {}", path.display()))?;
    Classifier::from_toml(&content).map_err(|e| anyhow!("{}: {e}", path.display()))
}

pub async fn ingest(
    db: &DbPool,
    config: &AppConfig,
    file: &Path,
    rules: Option<&Path>,
) -> anyhow::Result<IngestSummary> {
    let classifier = load_classifier(rules)?;
    let store = SqliteStore::new(db.clone());
    let rejections = RejectionLog::open(&config.rejection_log).with_context(|| {
        format!(
            "Failed to open rejection log {}",
            config.rejection_log.display()
        )
    })?;

    let mut ingestor = SmsIngestor::new(&store, rejections).with_classifier(classifier);
    let summary = ingestor
        .ingest_file(file)
        .await
        .with_context(|| format!("Failed to ingest {}", file.display()))?;

    let rejected = ingestor.rejections().written();
    if rejected > 0 {
        tracing::info!(
            "{rejected} message(s) written to {}",
            config.rejection_log.display()
        );
    }
    Ok(summary)
}

pub async fn list(db: &DbPool, page: u32, per_page: u32) -> anyhow::Result<Page> {
    Ok(momo_storage::list_transactions(db, page, per_page).await?)
}

pub async fn show(db: &DbPool, id: Uuid) -> anyhow::Result<TransactionRecord> {
    momo_storage::get_transaction(db, id)
        .await?
        .ok_or_else(|| anyhow!("Transaction not found: {id}"))
}

impl From<SearchArgs> for TransactionFilter {
    fn from(args: SearchArgs) -> Self {
        let range = DateRange::open(args.from, args.to);
        TransactionFilter {
            transaction_type: args.transaction_type,
            date: args.date,
            range: (!range.is_unbounded()).then_some(range),
            amount: args.amount,
            min_amount: args.min_amount,
            max_amount: args.max_amount,
            search: args.query,
        }
    }
}

pub async fn search(db: &DbPool, args: SearchArgs) -> anyhow::Result<Vec<TransactionRecord>> {
    let filter = TransactionFilter::from(args);
    Ok(momo_storage::find_transactions(db, &filter).await?)
}

pub async fn summary(
    db: &DbPool,
    group_by: momo_storage::GroupBy,
) -> anyhow::Result<Vec<SummaryRow>> {
    Ok(momo_storage::summarize(db, group_by).await?)
}
