use momo_core::{StoreError, TransactionRecord, TransactionStore};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted,
    /// A record with the same message and timestamps is already stored.
    Duplicate,
    Failed(String),
}

/// Duplicate-checked, insert-only access to a [`TransactionStore`].
pub struct StoreGateway<'a, S: TransactionStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TransactionStore + ?Sized> StoreGateway<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Looks the candidate up by its dedup key and inserts it only if absent.
    ///
    /// Never updates an existing record.
    pub async fn store(&self, candidate: &TransactionRecord) -> StoreOutcome {
        let key = candidate.dedup_key();
        match self.store.find_by(key.message, key.date, key.date_sent).await {
            Ok(Some(existing)) => {
                debug!(existing_id = %existing.id, "Duplicate SMS skipped: {}", candidate.message);
                return StoreOutcome::Duplicate;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Duplicate lookup failed: {e}");
                return StoreOutcome::Failed(e.to_string());
            }
        }

        match self.store.insert(candidate).await {
            Ok(()) => StoreOutcome::Inserted,
            Err(StoreError::Conflict) => {
                debug!("Insert hit an existing key, treating as duplicate: {}", candidate.message);
                StoreOutcome::Duplicate
            }
            Err(e) => {
                warn!(id = %candidate.id, "Insert failed: {e}");
                StoreOutcome::Failed(e.to_string())
            }
        }
    }
}
