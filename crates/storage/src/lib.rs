pub mod db;
pub mod query;
pub mod store;

pub use db::{create_db, DbPool, StorageError};
pub use query::{
    count_transactions, find_transactions, get_transaction, list_transactions, summarize, GroupBy,
    Page, SummaryRow, TransactionFilter,
};
pub use store::SqliteStore;
