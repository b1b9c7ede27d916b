pub mod amount;
pub mod category;
pub mod period;
pub mod store;
pub mod transaction;

pub use amount::{Amount, CURRENCY};
pub use category::{Category, TransactionType};
pub use period::DateRange;
pub use store::{MemoryStore, StoreError, TransactionStore};
pub use transaction::{
    DedupKey, EntryError, RawSmsEntry, RejectReason, TransactionRecord, UnprocessedEntry,
};
