pub mod transaction;

pub use transaction::{TransactionOutcome, TransactionRecord};
