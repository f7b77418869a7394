pub mod batch;
pub mod ledger;

pub use batch::{BatchState, CurrentBatch};
pub use ledger::{LedgerEntry, PageLedger};
