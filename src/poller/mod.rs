//! Transaction confirmation tracking

pub mod balances;
pub mod state;
pub mod tracker;

pub use balances::{BalanceRefresher, TokenListRefresher};
pub use state::{classify, CheckOutcome, PollOutcome, StatusEvent, TransactionRecord, TxState};
pub use tracker::TransactionPoller;
