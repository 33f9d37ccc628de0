//! Swap Engine Library
//!
//! Asynchronous trade-quote and transaction-confirmation engine behind a
//! wallet's token-swap screen: debounced quote refresh, a TTL price cache,
//! stale-result fencing across context switches and bounded-retry
//! confirmation polling.
//!
//! Created: 2026-10-19

pub mod backend;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod notify;
pub mod poller;
pub mod quote;
pub mod types;

// Re-export commonly used types
pub use backend::{SimulatedBackend, SwapBackend};
pub use cache::{PairKey, PriceCache};
pub use config::{load_config, EngineConfig};
pub use engine::SwapEngine;
pub use error::SwapError;
pub use guard::{GenerationGuard, SwapContext};
pub use notify::{NotificationCoordinator, ToastKind};
pub use poller::{StatusEvent, TransactionPoller, TxState};
pub use quote::{QuoteCoordinator, QuoteEvent};
pub use types::{Quote, QuoteRequest, SwapStatus, TokenPair};
