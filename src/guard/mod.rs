//! Context fencing
//!
//! Generation counter, dispatch-time tokens and the account-bound context
//! that the quote and polling components fence their results against.
//!
//! Created: 2026-10-19

pub mod context;
pub mod generation;

pub use context::SwapContext;
pub use generation::{ContextListener, GenerationGuard, GenerationToken};
