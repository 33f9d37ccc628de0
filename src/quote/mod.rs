//! Quote pipeline: debounced input, validation, quote + fee refresh

pub mod coordinator;
pub mod debounce;
pub mod validation;

pub use coordinator::{AppliedInputs, PriceMap, QuoteCoordinator, QuoteEvent};
pub use debounce::{debounce, Debouncer};
pub use validation::{parse_amount, validate, QuoteInput};
