//! Swap engine error taxonomy
//!
//! Every failure the core can observe is one of these variants. Components
//! convert them into a state transition or a notification at their boundary;
//! none of them is allowed to escape to the caller as a panic.
//!
//! Created: 2026-10-19

use thiserror::Error;

/// Shown when the backend reports a failure without a message
pub const GENERIC_BACKEND_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    /// Amount is empty, non-numeric, zero or negative.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// From and to token are identical.
    #[error("Cannot swap a token for itself")]
    SameToken,

    /// Transport failure (connection refused, timeout, DNS...).
    #[error("Network error: {0}")]
    Network(String),

    /// Server-reported failure; the message is surfaced verbatim when present.
    #[error("{}", .message.as_deref().unwrap_or(GENERIC_BACKEND_MESSAGE))]
    Backend { message: Option<String> },

    /// The transaction is not visible to the backend yet.
    #[error("Transaction not found yet")]
    NotFound,

    /// The transaction landed but its execution failed on-chain.
    #[error("Transaction failed on-chain: {0}")]
    ChainExecution(String),

    /// Attempt budget exhausted while the transaction was still pending.
    #[error("Transaction status unknown")]
    TimeoutAmbiguous,

    /// Swap requested without a quote to execute.
    #[error("No quote available")]
    MissingQuote,

    /// Swap requested without the secret the backend signs with.
    #[error("Authorisation secret missing")]
    MissingAuth,

    /// A submission is already on its way to the backend.
    #[error("Swap already in progress")]
    InProgress,

    /// The result belonged to a context that has since been replaced.
    #[error("Result superseded by a newer context")]
    Superseded,
}

impl SwapError {
    pub fn backend(message: impl Into<String>) -> Self {
        SwapError::Backend {
            message: Some(message.into()),
        }
    }

    /// Locally recoverable input problems
    pub fn is_validation(&self) -> bool {
        matches!(self, SwapError::InvalidAmount(_) | SwapError::SameToken)
    }

    /// Poll failures that count against the attempt budget without ending the poll
    pub fn is_soft_poll_failure(&self) -> bool {
        matches!(self, SwapError::Network(_) | SwapError::Backend { .. })
    }

    /// Text for the user-facing notification
    pub fn user_message(&self) -> String {
        match self {
            SwapError::InvalidAmount(_) => "Enter a valid amount".to_string(),
            SwapError::SameToken => "Select two different tokens".to_string(),
            SwapError::Network(_) => "Network error. Check your connection and try again.".to_string(),
            SwapError::Backend { .. } => self.to_string(),
            SwapError::ChainExecution(detail) => format!("Swap failed: {}", detail),
            SwapError::TimeoutAmbiguous => {
                "Swap status unknown. Check history later.".to_string()
            }
            SwapError::MissingQuote => "Get a quote before swapping".to_string(),
            SwapError::MissingAuth => "Confirm the swap with your PIN".to_string(),
            SwapError::InProgress => "Swap already in progress".to_string(),
            SwapError::NotFound | SwapError::Superseded => GENERIC_BACKEND_MESSAGE.to_string(),
        }
    }
}
