//! Transaction tracking state
//!
//! `Idle → Submitted → Polling → {Confirmed, Failed, Unknown}`; the last
//! three are terminal. Each status check is classified into one of four
//! outcomes that drive the poll loop.
//!
//! Created: 2026-10-19

use crate::error::SwapError;
use crate::types::{SwapStatus, SwapStatusResponse};
use serde::Serialize;
use std::fmt;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TxState {
    Idle,
    Submitted,
    Polling,
    Confirmed,
    Failed,
    /// Attempt budget exhausted (or too many errors) while still pending
    Unknown,
}

impl TxState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Confirmed | TxState::Failed | TxState::Unknown)
    }
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TxState::Idle => write!(f, "Idle"),
            TxState::Submitted => write!(f, "Submitted"),
            TxState::Polling => write!(f, "Polling"),
            TxState::Confirmed => write!(f, "Confirmed"),
            TxState::Failed => write!(f, "Failed"),
            TxState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Live record of a tracked transaction; dropped on terminal state or teardown
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub signature: String,
    pub state: TxState,
    pub attempts_used: u32,
    pub started_at: Instant,
}

impl TransactionRecord {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            state: TxState::Idle,
            attempts_used: 0,
            started_at: Instant::now(),
        }
    }
}

/// `statusChanged` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub signature: String,
    pub state: TxState,
    /// Failure reason for `Failed`, explanation for `Unknown`
    pub detail: Option<String>,
}

/// What one status check means for the poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Confirmed,
    /// On-chain execution failure; terminal, never retried
    Failed(Option<String>),
    /// Pending or not yet visible; keep polling
    Pending,
    /// Network/server error; counts against the budget
    SoftError(SwapError),
}

pub fn classify(result: Result<SwapStatusResponse, SwapError>) -> CheckOutcome {
    match result {
        Ok(response) => match response.status {
            SwapStatus::Confirmed => CheckOutcome::Confirmed,
            SwapStatus::Failed => CheckOutcome::Failed(response.detail),
            SwapStatus::Pending => CheckOutcome::Pending,
        },
        Err(SwapError::NotFound) => CheckOutcome::Pending,
        Err(SwapError::ChainExecution(detail)) => CheckOutcome::Failed(Some(detail)),
        Err(other) => CheckOutcome::SoftError(other),
    }
}

/// Terminal result of a poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub state: TxState,
    pub detail: Option<String>,
}

impl PollOutcome {
    pub fn confirmed() -> Self {
        Self { state: TxState::Confirmed, detail: None }
    }

    pub fn failed(detail: Option<String>) -> Self {
        Self { state: TxState::Failed, detail }
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            state: TxState::Unknown,
            detail: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TxState::Confirmed.is_terminal());
        assert!(TxState::Failed.is_terminal());
        assert!(TxState::Unknown.is_terminal());
        assert!(!TxState::Polling.is_terminal());
        assert!(!TxState::Submitted.is_terminal());
        assert!(!TxState::Idle.is_terminal());
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(Ok(SwapStatusResponse::confirmed())), CheckOutcome::Confirmed);
        assert_eq!(classify(Ok(SwapStatusResponse::pending())), CheckOutcome::Pending);
        assert_eq!(
            classify(Ok(SwapStatusResponse::failed("custom program error: 0x1771"))),
            CheckOutcome::Failed(Some("custom program error: 0x1771".into()))
        );
        assert_eq!(classify(Err(SwapError::NotFound)), CheckOutcome::Pending);
        assert_eq!(
            classify(Err(SwapError::ChainExecution("insufficient funds".into()))),
            CheckOutcome::Failed(Some("insufficient funds".into()))
        );
        assert_eq!(
            classify(Err(SwapError::Network("reset".into()))),
            CheckOutcome::SoftError(SwapError::Network("reset".into()))
        );
    }
}
