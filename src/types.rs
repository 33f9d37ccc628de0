//! Core data structures for the swap engine
//!
//! Wire-facing types exchanged with the wallet backend, plus the small
//! value types shared by the quote, cache and poller components.
//!
//! Created: 2026-10-19

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend account identifier (the wallet the session is bound to)
pub type AccountId = String;

/// Ordered token pair as selected in the swap form (from → to)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    pub from_token: String,
    pub to_token: String,
}

impl TokenPair {
    pub fn new(from_token: impl Into<String>, to_token: impl Into<String>) -> Self {
        Self {
            from_token: from_token.into(),
            to_token: to_token.into(),
        }
    }

    /// Both sides refer to the same token
    pub fn is_same_token(&self) -> bool {
        self.from_token == self.to_token
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}", self.from_token, self.to_token)
    }
}

/// Parameters of a `getSwapQuote` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub from_token: String,
    pub to_token: String,
    pub amount: Decimal,
    /// Slippage tolerance in percent (0.5 = 0.5%)
    pub slippage: Decimal,
}

impl QuoteRequest {
    pub fn pair(&self) -> TokenPair {
        TokenPair::new(self.from_token.clone(), self.to_token.clone())
    }
}

/// A priced conversion offer between two tokens.
///
/// `network_fee` is `None` when first published and filled in once the
/// fee estimate (or its placeholder) is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub from_token: String,
    pub to_token: String,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
    pub price_impact: Decimal,
    pub minimum_received: Decimal,
    #[serde(default)]
    pub network_fee: Option<Decimal>,
    pub quote_id: String,
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    /// Output units received per input unit
    pub fn rate(&self) -> Decimal {
        self.to_amount
            .checked_div(self.from_amount)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Parameters of an `executeSwap` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteSwapRequest {
    pub quote_id: String,
    pub from_token: String,
    pub to_token: String,
    pub amount: Decimal,
    pub slippage: Decimal,
    /// Secret the backend uses to authorise signing. Never logged.
    #[serde(skip_serializing)]
    pub auth_secret: String,
}

/// Result of a submitted swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSubmission {
    pub signature: String,
}

/// Status reported by `getSwapStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    Pending,
    Confirmed,
    Failed,
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SwapStatus::Pending => write!(f, "pending"),
            SwapStatus::Confirmed => write!(f, "confirmed"),
            SwapStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapStatusResponse {
    pub status: SwapStatus,
    #[serde(default)]
    pub detail: Option<String>,
}

impl SwapStatusResponse {
    pub fn pending() -> Self {
        Self { status: SwapStatus::Pending, detail: None }
    }

    pub fn confirmed() -> Self {
        Self { status: SwapStatus::Confirmed, detail: None }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: SwapStatus::Failed,
            detail: Some(detail.into()),
        }
    }
}

/// Price information for one token address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPrice {
    pub address: String,
    pub price_usd: Decimal,
    #[serde(default)]
    pub change_24h: Option<Decimal>,
}

/// Wallet balance of one token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub address: String,
    pub symbol: String,
    pub amount: Decimal,
}
