//! Wallet Backend Interface
//!
//! The six backend operations the swap core consumes. Signing happens
//! server-side; the client only ever sees quotes, signatures and statuses.
//! The transport behind this trait is not part of the engine.
//!
//! Created: 2026-10-19

pub mod simulated;

pub use simulated::{CallCounts, SimulatedBackend};

use crate::error::SwapError;
use crate::types::{
    ExecuteSwapRequest, Quote, QuoteRequest, SwapStatusResponse, SwapSubmission, TokenBalance,
    TokenPrice,
};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SwapBackend: Send + Sync {
    /// `getSwapQuote`
    async fn get_swap_quote(&self, account: &str, request: &QuoteRequest) -> Result<Quote, SwapError>;

    /// `getSwapEstimateFees`: network fee for the swap, in the fee token
    async fn get_swap_estimate_fees(
        &self,
        account: &str,
        from_token: &str,
        to_token: &str,
        amount: Decimal,
    ) -> Result<Decimal, SwapError>;

    /// `executeSwap`: sign and submit, returning the transaction signature
    async fn execute_swap(
        &self,
        account: &str,
        request: &ExecuteSwapRequest,
    ) -> Result<SwapSubmission, SwapError>;

    /// `getSwapStatus`. `Err(SwapError::NotFound)` means "not visible yet".
    async fn get_swap_status(&self, account: &str, signature: &str) -> Result<SwapStatusResponse, SwapError>;

    /// `getTokenPrices`, keyed by token address
    async fn get_token_prices(
        &self,
        account: &str,
        addresses: &[String],
    ) -> Result<HashMap<String, TokenPrice>, SwapError>;

    /// `getTokenBalances`
    async fn get_token_balances(&self, account: &str) -> Result<Vec<TokenBalance>, SwapError>;
}
