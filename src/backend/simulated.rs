//! Simulated Wallet Backend
//!
//! Deterministic in-process backend used by the CLI demo and by tests that
//! need real interleaving (slow responses, scripted status sequences).
//!
//! Pricing: quotes convert through a USD price table,
//! `to_amount = amount * price(from) / price(to)`, minus slippage for
//! `minimum_received`. Amounts that overflow the decimal range are rejected
//! as a backend error. Status checks follow a per-signature script; the
//! last scripted response repeats once the script is exhausted.
//!
//! Created: 2026-10-19

use super::SwapBackend;
use crate::error::SwapError;
use crate::types::{
    ExecuteSwapRequest, Quote, QuoteRequest, SwapStatusResponse, SwapSubmission, TokenBalance,
    TokenPrice,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

type StatusScript = VecDeque<Result<SwapStatusResponse, SwapError>>;

const AMOUNT_TOO_LARGE: &str = "Amount too large to quote";

/// Per-operation call counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub quotes: usize,
    pub fees: usize,
    pub executions: usize,
    pub statuses: usize,
    pub prices: usize,
    pub balances: usize,
}

#[derive(Default)]
struct Counters {
    quotes: AtomicUsize,
    fees: AtomicUsize,
    executions: AtomicUsize,
    statuses: AtomicUsize,
    prices: AtomicUsize,
    balances: AtomicUsize,
}

pub struct SimulatedBackend {
    latency: Duration,
    quote_latencies: Mutex<VecDeque<Duration>>,
    prices_usd: Mutex<HashMap<String, Decimal>>,
    balances: Mutex<Vec<TokenBalance>>,
    quote_error: Mutex<Option<SwapError>>,
    fee_result: Mutex<Result<Decimal, SwapError>>,
    price_error: Mutex<Option<SwapError>>,
    balance_error: Mutex<Option<SwapError>>,
    execute_error: Mutex<Option<SwapError>>,
    /// Applied to every signature returned by `execute_swap`
    status_template: Mutex<Vec<Result<SwapStatusResponse, SwapError>>>,
    status_scripts: Mutex<HashMap<String, StatusScript>>,
    quote_requests: Mutex<Vec<QuoteRequest>>,
    next_id: AtomicU64,
    counters: Counters,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self {
            latency: Duration::from_millis(120),
            quote_latencies: Mutex::new(VecDeque::new()),
            prices_usd: Mutex::new(HashMap::new()),
            balances: Mutex::new(Vec::new()),
            quote_error: Mutex::new(None),
            fee_result: Mutex::new(Ok(Decimal::new(5, 6))),
            price_error: Mutex::new(None),
            balance_error: Mutex::new(None),
            execute_error: Mutex::new(None),
            status_template: Mutex::new(vec![
                Ok(SwapStatusResponse::pending()),
                Ok(SwapStatusResponse::pending()),
                Ok(SwapStatusResponse::confirmed()),
            ]),
            status_scripts: Mutex::new(HashMap::new()),
            quote_requests: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            counters: Counters::default(),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_price(self, token: &str, price_usd: Decimal) -> Self {
        self.prices_usd.lock().insert(token.to_string(), price_usd);
        self
    }

    pub fn with_balance(self, address: &str, symbol: &str, amount: Decimal) -> Self {
        self.balances.lock().push(TokenBalance {
            address: address.to_string(),
            symbol: symbol.to_string(),
            amount,
        });
        self
    }

    /// Latency for the next quote call only (queued, FIFO)
    pub fn push_quote_latency(&self, latency: Duration) {
        self.quote_latencies.lock().push_back(latency);
    }

    pub fn set_quote_error(&self, error: Option<SwapError>) {
        *self.quote_error.lock() = error;
    }

    pub fn set_fee_result(&self, result: Result<Decimal, SwapError>) {
        *self.fee_result.lock() = result;
    }

    pub fn set_price_error(&self, error: Option<SwapError>) {
        *self.price_error.lock() = error;
    }

    pub fn set_balance_error(&self, error: Option<SwapError>) {
        *self.balance_error.lock() = error;
    }

    pub fn set_execute_error(&self, error: Option<SwapError>) {
        *self.execute_error.lock() = error;
    }

    /// Status sequence handed to every future signature from `execute_swap`
    pub fn set_status_template(&self, script: Vec<Result<SwapStatusResponse, SwapError>>) {
        *self.status_template.lock() = script;
    }

    /// Status sequence for a specific signature
    pub fn script_status(&self, signature: &str, script: Vec<Result<SwapStatusResponse, SwapError>>) {
        self.status_scripts
            .lock()
            .insert(signature.to_string(), script.into_iter().collect());
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            quotes: self.counters.quotes.load(Ordering::SeqCst),
            fees: self.counters.fees.load(Ordering::SeqCst),
            executions: self.counters.executions.load(Ordering::SeqCst),
            statuses: self.counters.statuses.load(Ordering::SeqCst),
            prices: self.counters.prices.load(Ordering::SeqCst),
            balances: self.counters.balances.load(Ordering::SeqCst),
        }
    }

    /// Every quote request received, in arrival order
    pub fn quote_requests(&self) -> Vec<QuoteRequest> {
        self.quote_requests.lock().clone()
    }

    fn price_of(&self, token: &str) -> Result<Decimal, SwapError> {
        self.prices_usd
            .lock()
            .get(token)
            .copied()
            .filter(|p| !p.is_zero())
            .ok_or_else(|| SwapError::backend(format!("Unsupported token: {}", token)))
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SwapBackend for SimulatedBackend {
    async fn get_swap_quote(&self, _account: &str, request: &QuoteRequest) -> Result<Quote, SwapError> {
        self.counters.quotes.fetch_add(1, Ordering::SeqCst);
        self.quote_requests.lock().push(request.clone());

        let latency = self.quote_latencies.lock().pop_front().unwrap_or(self.latency);
        tokio::time::sleep(latency).await;

        if let Some(err) = self.quote_error.lock().clone() {
            return Err(err);
        }

        let from_price = self.price_of(&request.from_token)?;
        let to_price = self.price_of(&request.to_token)?;
        let to_amount = request
            .amount
            .checked_mul(from_price)
            .and_then(|usd| usd.checked_div(to_price))
            .ok_or_else(|| SwapError::backend(AMOUNT_TOO_LARGE))?
            .round_dp(9);
        let minimum_received = Decimal::ONE_HUNDRED
            .checked_sub(request.slippage)
            .and_then(|kept| to_amount.checked_mul(kept))
            .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(|| SwapError::backend(AMOUNT_TOO_LARGE))?
            .round_dp(9);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        debug!("Simulated quote q-{}: {} {} -> {} {}", id, request.amount, request.from_token, to_amount, request.to_token);

        Ok(Quote {
            from_token: request.from_token.clone(),
            to_token: request.to_token.clone(),
            from_amount: request.amount,
            to_amount,
            price_impact: Decimal::new(1, 1),
            minimum_received,
            network_fee: None,
            quote_id: format!("q-{}", id),
            fetched_at: Utc::now(),
        })
    }

    async fn get_swap_estimate_fees(
        &self,
        _account: &str,
        _from_token: &str,
        _to_token: &str,
        _amount: Decimal,
    ) -> Result<Decimal, SwapError> {
        self.counters.fees.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.fee_result.lock().clone()
    }

    async fn execute_swap(
        &self,
        _account: &str,
        request: &ExecuteSwapRequest,
    ) -> Result<SwapSubmission, SwapError> {
        self.counters.executions.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(err) = self.execute_error.lock().clone() {
            return Err(err);
        }

        let signature = format!("sim-{}-{}", request.quote_id, self.next_id.fetch_add(1, Ordering::SeqCst));
        let template = self.status_template.lock().clone();
        self.script_status(&signature, template);
        Ok(SwapSubmission { signature })
    }

    async fn get_swap_status(&self, _account: &str, signature: &str) -> Result<SwapStatusResponse, SwapError> {
        self.counters.statuses.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let mut scripts = self.status_scripts.lock();
        let script = scripts.get_mut(signature).ok_or(SwapError::NotFound)?;
        if script.len() > 1 {
            script.pop_front().unwrap_or(Err(SwapError::NotFound))
        } else {
            script.front().cloned().unwrap_or(Err(SwapError::NotFound))
        }
    }

    async fn get_token_prices(
        &self,
        _account: &str,
        addresses: &[String],
    ) -> Result<HashMap<String, TokenPrice>, SwapError> {
        self.counters.prices.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(err) = self.price_error.lock().clone() {
            return Err(err);
        }

        let table = self.prices_usd.lock();
        Ok(addresses
            .iter()
            .filter_map(|address| {
                table.get(address).map(|price| {
                    (
                        address.clone(),
                        TokenPrice {
                            address: address.clone(),
                            price_usd: *price,
                            change_24h: None,
                        },
                    )
                })
            })
            .collect())
    }

    async fn get_token_balances(&self, _account: &str) -> Result<Vec<TokenBalance>, SwapError> {
        self.counters.balances.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(err) = self.balance_error.lock().clone() {
            return Err(err);
        }
        Ok(self.balances.lock().clone())
    }
}
