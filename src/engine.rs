//! Swap Engine - component wiring for the swap screen
//!
//! Purpose:
//!     Owns one instance of each coordinator for an app session and exposes
//!     the input surface the UI layer drives: form edits, focus/blur,
//!     account switches and swap execution.
//!
//! Created: 2026-10-19
//!
//! Data flow:
//!     on_input_change → QuoteCoordinator (debounce → quote → fee)
//!     execute_swap    → backend.execute_swap → TransactionPoller::track
//!     poller          → NotificationCoordinator + TokenListRefresher

use crate::backend::SwapBackend;
use crate::cache::PriceCache;
use crate::config::EngineConfig;
use crate::error::SwapError;
use crate::guard::SwapContext;
use crate::notify::{NotificationCoordinator, ToastDurations, ToastKind};
use crate::poller::{BalanceRefresher, TokenListRefresher, TransactionPoller};
use crate::quote::{PriceMap, QuoteCoordinator};
use crate::types::{AccountId, ExecuteSwapRequest};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub const SUBMITTING_TEXT: &str = "Submitting swap...";

pub struct SwapEngine<B: SwapBackend + 'static> {
    backend: Arc<B>,
    context: Arc<SwapContext>,
    notifier: Arc<NotificationCoordinator>,
    prices: PriceCache<PriceMap>,
    balances: Arc<TokenListRefresher<B>>,
    quotes: QuoteCoordinator<B>,
    poller: TransactionPoller<B>,
    executing: AtomicBool,
}

impl<B: SwapBackend + 'static> SwapEngine<B> {
    pub fn new(backend: Arc<B>, account: impl Into<AccountId>, config: &EngineConfig) -> Self {
        let context = Arc::new(SwapContext::new(account));
        let notifier = Arc::new(NotificationCoordinator::new(ToastDurations::from(
            &config.notifications,
        )));
        let prices = PriceCache::with_ttl(config.cache.ttl());
        let balances = Arc::new(TokenListRefresher::new(Arc::clone(&backend), Arc::clone(&context)));

        let quotes = QuoteCoordinator::new(
            Arc::clone(&backend),
            Arc::clone(&context),
            Arc::clone(&notifier),
            prices.clone(),
            config.quote.clone(),
        );
        let refresher: Arc<dyn BalanceRefresher> = balances.clone();
        let poller = TransactionPoller::new(
            Arc::clone(&backend),
            Arc::clone(&context),
            Arc::clone(&notifier),
            refresher,
            config.poller.clone(),
        );

        info!(
            "Swap engine ready for {} (debounce {:?}, poll every {:?} x{})",
            context.account(),
            config.quote.debounce(),
            config.poller.poll_interval(),
            config.poller.attempt_budget
        );

        Self {
            backend,
            context,
            notifier,
            prices,
            balances,
            quotes,
            poller,
            executing: AtomicBool::new(false),
        }
    }

    pub fn on_input_change(
        &self,
        amount: impl Into<String>,
        from_token: impl Into<String>,
        to_token: impl Into<String>,
        slippage: impl Into<String>,
    ) {
        self.quotes.on_input_change(amount, from_token, to_token, slippage);
    }

    /// Swap screen became active
    pub fn focus(&self) {
        self.quotes.start_price_refresh();
    }

    /// Swap screen left: suspend refreshes and invalidate in-flight work
    pub fn blur(&self) -> u64 {
        self.quotes.stop_price_refresh();
        self.context.leave()
    }

    pub fn switch_account(&self, account: impl Into<AccountId>) -> u64 {
        self.context.switch_account(account)
    }

    /// Submit the current quote and start tracking the resulting signature.
    ///
    /// Every failure is also reported through the notification slot.
    /// A context switch while the submission is in flight does not abort it;
    /// the signature is then returned as `Superseded` and not tracked.
    pub async fn execute_swap(&self, auth_secret: &str) -> Result<String, SwapError> {
        match self.submit(auth_secret).await {
            Ok(signature) => Ok(signature),
            Err(SwapError::Superseded) => {
                let submitting = self
                    .notifier
                    .current()
                    .map(|message| message.same_content(ToastKind::Pending, SUBMITTING_TEXT))
                    .unwrap_or(false);
                if submitting {
                    self.notifier.hide();
                }
                Err(SwapError::Superseded)
            }
            Err(err) => {
                warn!("Swap submission failed: {}", err);
                self.notifier.show(ToastKind::Error, err.user_message());
                Err(err)
            }
        }
    }

    async fn submit(&self, auth_secret: &str) -> Result<String, SwapError> {
        if auth_secret.trim().is_empty() {
            return Err(SwapError::MissingAuth);
        }
        let quote = self.quotes.current_quote().ok_or(SwapError::MissingQuote)?;
        let inputs = self.quotes.applied_inputs().ok_or(SwapError::MissingQuote)?;

        if self
            .executing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SwapError::InProgress);
        }
        let _executing = ExecutingFlag(&self.executing);

        let request = ExecuteSwapRequest {
            quote_id: quote.quote_id.clone(),
            from_token: quote.from_token.clone(),
            to_token: quote.to_token.clone(),
            amount: quote.from_amount,
            slippage: inputs.slippage,
            auth_secret: auth_secret.to_string(),
        };

        let (account, token) = self.context.capture();
        self.notifier.show(ToastKind::Pending, SUBMITTING_TEXT);
        info!(
            "Submitting swap {} {} -> {} (quote {})",
            request.amount, request.from_token, request.to_token, request.quote_id
        );

        let submission = self.backend.execute_swap(&account, &request).await;
        if !token.is_current() {
            info!("Swap submission for {} finished after a context switch", account);
            return Err(SwapError::Superseded);
        }

        let signature = submission?.signature;
        info!("Swap submitted: {}", signature);
        self.poller.track(&signature);
        Ok(signature)
    }

    /// Track a signature submitted elsewhere (e.g. resumed from history)
    pub fn track(&self, signature: &str) -> bool {
        self.poller.track(signature)
    }

    pub fn context(&self) -> &Arc<SwapContext> {
        &self.context
    }

    pub fn notifier(&self) -> &Arc<NotificationCoordinator> {
        &self.notifier
    }

    pub fn quotes(&self) -> &QuoteCoordinator<B> {
        &self.quotes
    }

    pub fn poller(&self) -> &TransactionPoller<B> {
        &self.poller
    }

    pub fn prices(&self) -> &PriceCache<PriceMap> {
        &self.prices
    }

    pub fn balances(&self) -> &Arc<TokenListRefresher<B>> {
        &self.balances
    }
}

struct ExecutingFlag<'a>(&'a AtomicBool);

impl Drop for ExecutingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
