//! Post-confirmation balance refresh
//!
//! After a swap confirms, the poller asks the token list to reload balances.
//! The refresh is best effort: its failure changes the wording of the success
//! message, never the transaction outcome.
//!
//! Created: 2026-10-19

use crate::backend::SwapBackend;
use crate::error::SwapError;
use crate::guard::SwapContext;
use crate::types::TokenBalance;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait BalanceRefresher: Send + Sync {
    async fn refresh_balances(&self, account: &str) -> Result<(), SwapError>;
}

/// Reloads balances through `getTokenBalances` and publishes them
pub struct TokenListRefresher<B: SwapBackend> {
    backend: Arc<B>,
    context: Arc<SwapContext>,
    balances: watch::Sender<Vec<TokenBalance>>,
}

impl<B: SwapBackend> TokenListRefresher<B> {
    pub fn new(backend: Arc<B>, context: Arc<SwapContext>) -> Self {
        let (balances, _) = watch::channel(Vec::new());
        Self {
            backend,
            context,
            balances,
        }
    }

    pub fn balances(&self) -> Vec<TokenBalance> {
        self.balances.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<TokenBalance>> {
        self.balances.subscribe()
    }
}

#[async_trait]
impl<B: SwapBackend> BalanceRefresher for TokenListRefresher<B> {
    async fn refresh_balances(&self, account: &str) -> Result<(), SwapError> {
        let (_, token) = self.context.capture();
        let fetched = match token.run(self.backend.get_token_balances(account)).await {
            Some(result) => result?,
            None => {
                debug!("Balance refresh for {} superseded", account);
                return Err(SwapError::Superseded);
            }
        };

        info!("Balances refreshed for {}: {} tokens", account, fetched.len());
        self.balances.send_replace(fetched);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimulatedBackend;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test(start_paused = true)]
    async fn test_refresh_publishes_balances() {
        let backend = Arc::new(
            SimulatedBackend::new()
                .with_latency(Duration::from_millis(50))
                .with_balance("USDC", "USDC", dec!(42.5)),
        );
        let context = Arc::new(SwapContext::new("acct-1"));
        let refresher = TokenListRefresher::new(Arc::clone(&backend), context);

        assert_ok!(refresher.refresh_balances("acct-1").await);
        assert_eq!(refresher.balances().len(), 1);
        assert_eq!(refresher.balances()[0].amount, dec!(42.5));
        assert_eq!(backend.calls().balances, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_error_propagates() {
        let backend = Arc::new(SimulatedBackend::new().with_latency(Duration::ZERO));
        backend.set_balance_error(Some(SwapError::Network("timeout".into())));
        let context = Arc::new(SwapContext::new("acct-1"));
        let refresher = TokenListRefresher::new(backend, context);

        let err = assert_err!(refresher.refresh_balances("acct-1").await);
        assert_eq!(err, SwapError::Network("timeout".into()));
        assert!(refresher.balances().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_switch_discards_balances() {
        let backend = Arc::new(
            SimulatedBackend::new()
                .with_latency(Duration::from_secs(1))
                .with_balance("SOL", "SOL", dec!(3)),
        );
        let context = Arc::new(SwapContext::new("acct-1"));
        let refresher = Arc::new(TokenListRefresher::new(backend, Arc::clone(&context)));

        let task = {
            let refresher = Arc::clone(&refresher);
            tokio::spawn(async move { refresher.refresh_balances("acct-1").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        context.switch_account("acct-2");

        let result = task.await.unwrap();
        assert_eq!(result, Err(SwapError::Superseded));
        assert!(refresher.balances().is_empty());
    }
}
