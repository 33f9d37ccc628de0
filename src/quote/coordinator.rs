//! Quote Coordinator - debounced quote and fee-estimate refresh
//!
//! Purpose:
//!     Turns form edits (amount, token pair, slippage) into at most one quote
//!     request per burst, publishes the quote as soon as it arrives and fills
//!     in the network fee afterwards.
//!
//! Created: 2026-10-19
//!
//! Design:
//!     - Trailing-edge debounce: only the last edit of a burst fires
//!     - Every fired request takes a sequence number and a generation token;
//!       a result is applied only if it is both the latest request and still
//!       in the current context; the check, the state change and the
//!       resulting events all happen under the state lock
//!     - Quote failures clear the quote and notify once; no automatic retry
//!     - Fee failures fall back to the configured placeholder fee
//!     - Auxiliary token prices refresh on an interval while the swap screen
//!       is focused; every tick forces a fetch through the price cache

use super::debounce::{debounce, Debouncer};
use super::validation::{validate, QuoteInput};
use crate::backend::SwapBackend;
use crate::cache::{PairKey, PriceCache};
use crate::config::QuoteConfig;
use crate::error::SwapError;
use crate::guard::{ContextListener, GenerationToken, SwapContext};
use crate::notify::{NotificationCoordinator, ToastKind};
use crate::types::{Quote, TokenPair, TokenPrice};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub type PriceMap = HashMap<String, TokenPrice>;

/// Events observed by the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteEvent {
    /// `quoteUpdated`: new quote, fee filled in, or cleared (`None`)
    Updated(Option<Quote>),
    /// `quoteError`: user-facing reason
    Error(String),
    PricesUpdated(PriceMap),
}

/// Last valid inputs, used for execution and the price refresh
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedInputs {
    pub pair: TokenPair,
    pub amount: Decimal,
    pub slippage: Decimal,
}

#[derive(Default)]
struct QuoteState {
    quote: Option<Quote>,
    inputs: Option<AppliedInputs>,
}

struct QuoteInner<B: SwapBackend> {
    backend: Arc<B>,
    context: Arc<SwapContext>,
    notifier: Arc<NotificationCoordinator>,
    prices: PriceCache<PriceMap>,
    config: QuoteConfig,
    state: Mutex<QuoteState>,
    latest_request: AtomicU64,
    debouncer: Debouncer<QuoteInput>,
    price_task: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<QuoteEvent>,
}

pub struct QuoteCoordinator<B: SwapBackend + 'static> {
    inner: Arc<QuoteInner<B>>,
}

impl<B: SwapBackend + 'static> QuoteCoordinator<B> {
    pub fn new(
        backend: Arc<B>,
        context: Arc<SwapContext>,
        notifier: Arc<NotificationCoordinator>,
        prices: PriceCache<PriceMap>,
        config: QuoteConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let delay = config.debounce();

        let inner = Arc::new_cyclic(|weak: &Weak<QuoteInner<B>>| {
            let weak = weak.clone();
            let debouncer = debounce(delay, move |input: QuoteInput| {
                let weak = weak.clone();
                async move {
                    if let Some(inner) = weak.upgrade() {
                        inner.fire(input).await;
                    }
                }
            });

            QuoteInner {
                backend,
                context: Arc::clone(&context),
                notifier,
                prices,
                config,
                state: Mutex::new(QuoteState::default()),
                latest_request: AtomicU64::new(0),
                debouncer,
                price_task: Mutex::new(None),
                events,
            }
        });

        let listener: Weak<dyn ContextListener> = Arc::downgrade(&inner) as Weak<dyn ContextListener>;
        context.register(listener);

        Self { inner }
    }

    /// `onInputChange`: restart the debounce timer with the latest form values
    pub fn on_input_change(
        &self,
        amount: impl Into<String>,
        from_token: impl Into<String>,
        to_token: impl Into<String>,
        slippage: impl Into<String>,
    ) {
        let input = QuoteInput::new(amount, from_token, to_token, slippage);
        debug!("Quote input changed: {} {}->{}", input.amount, input.from_token, input.to_token);
        self.inner.debouncer.trigger(input);
    }

    /// Drop a pending (not yet fired) input
    pub fn cancel_pending(&self) -> bool {
        self.inner.debouncer.cancel()
    }

    pub fn current_quote(&self) -> Option<Quote> {
        self.inner.state.lock().quote.clone()
    }

    pub fn applied_inputs(&self) -> Option<AppliedInputs> {
        self.inner.state.lock().inputs.clone()
    }

    /// Sequence number of the latest fired request (0 before the first)
    pub fn last_request(&self) -> u64 {
        self.inner.latest_request.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QuoteEvent> {
        self.inner.events.subscribe()
    }

    pub fn event_stream(&self) -> BroadcastStream<QuoteEvent> {
        BroadcastStream::new(self.subscribe())
    }

    /// Cached prices for the current pair, if fresh
    pub fn cached_prices(&self) -> Option<PriceMap> {
        let pair = self.inner.state.lock().inputs.as_ref().map(|i| i.pair.clone())?;
        self.inner.prices.peek(&PairKey::from_pair(&pair))
    }

    /// Start refreshing auxiliary prices on the configured interval.
    /// The first tick fires immediately. No-op if already running.
    pub fn start_price_refresh(&self) {
        let mut task = self.inner.price_task.lock();
        if task.as_ref().map(|t| !t.is_finished()).unwrap_or(false) {
            return;
        }

        let period = self.inner.config.price_refresh_interval();
        if period.is_zero() {
            warn!("Price refresh interval is zero, refresh disabled");
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        info!("Price refresh started (every {:?})", period);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(inner) => inner.refresh_prices().await,
                    None => break,
                }
            }
        }));
    }

    pub fn stop_price_refresh(&self) -> bool {
        match self.inner.price_task.lock().take() {
            Some(task) => {
                task.abort();
                info!("Price refresh suspended");
                true
            }
            None => false,
        }
    }

    pub fn is_refreshing_prices(&self) -> bool {
        self.inner
            .price_task
            .lock()
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }
}

impl<B: SwapBackend + 'static> Drop for QuoteCoordinator<B> {
    fn drop(&mut self) {
        self.inner.debouncer.cancel();
        if let Some(task) = self.inner.price_task.lock().take() {
            task.abort();
        }
    }
}

impl<B: SwapBackend> ContextListener for QuoteInner<B> {
    fn on_context_switch(&self, generation: u64) {
        self.debouncer.cancel();
        let mut state = self.state.lock();
        state.inputs = None;
        if state.quote.take().is_some() {
            debug!("Context switch (generation {}): quote cleared", generation);
            let _ = self.events.send(QuoteEvent::Updated(None));
        }
    }
}

impl<B: SwapBackend + 'static> QuoteInner<B> {
    async fn fire(self: Arc<Self>, input: QuoteInput) {
        let seq = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        let request = match validate(&input) {
            Ok(request) => request,
            Err(err) => {
                debug!("Quote input #{} rejected: {}", seq, err);
                self.clear_quote();
                if err == SwapError::SameToken {
                    self.notifier.show(ToastKind::Info, err.user_message());
                }
                return;
            }
        };

        let (account, token) = self.context.capture();
        {
            let mut state = self.state.lock();
            if !token.is_current() {
                return;
            }
            state.inputs = Some(AppliedInputs {
                pair: request.pair(),
                amount: request.amount,
                slippage: request.slippage,
            });
        }

        info!(
            "Requesting quote #{} (generation {}): {} {}",
            seq,
            token.generation(),
            request.amount,
            request.pair()
        );
        let result = match token.run(self.backend.get_swap_quote(&account, &request)).await {
            Some(result) => result,
            None => {
                debug!("Quote #{} discarded: context switched", seq);
                return;
            }
        };

        let quote = match result {
            Ok(quote) => quote,
            Err(err) => {
                let reason = err.user_message();
                let applied = self.apply(seq, &token, |state| {
                    state.quote = None;
                    self.notifier.show(ToastKind::Error, reason.clone());
                    vec![QuoteEvent::Updated(None), QuoteEvent::Error(reason.clone())]
                });
                if applied {
                    warn!("Quote #{} failed: {}", seq, err);
                }
                return;
            }
        };

        let quote_id = quote.quote_id.clone();
        let applied = self.apply(seq, &token, move |state| {
            state.quote = Some(quote.clone());
            vec![QuoteEvent::Updated(Some(quote))]
        });
        if !applied {
            debug!("Quote #{} discarded: superseded", seq);
            return;
        }

        let fee = match token
            .run(self.backend.get_swap_estimate_fees(
                &account,
                &request.from_token,
                &request.to_token,
                request.amount,
            ))
            .await
        {
            Some(Ok(fee)) => fee,
            Some(Err(err)) => {
                warn!(
                    "Fee estimate for {} failed ({}), using placeholder {}",
                    quote_id, err, self.config.fee_placeholder
                );
                self.config.fee_placeholder
            }
            None => return,
        };

        self.apply(seq, &token, |state| match state.quote.as_mut() {
            Some(quote) if quote.quote_id == quote_id => {
                quote.network_fee = Some(fee);
                debug!("Quote {} fee: {}", quote_id, fee);
                vec![QuoteEvent::Updated(Some(quote.clone()))]
            }
            _ => Vec::new(),
        });
    }

    /// Apply `update` if request `seq` is still the latest and its context
    /// current, then publish the events it returns before releasing the lock
    fn apply(
        &self,
        seq: u64,
        token: &GenerationToken,
        update: impl FnOnce(&mut QuoteState) -> Vec<QuoteEvent>,
    ) -> bool {
        let mut state = self.state.lock();
        if self.latest_request.load(Ordering::SeqCst) != seq || !token.is_current() {
            return false;
        }
        for event in update(&mut state) {
            let _ = self.events.send(event);
        }
        true
    }

    fn clear_quote(&self) {
        let mut state = self.state.lock();
        state.inputs = None;
        if state.quote.take().is_some() {
            let _ = self.events.send(QuoteEvent::Updated(None));
        }
    }

    async fn refresh_prices(&self) {
        let pair = match self.state.lock().inputs.as_ref() {
            Some(inputs) => inputs.pair.clone(),
            None => return,
        };

        let (account, token) = self.context.capture();
        let key = PairKey::from_pair(&pair);
        let backend = Arc::clone(&self.backend);
        let addresses = key.addresses();
        let fetcher = move || async move { backend.get_token_prices(&account, &addresses).await };

        match token.run(self.prices.refresh(&key, fetcher)).await {
            Some(Ok(cached)) => {
                if cached.is_stale() {
                    debug!("Showing stale prices for {}", key);
                }
                if token.is_current() {
                    let _ = self.events.send(QuoteEvent::PricesUpdated(cached.value));
                }
            }
            Some(Err(err)) => warn!("Price refresh for {} failed: {}", key, err),
            None => debug!("Price refresh for {} discarded: context switched", key),
        }
    }
}
