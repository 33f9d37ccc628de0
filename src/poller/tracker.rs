//! Transaction Poller - bounded-retry confirmation tracking
//!
//! Purpose:
//!     Follows a submitted swap from its signature to a terminal outcome and
//!     reports progress through status events and the notification slot.
//!
//! Created: 2026-10-19
//!
//! Design:
//!     - One poll per signature: `track` on a signature already being polled
//!       is a no-op, unrelated signatures poll independently
//!     - One immediate check, then up to `attempt_budget` checks every
//!       `poll_interval`; budget exhausted while pending → Unknown
//!     - Pending / not-yet-visible responses keep polling; network and server
//!       errors count against the budget and `max_consecutive_errors` of them
//!       in a row end the poll as Unknown
//!     - Hard deadline of `(attempt_budget + 1) * poll_interval` so a hung
//!       status call cannot stretch the poll
//!     - Context switch or `cancel` stops observation and releases the lock;
//!       the on-chain transaction itself is not touched
//!     - The terminal event is emitted before the post-confirmation balance
//!       refresh, which is bounded by `BALANCE_REFRESH_TIMEOUT`

use super::balances::BalanceRefresher;
use super::state::{classify, CheckOutcome, PollOutcome, StatusEvent, TransactionRecord, TxState};
use crate::backend::SwapBackend;
use crate::config::PollerConfig;
use crate::error::SwapError;
use crate::guard::{ContextListener, GenerationToken, SwapContext};
use crate::notify::{NotificationCoordinator, ToastKind};
use crate::types::AccountId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

pub const PROCESSING_TEXT: &str = "Processing swap...";
pub const CONFIRMED_TEXT: &str = "Swap confirmed";
pub const CONFIRMED_REFRESH_MANUALLY_TEXT: &str = "Swap confirmed. Refresh your balance manually.";

/// Upper bound on the best-effort balance refresh after a confirmation
pub const BALANCE_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

const EVENT_CHANNEL_CAPACITY: usize = 64;

struct ActivePoll {
    id: u64,
    record: TransactionRecord,
    cancel: watch::Sender<bool>,
}

struct PollerInner<B: SwapBackend> {
    backend: Arc<B>,
    context: Arc<SwapContext>,
    notifier: Arc<NotificationCoordinator>,
    refresher: Arc<dyn BalanceRefresher>,
    config: PollerConfig,
    active: DashMap<String, ActivePoll>,
    next_poll_id: AtomicU64,
    events: broadcast::Sender<StatusEvent>,
}

pub struct TransactionPoller<B: SwapBackend + 'static> {
    inner: Arc<PollerInner<B>>,
}

impl<B: SwapBackend + 'static> TransactionPoller<B> {
    pub fn new(
        backend: Arc<B>,
        context: Arc<SwapContext>,
        notifier: Arc<NotificationCoordinator>,
        refresher: Arc<dyn BalanceRefresher>,
        config: PollerConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let inner = Arc::new(PollerInner {
            backend,
            context: Arc::clone(&context),
            notifier,
            refresher,
            config,
            active: DashMap::new(),
            next_poll_id: AtomicU64::new(1),
            events,
        });

        let listener: Weak<dyn ContextListener> = Arc::downgrade(&inner) as Weak<dyn ContextListener>;
        context.register(listener);

        Self { inner }
    }

    /// Start tracking `signature`. Returns `false` (and does nothing) when the
    /// signature is already being tracked or is empty.
    pub fn track(&self, signature: &str) -> bool {
        let signature = signature.trim();
        if signature.is_empty() {
            warn!("Ignoring track request with empty signature");
            return false;
        }

        // Captured before taking the lock: a switch after this point cancels the poll
        let (account, token) = self.inner.context.capture();
        let poll_id = self.inner.next_poll_id.fetch_add(1, Ordering::SeqCst);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        match self.inner.active.entry(signature.to_string()) {
            Entry::Occupied(existing) => {
                debug!(
                    "Already tracking {} ({}), ignoring duplicate track",
                    signature,
                    existing.get().record.state
                );
                return false;
            }
            Entry::Vacant(slot) => {
                let mut record = TransactionRecord::new(signature);
                record.state = TxState::Submitted;
                slot.insert(ActivePoll {
                    id: poll_id,
                    record,
                    cancel: cancel_tx,
                });
            }
        }

        info!("Tracking swap {} (poll #{})", signature, poll_id);
        self.inner.emit(signature, TxState::Submitted, None);

        let inner = Arc::clone(&self.inner);
        let signature = signature.to_string();
        tokio::spawn(async move {
            inner.run(signature, poll_id, account, token, cancel_rx).await;
        });
        true
    }

    /// Stop observing `signature`. The transaction itself is unaffected.
    pub fn cancel(&self, signature: &str) -> bool {
        self.inner.cancel(signature)
    }

    /// Stop every active poll
    pub fn cancel_all(&self) -> usize {
        self.inner.cancel_all()
    }

    /// `statusChanged` events
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.inner.events.subscribe()
    }

    pub fn status_stream(&self) -> BroadcastStream<StatusEvent> {
        BroadcastStream::new(self.subscribe())
    }

    /// State of an active poll; `None` once terminal or cancelled
    pub fn state(&self, signature: &str) -> Option<TxState> {
        self.inner.active.get(signature).map(|poll| poll.record.state)
    }

    pub fn record(&self, signature: &str) -> Option<TransactionRecord> {
        self.inner.active.get(signature).map(|poll| poll.record.clone())
    }

    pub fn is_tracking(&self, signature: &str) -> bool {
        self.inner.active.contains_key(signature)
    }

    pub fn active_count(&self) -> usize {
        self.inner.active.len()
    }
}

impl<B: SwapBackend + 'static> Drop for TransactionPoller<B> {
    fn drop(&mut self) {
        self.inner.cancel_all();
    }
}

impl<B: SwapBackend> ContextListener for PollerInner<B> {
    fn on_context_switch(&self, generation: u64) {
        let stopped = self.cancel_all();
        if stopped > 0 {
            info!("Context switch (generation {}): stopped {} poll(s)", generation, stopped);
        }
    }
}

impl<B: SwapBackend> PollerInner<B> {
    async fn run(
        self: Arc<Self>,
        signature: String,
        poll_id: u64,
        account: AccountId,
        token: GenerationToken,
        mut cancel: watch::Receiver<bool>,
    ) {
        // Cancelled before the task got to run
        if !self.update(&signature, poll_id, |record| record.state = TxState::Polling) {
            debug!("Poll #{} for {} cancelled before start", poll_id, signature);
            return;
        }
        self.emit(&signature, TxState::Polling, None);
        if token.is_current() {
            self.notifier.show(ToastKind::Pending, PROCESSING_TEXT);
        }

        let outcome = tokio::select! {
            biased;
            _ = wait_for_cancel(&mut cancel) => None,
            _ = token.cancelled() => None,
            outcome = self.poll_until_terminal(&account, &signature, poll_id) => Some(outcome),
        };

        match outcome {
            Some(outcome) => self.finish(&account, &signature, poll_id, &token, outcome).await,
            None => {
                self.release(&signature, poll_id);
                self.clear_processing_toast();
                info!("Stopped observing {} before a terminal state", signature);
            }
        }
    }

    /// Drop the progress message once nothing is being polled
    fn clear_processing_toast(&self) {
        if !self.active.is_empty() {
            return;
        }
        let processing = self
            .notifier
            .current()
            .map(|message| message.same_content(ToastKind::Pending, PROCESSING_TEXT))
            .unwrap_or(false);
        if processing {
            self.notifier.hide();
        }
    }

    async fn poll_until_terminal(&self, account: &str, signature: &str, poll_id: u64) -> PollOutcome {
        let deadline = match Instant::now().checked_add(self.config.max_tracking_time()) {
            Some(deadline) => deadline,
            None => return self.check_loop(account, signature, poll_id).await,
        };
        match tokio::time::timeout_at(deadline, self.check_loop(account, signature, poll_id)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Tracking deadline reached for {}", signature);
                PollOutcome::unknown("tracking deadline reached")
            }
        }
    }

    async fn check_loop(&self, account: &str, signature: &str, poll_id: u64) -> PollOutcome {
        let interval = self.config.poll_interval();
        let mut remaining = self.config.attempt_budget;
        let mut consecutive_errors = 0u32;

        loop {
            let result = self.backend.get_swap_status(account, signature).await;
            self.update(signature, poll_id, |record| record.attempts_used += 1);

            match classify(result) {
                CheckOutcome::Confirmed => return PollOutcome::confirmed(),
                CheckOutcome::Failed(detail) => return PollOutcome::failed(detail),
                CheckOutcome::Pending => {
                    consecutive_errors = 0;
                    debug!("{} still pending ({} checks left)", signature, remaining);
                }
                CheckOutcome::SoftError(err) => {
                    consecutive_errors += 1;
                    warn!(
                        "Status check for {} failed ({}/{} in a row): {}",
                        signature, consecutive_errors, self.config.max_consecutive_errors, err
                    );
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        return PollOutcome::unknown(format!("{} consecutive status errors", consecutive_errors));
                    }
                }
            }

            if remaining == 0 {
                return PollOutcome::unknown("attempt budget exhausted");
            }
            remaining -= 1;
            tokio::time::sleep(interval).await;
        }
    }

    async fn finish(
        &self,
        account: &str,
        signature: &str,
        poll_id: u64,
        token: &GenerationToken,
        outcome: PollOutcome,
    ) {
        if !token.is_current() {
            self.release(signature, poll_id);
            self.clear_processing_toast();
            return;
        }

        info!("Swap {} finished: {} {:?}", signature, outcome.state, outcome.detail);

        match outcome.state {
            TxState::Confirmed => {
                // Terminal first: the refresh never holds the lock or delays the event
                self.release(signature, poll_id);
                self.emit(signature, TxState::Confirmed, outcome.detail);

                let refresh = tokio::time::timeout(
                    BALANCE_REFRESH_TIMEOUT,
                    self.refresher.refresh_balances(account),
                );
                let text = match token.run(refresh).await {
                    Some(Ok(Ok(()))) => CONFIRMED_TEXT,
                    Some(Ok(Err(err))) => {
                        warn!("Balance refresh after {} failed: {}", signature, err);
                        CONFIRMED_REFRESH_MANUALLY_TEXT
                    }
                    Some(Err(_)) => {
                        warn!(
                            "Balance refresh after {} timed out after {:?}",
                            signature, BALANCE_REFRESH_TIMEOUT
                        );
                        CONFIRMED_REFRESH_MANUALLY_TEXT
                    }
                    None => {
                        self.clear_processing_toast();
                        return;
                    }
                };
                self.notifier.show(ToastKind::Success, text);
            }
            TxState::Failed => {
                let detail = outcome
                    .detail
                    .clone()
                    .unwrap_or_else(|| "transaction was rejected".to_string());
                self.notifier
                    .show(ToastKind::Error, SwapError::ChainExecution(detail).user_message());
                // Released before the event so observers can re-track immediately
                self.release(signature, poll_id);
                self.emit(signature, outcome.state, outcome.detail);
            }
            _ => {
                self.notifier
                    .show(ToastKind::Info, SwapError::TimeoutAmbiguous.user_message());
                self.release(signature, poll_id);
                self.emit(signature, outcome.state, outcome.detail);
            }
        }
    }

    /// Returns `false` when the poll is no longer registered
    fn update(&self, signature: &str, poll_id: u64, apply: impl FnOnce(&mut TransactionRecord)) -> bool {
        match self.active.get_mut(signature) {
            Some(mut poll) if poll.id == poll_id => {
                apply(&mut poll.record);
                true
            }
            _ => false,
        }
    }

    fn release(&self, signature: &str, poll_id: u64) {
        self.active.remove_if(signature, |_, poll| poll.id == poll_id);
    }

    fn cancel(&self, signature: &str) -> bool {
        match self.active.remove(signature) {
            Some((_, poll)) => {
                poll.cancel.send_replace(true);
                info!("Cancelled tracking of {}", signature);
                true
            }
            None => false,
        }
    }

    fn cancel_all(&self) -> usize {
        let mut stopped = 0;
        self.active.retain(|_, poll| {
            poll.cancel.send_replace(true);
            stopped += 1;
            false
        });
        stopped
    }

    fn emit(&self, signature: &str, state: TxState, detail: Option<String>) {
        let _ = self.events.send(StatusEvent {
            signature: signature.to_string(),
            state,
            detail,
        });
    }
}

/// Resolves when cancellation is requested or the poll's entry is dropped
async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockSwapBackend;
    use crate::notify::{ToastDurations, ToastEvent};
    use crate::poller::balances::MockBalanceRefresher;
    use crate::types::SwapStatusResponse;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn scripted_backend(script: Vec<Result<SwapStatusResponse, SwapError>>) -> (MockSwapBackend, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut backend = MockSwapBackend::new();
        backend.expect_get_swap_status().returning(move |_, _| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            script[n.min(script.len() - 1)].clone()
        });
        (backend, calls)
    }

    fn refresher_ok() -> (MockBalanceRefresher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut refresher = MockBalanceRefresher::new();
        refresher.expect_refresh_balances().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (refresher, calls)
    }

    struct Harness {
        poller: TransactionPoller<MockSwapBackend>,
        context: Arc<SwapContext>,
        notifier: Arc<NotificationCoordinator>,
    }

    fn harness(backend: MockSwapBackend, refresher: MockBalanceRefresher) -> Harness {
        let context = Arc::new(SwapContext::new("acct-1"));
        let notifier = Arc::new(NotificationCoordinator::new(ToastDurations::default()));
        let poller = TransactionPoller::new(
            Arc::new(backend),
            Arc::clone(&context),
            Arc::clone(&notifier),
            Arc::new(refresher),
            PollerConfig::default(),
        );
        Harness { poller, context, notifier }
    }

    async fn wait_terminal(events: &mut broadcast::Receiver<StatusEvent>) -> StatusEvent {
        loop {
            let event = events.recv().await.unwrap();
            if event.state.is_terminal() {
                return event;
            }
        }
    }

    fn count_shown(events: &mut broadcast::Receiver<ToastEvent>, kind: ToastKind) -> usize {
        let mut count = 0;
        while let Ok(event) = events.try_recv() {
            if let ToastEvent::Shown(message) = event {
                if message.kind == kind {
                    count += 1;
                }
            }
        }
        count
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_after_pending_checks() {
        let (backend, status_calls) = scripted_backend(vec![
            Ok(SwapStatusResponse::pending()),
            Ok(SwapStatusResponse::pending()),
            Ok(SwapStatusResponse::confirmed()),
        ]);
        let (refresher, refreshes) = refresher_ok();
        let h = harness(backend, refresher);
        let mut events = h.poller.subscribe();
        let mut toasts = h.notifier.events();

        assert!(h.poller.track("abc123"));
        let terminal = wait_terminal(&mut events).await;

        assert_eq!(terminal.signature, "abc123");
        assert_eq!(terminal.state, TxState::Confirmed);
        assert_eq!(status_calls.load(Ordering::SeqCst), 3);
        // The success message follows the balance refresh
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(count_shown(&mut toasts, ToastKind::Success), 1);
        assert_eq!(h.notifier.current().unwrap().text, CONFIRMED_TEXT);
        assert!(!h.poller.is_tracking("abc123"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhausted_reports_unknown() {
        let (backend, status_calls) = scripted_backend(vec![Ok(SwapStatusResponse::pending())]);
        let (refresher, refreshes) = refresher_ok();
        let h = harness(backend, refresher);
        let mut events = h.poller.subscribe();

        let started = Instant::now();
        assert!(h.poller.track("xyz"));
        let terminal = wait_terminal(&mut events).await;

        assert_eq!(terminal.state, TxState::Unknown);
        assert_eq!(status_calls.load(Ordering::SeqCst), 7);
        assert!(started.elapsed() <= PollerConfig::default().max_tracking_time());
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
        let toast = h.notifier.current().unwrap();
        assert_eq!(toast.kind, ToastKind::Info);
        assert!(toast.text.contains("Check history later"));

        // The lock is released, so the same signature can be tracked again
        assert!(h.poller.track("xyz"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_track_is_noop() {
        let (backend, _) = scripted_backend(vec![Ok(SwapStatusResponse::pending())]);
        let (refresher, _) = refresher_ok();
        let h = harness(backend, refresher);

        assert!(h.poller.track("abc123"));
        assert!(!h.poller.track("abc123"));
        assert!(h.poller.track("other"));
        assert_eq!(h.poller.active_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_is_terminal_without_retry() {
        let (backend, status_calls) = scripted_backend(vec![
            Ok(SwapStatusResponse::pending()),
            Ok(SwapStatusResponse::failed("slippage tolerance exceeded")),
        ]);
        let (refresher, refreshes) = refresher_ok();
        let h = harness(backend, refresher);
        let mut events = h.poller.subscribe();

        h.poller.track("sig-fail");
        let terminal = wait_terminal(&mut events).await;

        assert_eq!(terminal.state, TxState::Failed);
        assert_eq!(terminal.detail.as_deref(), Some("slippage tolerance exceeded"));
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(status_calls.load(Ordering::SeqCst), 2);
        let toast = h.notifier.current();
        assert!(toast.is_none() || toast.unwrap().kind == ToastKind::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_errors_end_early() {
        let (backend, status_calls) =
            scripted_backend(vec![Err(SwapError::Network("connection reset".into()))]);
        let (refresher, _) = refresher_ok();
        let h = harness(backend, refresher);
        let mut events = h.poller.subscribe();

        h.poller.track("sig-err");
        let terminal = wait_terminal(&mut events).await;

        assert_eq!(terminal.state, TxState::Unknown);
        assert_eq!(status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_counts_as_pending() {
        let (backend, _) = scripted_backend(vec![
            Err(SwapError::NotFound),
            Err(SwapError::NotFound),
            Err(SwapError::NotFound),
            Ok(SwapStatusResponse::confirmed()),
        ]);
        let (refresher, _) = refresher_ok();
        let h = harness(backend, refresher);
        let mut events = h.poller.subscribe();

        h.poller.track("sig-late");
        assert_eq!(wait_terminal(&mut events).await.state, TxState::Confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_switch_stops_polling() {
        let (backend, status_calls) = scripted_backend(vec![Ok(SwapStatusResponse::pending())]);
        let (refresher, refreshes) = refresher_ok();
        let h = harness(backend, refresher);

        h.poller.track("abc123");
        tokio::time::sleep(Duration::from_secs(7)).await;
        let before = status_calls.load(Ordering::SeqCst);

        h.context.switch_account("acct-2");
        assert!(!h.poller.is_tracking("abc123"));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(status_calls.load(Ordering::SeqCst), before);
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
        assert!(h.notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_releases_signature() {
        let (backend, _) = scripted_backend(vec![Ok(SwapStatusResponse::pending())]);
        let (refresher, _) = refresher_ok();
        let h = harness(backend, refresher);

        h.poller.track("abc123");
        assert!(h.poller.cancel("abc123"));
        assert!(!h.poller.cancel("abc123"));
        assert!(h.poller.track("abc123"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_changes_wording() {
        let (backend, _) = scripted_backend(vec![Ok(SwapStatusResponse::confirmed())]);
        let mut refresher = MockBalanceRefresher::new();
        refresher
            .expect_refresh_balances()
            .returning(|_| Err(SwapError::Network("timeout".into())));
        let h = harness(backend, refresher);
        let mut events = h.poller.subscribe();

        h.poller.track("sig-ok");
        assert_eq!(wait_terminal(&mut events).await.state, TxState::Confirmed);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let toast = h.notifier.current().unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.text, CONFIRMED_REFRESH_MANUALLY_TEXT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_submitted_then_polling() {
        let (backend, _) = scripted_backend(vec![Ok(SwapStatusResponse::confirmed())]);
        let (refresher, _) = refresher_ok();
        let h = harness(backend, refresher);
        let mut events = h.poller.subscribe();

        h.poller.track("sig-seq");
        assert_eq!(events.recv().await.unwrap().state, TxState::Submitted);
        assert_eq!(events.recv().await.unwrap().state, TxState::Polling);
        assert_eq!(events.recv().await.unwrap().state, TxState::Confirmed);
    }

    /// Refresher whose balance call never completes
    struct StalledRefresher;

    #[async_trait::async_trait]
    impl BalanceRefresher for StalledRefresher {
        async fn refresh_balances(&self, _account: &str) -> Result<(), SwapError> {
            futures::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_refresh_does_not_block_terminal_state() {
        let (backend, _) = scripted_backend(vec![Ok(SwapStatusResponse::confirmed())]);
        let context = Arc::new(SwapContext::new("acct-1"));
        let notifier = Arc::new(NotificationCoordinator::new(ToastDurations::default()));
        let poller = TransactionPoller::new(
            Arc::new(backend),
            Arc::clone(&context),
            Arc::clone(&notifier),
            Arc::new(StalledRefresher),
            PollerConfig::default(),
        );
        let mut events = poller.subscribe();

        let started = Instant::now();
        assert!(poller.track("sig-stalled"));
        let terminal = wait_terminal(&mut events).await;

        assert_eq!(terminal.state, TxState::Confirmed);
        assert!(started.elapsed() <= PollerConfig::default().max_tracking_time());
        assert!(!poller.is_tracking("sig-stalled"));
        assert_eq!(poller.state("sig-stalled"), None);

        tokio::time::sleep(BALANCE_REFRESH_TIMEOUT + Duration::from_millis(100)).await;
        let toast = notifier.current().unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.text, CONFIRMED_REFRESH_MANUALLY_TEXT);

        assert!(poller.track("sig-stalled"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_status_call_hits_deadline() {
        let backend = crate::backend::SimulatedBackend::new().with_latency(Duration::from_secs(3600));
        let context = Arc::new(SwapContext::new("acct-1"));
        let notifier = Arc::new(NotificationCoordinator::new(ToastDurations::default()));
        let (refresher, refreshes) = refresher_ok();
        let config = PollerConfig::default();
        let poller = TransactionPoller::new(
            Arc::new(backend),
            context,
            Arc::clone(&notifier),
            Arc::new(refresher),
            config.clone(),
        );
        let mut events = poller.subscribe();

        let started = Instant::now();
        poller.track("sig-hung");
        let terminal = wait_terminal(&mut events).await;

        assert_eq!(terminal.state, TxState::Unknown);
        assert!(started.elapsed() <= config.max_tracking_time());
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
        assert!(notifier.current().unwrap().text.contains("Check history later"));
        assert!(!poller.is_tracking("sig-hung"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_start_emits_nothing_more() {
        let (backend, status_calls) = scripted_backend(vec![Ok(SwapStatusResponse::pending())]);
        let (refresher, _) = refresher_ok();
        let h = harness(backend, refresher);
        let mut events = h.poller.subscribe();

        assert!(h.poller.track("sig-early"));
        assert!(h.poller.cancel("sig-early"));
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(events.recv().await.unwrap().state, TxState::Submitted);
        assert!(events.try_recv().is_err());
        assert!(h.notifier.current().is_none());
        assert_eq!(status_calls.load(Ordering::SeqCst), 0);
    }
}
