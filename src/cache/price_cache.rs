//! Price Cache - TTL-bounded, single-flight, stale-on-error
//!
//! Purpose:
//!     Token prices shown next to a quote are refreshed often but change slowly.
//!     Entries are served without a network call while fresh; concurrent
//!     callers for the same key share one fetch; a failed refresh falls back
//!     to the expired value instead of surfacing the error.
//!
//! Created: 2026-10-19
//!
//! Design:
//!     - Key: canonical token-pair / address-set encoding (see `PairKey`)
//!     - Fresh: `now - fetched_at < ttl` → returned synchronously
//!     - In flight: callers join the same `Shared` future
//!     - Refresh failed + entry present → stale value, error swallowed
//!     - Refresh failed + no entry → error propagated to the caller
//!     - An expired entry is never returned without a refresh attempt first

use super::key::PairKey;
use crate::error::SwapError;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default entry lifetime (seconds in the wallet, but only the ratio matters)
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

type SharedFetch<V> = Shared<BoxFuture<'static, Result<CachedValue<V>, SwapError>>>;

/// A cached value with its age; never partially mutated, only replaced
#[derive(Debug, Clone)]
pub struct PriceCacheEntry<V> {
    pub key: PairKey,
    pub value: V,
    pub fetched_at: Instant,
    pub ttl: Duration,
}

impl<V> PriceCacheEntry<V> {
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }
}

/// Where a returned value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// Unexpired entry, no network call
    Fresh,
    /// Just fetched (by this caller or a joined in-flight fetch)
    Fetched,
    /// Expired entry returned because the refresh attempt failed
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue<V> {
    pub value: V,
    pub source: CacheSource,
}

impl<V> CachedValue<V> {
    pub fn is_stale(&self) -> bool {
        self.source == CacheSource::Stale
    }
}

/// Cache counters for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Callers that joined a fetch already in flight
    pub joined: u64,
    pub fetches: u64,
    pub failures: u64,
    pub stale_served: u64,
}

struct CacheState<V> {
    entries: HashMap<PairKey, PriceCacheEntry<V>>,
    in_flight: HashMap<PairKey, SharedFetch<V>>,
    stats: CacheStats,
}

struct CacheInner<V> {
    ttl: Duration,
    state: Mutex<CacheState<V>>,
}

pub struct PriceCache<V> {
    inner: Arc<CacheInner<V>>,
}

impl<V> Clone for PriceCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> PriceCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                ttl,
                state: Mutex::new(CacheState {
                    entries: HashMap::new(),
                    in_flight: HashMap::new(),
                    stats: CacheStats::default(),
                }),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Return the value for `key`, calling `fetcher` only when needed.
    pub async fn get<F, Fut>(&self, key: &PairKey, fetcher: F) -> Result<CachedValue<V>, SwapError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, SwapError>> + Send + 'static,
    {
        self.resolve(key, fetcher, true).await
    }

    /// Attempt a fetch even if the entry is still fresh (scheduled refreshes).
    /// Joins a fetch already in flight and falls back to the stored value on failure.
    pub async fn refresh<F, Fut>(&self, key: &PairKey, fetcher: F) -> Result<CachedValue<V>, SwapError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, SwapError>> + Send + 'static,
    {
        self.resolve(key, fetcher, false).await
    }

    async fn resolve<F, Fut>(
        &self,
        key: &PairKey,
        fetcher: F,
        serve_fresh: bool,
    ) -> Result<CachedValue<V>, SwapError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, SwapError>> + Send + 'static,
    {
        let fetch = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            let now = Instant::now();

            let fresh = state
                .entries
                .get(key)
                .filter(|entry| serve_fresh && entry.is_fresh(now))
                .map(|entry| entry.value.clone());
            if let Some(value) = fresh {
                state.stats.hits += 1;
                debug!("Price cache hit: {}", key);
                return Ok(CachedValue { value, source: CacheSource::Fresh });
            }

            if let Some(pending) = state.in_flight.get(key).cloned() {
                state.stats.joined += 1;
                debug!("Price cache: joining in-flight fetch for {}", key);
                pending
            } else {
                state.stats.misses += 1;
                debug!("Price cache miss: {}", key);
                let fetch = self.start_fetch(key.clone(), fetcher);
                state.in_flight.insert(key.clone(), fetch.clone());
                fetch
            }
        };

        fetch.await
    }

    /// Fresh value for `key`, if any. Never fetches.
    pub fn peek(&self, key: &PairKey) -> Option<V> {
        let state = self.inner.state.lock();
        let now = Instant::now();
        state
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone())
    }

    pub fn invalidate(&self, key: &PairKey) -> bool {
        self.inner.state.lock().entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.inner.state.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.state.lock().stats
    }

    fn start_fetch<F, Fut>(&self, key: PairKey, fetcher: F) -> SharedFetch<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, SwapError>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        async move {
            let outcome = fetcher().await;
            inner.complete(&key, outcome)
        }
        .boxed()
        .shared()
    }
}

impl<V> Default for PriceCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> CacheInner<V> {
    fn complete(&self, key: &PairKey, outcome: Result<V, SwapError>) -> Result<CachedValue<V>, SwapError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.in_flight.remove(key);

        match outcome {
            Ok(value) => {
                state.stats.fetches += 1;
                state.entries.insert(
                    key.clone(),
                    PriceCacheEntry {
                        key: key.clone(),
                        value: value.clone(),
                        fetched_at: Instant::now(),
                        ttl: self.ttl,
                    },
                );
                Ok(CachedValue { value, source: CacheSource::Fetched })
            }
            Err(err) => {
                state.stats.failures += 1;
                match state.entries.get(key) {
                    Some(entry) => {
                        state.stats.stale_served += 1;
                        warn!("Price refresh failed for {} ({}), serving stale value", key, err);
                        Ok(CachedValue {
                            value: entry.value.clone(),
                            source: CacheSource::Stale,
                        })
                    }
                    None => {
                        warn!("Price fetch failed for {} with nothing cached: {}", key, err);
                        Err(err)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    fn key() -> PairKey {
        PairKey::from_addresses(["SOL", "USDC"])
    }

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        result: Result<u64, SwapError>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u64, SwapError>> + Send + 'static {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                result
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_served_without_fetch() {
        let cache = PriceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = assert_ok!(cache.get(&key(), counting_fetch(&calls, Ok(100))).await);
        assert_eq!(first.source, CacheSource::Fetched);

        tokio::time::advance(Duration::from_secs(30)).await;
        let second = assert_ok!(cache.get(&key(), counting_fetch(&calls, Ok(200))).await);
        assert_eq!(second.source, CacheSource::Fresh);
        assert_eq!(second.value, 100);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_refreshed() {
        let cache = PriceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        assert_ok!(cache.get(&key(), counting_fetch(&calls, Ok(100))).await);
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.peek(&key()).is_none());

        let refreshed = assert_ok!(cache.get(&key(), counting_fetch(&calls, Ok(150))).await);
        assert_eq!(refreshed.source, CacheSource::Fetched);
        assert_eq!(refreshed.value, 150);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache = PriceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let k = key();
        let (a, b, c) = tokio::join!(
            cache.get(&k, counting_fetch(&calls, Ok(7))),
            cache.get(&k, counting_fetch(&calls, Ok(8))),
            cache.get(&k, counting_fetch(&calls, Ok(9))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in [a, b, c] {
            let value = assert_ok!(result);
            assert_eq!(value.value, 7);
            assert_eq!(value.source, CacheSource::Fetched);
        }
        assert_eq!(cache.stats().joined, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_served_once_per_failed_refresh() {
        let cache = PriceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        assert_ok!(cache.get(&key(), counting_fetch(&calls, Ok(100))).await);
        tokio::time::advance(Duration::from_secs(90)).await;

        let down = || Err(SwapError::Network("timeout".into()));
        let stale = assert_ok!(cache.get(&key(), counting_fetch(&calls, down())).await);
        assert!(stale.is_stale());
        assert_eq!(stale.value, 100);
        assert_eq!(cache.stats().stale_served, 1);

        // Still expired: the next read attempts another refresh before falling back
        let again = assert_ok!(cache.get(&key(), counting_fetch(&calls, down())).await);
        assert!(again.is_stale());
        assert_eq!(cache.stats().stale_served, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let recovered = assert_ok!(cache.get(&key(), counting_fetch(&calls, Ok(120))).await);
        assert_eq!(recovered.source, CacheSource::Fetched);
        assert_eq!(recovered.value, 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_without_entry_propagates() {
        let cache: PriceCache<u64> = PriceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let err = assert_err!(
            cache
                .get(&key(), counting_fetch(&calls, Err(SwapError::Network("refused".into()))))
                .await
        );
        assert_eq!(err, SwapError::Network("refused".into()));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_fetch() {
        let cache = PriceCache::with_ttl(Duration::from_secs(10));
        let calls = Arc::new(AtomicUsize::new(0));

        assert_ok!(cache.get(&key(), counting_fetch(&calls, Ok(1))).await);
        assert!(cache.invalidate(&key()));
        let value = assert_ok!(cache.get(&key(), counting_fetch(&calls, Ok(2))).await);
        assert_eq!(value.value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_fetches_while_fresh() {
        let cache = PriceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        assert_ok!(cache.get(&key(), counting_fetch(&calls, Ok(100))).await);
        tokio::time::advance(Duration::from_secs(5)).await;

        let refreshed = assert_ok!(cache.refresh(&key(), counting_fetch(&calls, Ok(105))).await);
        assert_eq!(refreshed.source, CacheSource::Fetched);
        assert_eq!(refreshed.value, 105);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.peek(&key()), Some(105));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_previous_value() {
        let cache = PriceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        assert_ok!(cache.get(&key(), counting_fetch(&calls, Ok(100))).await);
        let fallback = assert_ok!(
            cache
                .refresh(&key(), counting_fetch(&calls, Err(SwapError::Network("reset".into()))))
                .await
        );
        assert!(fallback.is_stale());
        assert_eq!(fallback.value, 100);
        assert_eq!(cache.stats().stale_served, 1);
    }
}
