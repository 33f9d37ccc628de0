//! Generation Guard - fencing for asynchronous results
//!
//! Purpose:
//!     Every async operation that mutates UI-facing state captures the current
//!     generation when it is dispatched and checks it again right before it
//!     applies its result. A context switch (account change, leaving the swap
//!     screen) advances the generation, so late results from the old context
//!     are dropped with no side effect.
//!
//! Created: 2026-10-19
//!
//! Design:
//!     - Counter lives in a `watch` channel: reads are lock-free borrows and
//!       in-flight work can await a change instead of polling
//!     - `GenerationToken::run` drops the wrapped future as soon as the
//!       generation moves on, which aborts the underlying request
//!     - Listeners are notified synchronously from `advance()` and held weakly

use parking_lot::Mutex;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::debug;

/// Dependent state that must be cleared when the context switches
pub trait ContextListener: Send + Sync {
    fn on_context_switch(&self, generation: u64);
}

pub struct GenerationGuard {
    counter: watch::Sender<u64>,
    listeners: Mutex<Vec<Weak<dyn ContextListener>>>,
}

impl GenerationGuard {
    pub fn new() -> Self {
        let (counter, _) = watch::channel(0);
        Self {
            counter,
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn current_generation(&self) -> u64 {
        *self.counter.borrow()
    }

    pub fn is_current(&self, captured: u64) -> bool {
        self.current_generation() == captured
    }

    /// Advance to a new generation and clear dependent state.
    ///
    /// Listeners run before this returns, so nothing can be issued against
    /// the old context once `advance()` has completed.
    pub fn advance(&self) -> u64 {
        let mut next = 0;
        self.counter.send_modify(|generation| {
            *generation += 1;
            next = *generation;
        });
        debug!("Context switch: generation advanced to {}", next);

        // Snapshot outside the lock so listeners may register or advance re-entrantly
        let listeners: Vec<Arc<dyn ContextListener>> = {
            let mut guard = self.listeners.lock();
            guard.retain(|l| l.strong_count() > 0);
            guard.iter().filter_map(|l| l.upgrade()).collect()
        };
        for listener in listeners {
            listener.on_context_switch(next);
        }

        next
    }

    /// Register dependent state to be cleared on every `advance()`
    pub fn register(&self, listener: Weak<dyn ContextListener>) {
        self.listeners.lock().push(listener);
    }

    /// Capture the current generation for an operation about to be dispatched
    pub fn token(&self) -> GenerationToken {
        let receiver = self.counter.subscribe();
        let generation = *receiver.borrow();
        GenerationToken { generation, receiver }
    }
}

impl Default for GenerationGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Generation captured at dispatch time
#[derive(Clone)]
pub struct GenerationToken {
    generation: u64,
    receiver: watch::Receiver<u64>,
}

impl GenerationToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        *self.receiver.borrow() == self.generation
    }

    /// Resolves once the captured generation has been superseded.
    /// A dropped guard counts as superseded.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() != self.generation {
                return;
            }
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }

    /// Run `fut` unless the context switches first.
    ///
    /// Returns `None` (and drops `fut`, aborting its I/O) when superseded,
    /// including when the switch happens just as `fut` completes.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let output = tokio::select! {
            biased;
            _ = self.cancelled() => return None,
            output = fut => output,
        };

        if self.is_current() {
            Some(output)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    struct Recorder {
        seen: AtomicU64,
    }

    impl ContextListener for Recorder {
        fn on_context_switch(&self, generation: u64) {
            self.seen.store(generation, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_advance_is_monotonic() {
        let guard = GenerationGuard::new();
        assert_eq!(guard.current_generation(), 0);
        assert_eq!(guard.advance(), 1);
        assert_eq!(guard.advance(), 2);
        assert!(guard.is_current(2));
        assert!(!guard.is_current(1));
    }

    #[test]
    fn test_listeners_run_synchronously() {
        let guard = GenerationGuard::new();
        let recorder = Arc::new(Recorder { seen: AtomicU64::new(0) });
        let weak: Weak<dyn ContextListener> = Arc::downgrade(&recorder) as Weak<dyn ContextListener>;
        guard.register(weak);

        guard.advance();
        assert_eq!(recorder.seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let guard = GenerationGuard::new();
        {
            let recorder = Arc::new(Recorder { seen: AtomicU64::new(0) });
            guard.register(Arc::downgrade(&recorder) as Weak<dyn ContextListener>);
        }
        guard.advance();
        assert!(guard.listeners.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_output_when_current() {
        let guard = GenerationGuard::new();
        let token = guard.token();
        let out = token.run(async { 42 }).await;
        assert_eq!(out, Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_aborts_on_context_switch() {
        let guard = Arc::new(GenerationGuard::new());
        let token = guard.token();

        let switcher = Arc::clone(&guard);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            switcher.advance();
        });

        let out = token
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "late response"
            })
            .await;
        assert_eq!(out, None);
        assert!(!token.is_current());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_token_discards_immediately() {
        let guard = GenerationGuard::new();
        let token = guard.token();
        guard.advance();
        assert_eq!(token.run(async { 1 }).await, None);
    }
}
