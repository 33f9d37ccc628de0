//! Debounced executor
//!
//! `debounce(delay, action)` returns a handle whose `trigger(args)` restarts a
//! single pending timer; only the last trigger of a burst runs `action`.
//! The timer task never runs the action itself: once the delay elapses it
//! spawns the action separately, so restarting or cancelling the timer can
//! never abort an action that already started.
//!
//! Created: 2026-10-19

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

type Action<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

pub struct Debouncer<T> {
    delay: Duration,
    action: Action<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Build a trailing-edge debouncer around `action`
pub fn debounce<T, F, Fut>(delay: Duration, action: F) -> Debouncer<T>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Debouncer {
        delay,
        action: Arc::new(move |args| action(args).boxed()),
        pending: Mutex::new(None),
    }
}

impl<T: Send + 'static> Debouncer<T> {
    /// Restart the timer with `args`; replaces any pending trigger.
    /// Must be called from within a tokio runtime.
    pub fn trigger(&self, args: T) {
        let action = Arc::clone(&self.action);
        let delay = self.delay;

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(action(args));
        }));
    }

    /// Drop the pending trigger, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) => {
                let was_waiting = !handle.is_finished();
                handle.abort();
                was_waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}
