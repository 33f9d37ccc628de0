//! Notification Coordinator - single-slot status messages
//!
//! Purpose:
//!     The quote and polling components report progress through one visible
//!     message slot. Repeating the visible message is a no-op; new content
//!     replaces it (never queued) and restarts the auto-dismiss timer.
//!
//! Created: 2026-10-19
//!
//! Design:
//!     - Slot state behind one mutex: message, id counter, dismiss timer
//!     - `pending` messages never auto-dismiss
//!     - Dismiss timers hold a weak reference and only clear the message id
//!       they were started for
//!     - Observers subscribe to a `watch` channel of the visible message, or
//!       to the `broadcast` of show/hide events when every change matters

use super::toast::{ToastDurations, ToastEvent, ToastKind, ToastMessage};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Default)]
struct Slot {
    current: Option<ToastMessage>,
    next_id: u64,
    dismiss_timer: Option<JoinHandle<()>>,
}

struct NotifyInner {
    durations: ToastDurations,
    slot: Mutex<Slot>,
    visible: watch::Sender<Option<ToastMessage>>,
    events: broadcast::Sender<ToastEvent>,
}

impl NotifyInner {
    fn publish(&self, message: Option<ToastMessage>, event: ToastEvent) {
        self.visible.send_replace(message);
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

pub struct NotificationCoordinator {
    inner: Arc<NotifyInner>,
}

impl NotificationCoordinator {
    pub fn new(durations: ToastDurations) -> Self {
        let (visible, _) = watch::channel(None);
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(NotifyInner {
                durations,
                slot: Mutex::new(Slot::default()),
                visible,
                events,
            }),
        }
    }

    /// Display `text`. Returns `false` when it is already the visible message.
    /// Auto-dismissing kinds need a tokio runtime for their timer.
    pub fn show(&self, kind: ToastKind, text: impl Into<String>) -> bool {
        let text = text.into();
        let mut slot = self.inner.slot.lock();

        if slot
            .current
            .as_ref()
            .map(|msg| msg.same_content(kind, &text))
            .unwrap_or(false)
        {
            debug!("Toast already visible, ignoring: [{}] {}", kind, text);
            return false;
        }

        if let Some(timer) = slot.dismiss_timer.take() {
            timer.abort();
        }

        slot.next_id += 1;
        let dismiss_after = self.inner.durations.for_kind(kind);
        let message = ToastMessage {
            id: slot.next_id,
            kind,
            text,
            created_at: Utc::now(),
            auto_dismiss_ms: dismiss_after.map(|d| d.as_millis() as u64),
        };

        if let Some(delay) = dismiss_after {
            let weak = Arc::downgrade(&self.inner);
            let id = message.id;
            slot.dismiss_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                dismiss_if_current(weak, id);
            }));
        }

        info!("Toast [{}] {}", message.kind, message.text);
        slot.current = Some(message.clone());
        self.inner
            .publish(Some(message.clone()), ToastEvent::Shown(message));
        true
    }

    /// Hide whatever is visible and cancel its timer
    pub fn hide(&self) {
        let mut slot = self.inner.slot.lock();
        if let Some(timer) = slot.dismiss_timer.take() {
            timer.abort();
        }
        if let Some(hidden) = slot.current.take() {
            self.inner.publish(None, ToastEvent::Hidden(hidden.id));
        }
    }

    pub fn current(&self) -> Option<ToastMessage> {
        self.inner.slot.lock().current.clone()
    }

    /// Observe the visible message
    pub fn subscribe(&self) -> watch::Receiver<Option<ToastMessage>> {
        self.inner.visible.subscribe()
    }

    /// Every show/hide, including auto-dismissals
    pub fn events(&self) -> broadcast::Receiver<ToastEvent> {
        self.inner.events.subscribe()
    }
}

impl Default for NotificationCoordinator {
    fn default() -> Self {
        Self::new(ToastDurations::default())
    }
}

impl Drop for NotificationCoordinator {
    fn drop(&mut self) {
        if let Some(timer) = self.inner.slot.lock().dismiss_timer.take() {
            timer.abort();
        }
    }
}

fn dismiss_if_current(inner: Weak<NotifyInner>, id: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let mut slot = inner.slot.lock();
    if slot.current.as_ref().map(|msg| msg.id) == Some(id) {
        slot.current = None;
        slot.dismiss_timer = None;
        debug!("Toast {} auto-dismissed", id);
        inner.publish(None, ToastEvent::Hidden(id));
    }
}
