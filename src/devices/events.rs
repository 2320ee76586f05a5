//! Per-facade event subscriptions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Lifecycle and hot-plug events of a device facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Init succeeded through this facade
    Initialized,
    /// Free succeeded through this facade
    Freed,
    /// The endpoint was enabled or plugged in (WASAPI)
    Enabled,
    /// The endpoint was disabled or unplugged (WASAPI)
    Disabled,
    /// The endpoint became the default output or input (WASAPI)
    DefaultChanged,
    /// The initialized endpoint stopped working (WASAPI)
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Ordered list of event handlers.
///
/// Handlers run on whichever thread emits, without any lock held, so they
/// may subscribe or unsubscribe while running.
pub struct EventHandlers<E> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, Handler<E>)>>,
}

impl<E> Default for EventHandlers<E> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }
}

impl<E> EventHandlers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().push((id, Arc::new(handler)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Handler<E>> = self.handlers.lock().iter().map(|(_, h)| h.clone()).collect();
        for handler in snapshot {
            handler(event);
        }
    }
}
