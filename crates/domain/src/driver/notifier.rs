//! Subscription registry for connection state changes.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::mpsc;

use super::ConnectionStateChanged;

type Handler = Arc<dyn Fn(&ConnectionStateChanged) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(u64, Handler)>>,
}

impl Registry {
    fn handlers(&self) -> MutexGuard<'_, Vec<(u64, Handler)>> {
        self.handlers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remove(&self, id: u64) -> bool {
        let mut handlers = self.handlers();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }
}

/// Fan-out of [`ConnectionStateChanged`] notifications to subscribers.
///
/// Delivery is synchronous and in registration order. A handler that panics
/// is logged and skipped; the remaining handlers still run.
#[derive(Default)]
pub struct StateNotifier {
    registry: Arc<Registry>,
}

impl StateNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. It stays registered until the returned
    /// [`Subscription`] is unsubscribed or dropped.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ConnectionStateChanged) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.handlers().push((id, Arc::new(handler)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Forward notifications into an unbounded channel.
    pub fn subscribe_channel(
        &self,
    ) -> (Subscription, mpsc::UnboundedReceiver<ConnectionStateChanged>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |event| {
            // receiver gone: nothing left to deliver to
            let _ = tx.send(event.clone());
        });
        (subscription, rx)
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.handlers().len()
    }

    /// Deliver `event` to every current subscriber.
    pub fn publish(&self, event: &ConnectionStateChanged) {
        // Snapshot so handlers may (un)subscribe without deadlocking.
        let handlers: Vec<Handler> = self
            .registry
            .handlers()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                tracing::warn!(
                    old_state = %event.old_state,
                    new_state = %event.new_state,
                    "State change subscriber panicked"
                );
            }
        }
    }
}

impl std::fmt::Debug for StateNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle to a registered state change handler.
///
/// Dropping the handle unsubscribes. Holding it does not keep the driver alive.
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Remove the handler now. Returns false if the notifier is already gone.
    pub fn unsubscribe(self) -> bool {
        self.detach_handler()
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.handlers().iter().any(|(id, _)| *id == self.id))
    }

    fn detach_handler(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self.id),
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_handler();
    }
}
