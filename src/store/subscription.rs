use crate::value::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use super::store::StoreCore;

type Callback = Box<dyn Fn(&Value) + Send + Sync>;

/// One registration on a store's subscriber list.
pub(crate) struct Subscriber {
    pub(crate) id: usize,
    active: AtomicBool,
    callback: Callback,
}

impl Subscriber {
    pub(crate) fn new(id: usize, callback: Callback) -> Self {
        Self {
            id,
            active: AtomicBool::new(true),
            callback,
        }
    }

    /// Invoke the callback unless the registration was removed in the
    /// meantime.
    pub(crate) fn notify(&self, state: &Value) {
        if self.is_active() {
            (self.callback)(state);
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Returns `true` only for the call that actually deactivated it.
    fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::SeqCst)
    }
}

/// Handle returned by [`Store::subscribe`](crate::Store::subscribe).
///
/// Calling [`unsubscribe`](Unsubscribe::unsubscribe) removes exactly this
/// registration; calling it again does nothing. Dropping the handle leaves
/// the subscription in place.
#[derive(Clone)]
pub struct Unsubscribe {
    store: Weak<StoreCore>,
    subscriber: Weak<Subscriber>,
}

impl Unsubscribe {
    pub(crate) fn new(store: &Arc<StoreCore>, subscriber: &Arc<Subscriber>) -> Self {
        Self {
            store: Arc::downgrade(store),
            subscriber: Arc::downgrade(subscriber),
        }
    }

    /// Remove this registration. Later calls do nothing.
    pub fn unsubscribe(&self) {
        let Some(subscriber) = self.subscriber.upgrade() else {
            return;
        };
        if !subscriber.deactivate() {
            return;
        }
        if let Some(store) = self.store.upgrade() {
            store.remove_subscriber(subscriber.id);
        }
    }

    /// Whether the registration is still live.
    pub fn is_active(&self) -> bool {
        self.subscriber
            .upgrade()
            .map(|s| s.is_active())
            .unwrap_or(false)
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("active", &self.is_active())
            .finish()
    }
}
