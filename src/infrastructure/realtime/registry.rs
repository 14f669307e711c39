use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, error};

use crate::domain::Notification;

pub type NotificationCallback = Box<dyn Fn(&Notification) + Send + Sync>;

struct ListenerSlot {
    id: u64,
    /// Held while the callback runs, so deactivation waits for an
    /// in-flight delivery. Reentrant for unsubscribing from inside it.
    active: ReentrantMutex<Cell<bool>>,
    callback: NotificationCallback,
}

/// Listener id → callback, with per-callback panic isolation.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    slots: Mutex<Vec<Arc<ListenerSlot>>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. Keep the handle to remove it later.
    pub fn register(self: &Arc<Self>, callback: NotificationCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.slots.lock().push(Arc::new(ListenerSlot {
            id,
            active: ReentrantMutex::new(Cell::new(true)),
            callback,
        }));
        debug!(listener = id, "Listener registered");

        Subscription {
            registry: Arc::downgrade(self),
            id,
        }
    }

    /// Delivers to every active listener in registration order.
    pub fn dispatch(&self, notification: &Notification) {
        let snapshot: Vec<Arc<ListenerSlot>> = self.slots.lock().clone();

        for slot in snapshot {
            let active = slot.active.lock();
            if !active.get() {
                continue;
            }

            let result = catch_unwind(AssertUnwindSafe(|| (slot.callback)(notification)));
            if let Err(panic_info) = result {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!(listener = slot.id, panic = %panic_msg, "Notification listener panicked");
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    fn remove(&self, id: u64) -> bool {
        let slot = {
            let mut slots = self.slots.lock();
            let Some(index) = slots.iter().position(|slot| slot.id == id) else {
                return false;
            };
            slots.remove(index)
        };

        slot.active.lock().set(false);
        debug!(listener = id, "Listener removed");
        true
    }
}

/// Handle returned by `on_notification`. Dropping it keeps the listener
/// registered; call [`Subscription::unsubscribe`] to remove it.
#[must_use = "dropping the handle makes the listener impossible to remove"]
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<ListenerRegistry>,
    id: u64,
}

impl Subscription {
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Removes the listener. No delivery starts after this returns, and a
    /// delivery in progress on another thread finishes first.
    pub fn unsubscribe(self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id))
    }
}
