//! Ordered registry of state listeners.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use log::{debug, error};

use crate::GeolocationState;

/// A callback invoked with each new snapshot.
pub type Listener = Arc<dyn Fn(GeolocationState) + Send + Sync>;

/// Handle identifying one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

pub(crate) type SharedRegistry = Arc<Mutex<ListenerRegistry>>;

impl ListenerRegistry {
    pub(crate) fn insert(&mut self, listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((id, listener));
        id
    }

    /// Removes the single registration `id`.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        before != self.entries.len()
    }

    /// Removes every registration of the same callback allocation.
    pub(crate) fn remove_matching(&mut self, listener: &Listener) -> usize {
        let target = Arc::as_ptr(listener).cast::<()>();
        let before = self.entries.len();
        self.entries
            .retain(|(_, entry)| Arc::as_ptr(entry).cast::<()>() != target);
        before - self.entries.len()
    }

    /// Registrations in notification order.
    pub(crate) fn snapshot(&self) -> Vec<(ListenerId, Listener)> {
        self.entries.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.entries.len())
            .finish()
    }
}

/// Invoke one listener, containing any panic so the remaining listeners still run.
pub(crate) fn notify(id: ListenerId, listener: &Listener, state: GeolocationState) {
    if catch_unwind(AssertUnwindSafe(|| listener(state))).is_err() {
        error!("{id} panicked while handling a geolocation state update");
    }
}

/// Keeps a listener registered until dropped.
///
/// Returned by [`StateManager::subscribe`](crate::StateManager::subscribe).
#[must_use = "dropping a Subscription removes its listener immediately"]
pub struct Subscription {
    registry: Weak<Mutex<ListenerRegistry>>,
    id: ListenerId,
}

impl Subscription {
    pub(crate) fn new(registry: &SharedRegistry, id: ListenerId) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            id,
        }
    }

    /// The registration this subscription guards.
    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Keep the listener registered for the lifetime of the manager.
    ///
    /// The returned id can still be passed to
    /// [`StateManager::remove_listener`](crate::StateManager::remove_listener).
    pub fn detach(mut self) -> ListenerId {
        self.registry = Weak::new();
        self.id
    }

    fn release(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.id);
        if removed {
            debug!("removed {} on unsubscribe", self.id);
        }
        removed
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Listener {
        Arc::new(|_state| {})
    }

    #[test]
    fn ids_are_unique_per_registration() {
        let mut registry = ListenerRegistry::default();
        let listener = noop();
        let first = registry.insert(listener.clone());
        let second = registry.insert(listener);
        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_by_id_removes_one_registration() {
        let mut registry = ListenerRegistry::default();
        let listener = noop();
        let first = registry.insert(listener.clone());
        registry.insert(listener);

        assert!(registry.remove(first));
        assert!(!registry.remove(first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_matching_removes_all_registrations_of_a_callback() {
        let mut registry = ListenerRegistry::default();
        let duplicated = noop();
        let other = noop();
        registry.insert(duplicated.clone());
        registry.insert(other.clone());
        registry.insert(duplicated.clone());

        assert_eq!(registry.remove_matching(&duplicated), 2);
        assert_eq!(registry.remove_matching(&duplicated), 0);
        let remaining = registry.snapshot();
        assert_eq!(remaining.len(), 1);
        assert!(Arc::ptr_eq(&remaining[0].1, &other));
    }

    #[test]
    fn subscription_drop_unregisters() {
        let registry: SharedRegistry = Arc::default();
        let id = registry.lock().unwrap().insert(noop());
        let subscription = Subscription::new(&registry, id);
        assert_eq!(subscription.id(), id);

        drop(subscription);
        assert_eq!(registry.lock().unwrap().len(), 0);
    }

    #[test]
    fn detached_subscription_stays_registered() {
        let registry: SharedRegistry = Arc::default();
        let id = registry.lock().unwrap().insert(noop());
        let detached = Subscription::new(&registry, id).detach();

        assert_eq!(detached, id);
        assert_eq!(registry.lock().unwrap().len(), 1);
    }

    #[test]
    fn panicking_listener_is_contained() {
        let listener: Listener = Arc::new(|_state| panic!("listener bug"));
        notify(ListenerId(1), &listener, GeolocationState::default());
    }
}
