//! The state manager: one deduplicated snapshot, fanned out to listeners.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread::{self, ThreadId};

use futures::executor::block_on;
use futures::task::SpawnExt;
use log::{debug, error, trace, warn};

use crate::listener::{self, ListenerRegistry, SharedRegistry};
use crate::{
    AppLifecycle, GeolocationState, LifecycleDelegate, Listener, ListenerId, ManagerConfig,
    PlatformStateReader, StateDelegate, StateError, StateResult, StateStream, Subscription,
};

/// Whether a manager is subscribed to platform and lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListeningState {
    /// Never started.
    Uninitialized,
    /// Subscribed to platform and lifecycle events.
    Listening,
    /// Stopped; may be started again.
    Stopped,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner<R: PlatformStateReader> {
    reader: R,
    config: ManagerConfig,
    snapshot: RwLock<GeolocationState>,
    listeners: SharedRegistry,
    // Serializes compare/replace/notify passes.
    dispatch: Mutex<()>,
    // Thread currently running a pass, for re-entrant calls from listeners.
    dispatcher: Mutex<Option<ThreadId>>,
    pending: Mutex<VecDeque<GeolocationState>>,
    listening: Mutex<ListeningState>,
}

impl<R: PlatformStateReader> Inner<R> {
    fn current_state(&self) -> GeolocationState {
        *self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_dispatching_here(&self) -> bool {
        *lock(&self.dispatcher) == Some(thread::current().id())
    }

    fn reconcile(&self, candidate: GeolocationState) -> bool {
        if self.is_dispatching_here() {
            debug!("deferring geolocation state update issued from a listener");
            lock(&self.pending).push_back(candidate);
            return false;
        }

        let _dispatch = lock(&self.dispatch);
        *lock(&self.dispatcher) = Some(thread::current().id());

        let mut changed = false;
        let mut next = Some(candidate);
        while let Some(candidate) = next {
            changed |= self.replace_and_notify(candidate);
            next = lock(&self.pending).pop_front();
        }

        *lock(&self.dispatcher) = None;
        changed
    }

    fn replace_and_notify(&self, candidate: GeolocationState) -> bool {
        {
            let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            if *snapshot == candidate {
                trace!("discarding duplicate geolocation state {candidate:?}");
                return false;
            }
            *snapshot = candidate;
        }

        let listeners = lock(&self.listeners).snapshot();
        debug!(
            "geolocation state changed to {candidate:?}, notifying {} listeners",
            listeners.len()
        );
        for (id, listener) in &listeners {
            listener::notify(*id, listener, candidate);
        }
        true
    }

    fn register(&self, listener: Listener) -> ListenerId {
        let id = lock(&self.listeners).insert(listener.clone());
        debug!("registered {id}");
        listener::notify(id, &listener, self.current_state());
        id
    }
}

impl<R: PlatformStateReader> Drop for Inner<R> {
    fn drop(&mut self) {
        let listening = *self
            .listening
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if listening != ListeningState::Listening {
            return;
        }

        if let Err(err) = self.reader.unsubscribe() {
            debug!("reader unsubscribe on drop failed: {err}");
        }
        if let Some(lifecycle) = &self.config.lifecycle {
            if let Err(err) = lifecycle.unsubscribe() {
                debug!("lifecycle unsubscribe on drop failed: {err}");
            }
        }
    }
}

struct ReaderDelegate<R: PlatformStateReader> {
    inner: Weak<Inner<R>>,
}

impl<R: PlatformStateReader> StateDelegate for ReaderDelegate<R> {
    fn on_state(&self, state: GeolocationState) {
        if let Some(inner) = self.inner.upgrade() {
            inner.reconcile(state);
        }
    }
}

struct ForegroundDelegate<R: PlatformStateReader> {
    inner: Weak<Inner<R>>,
}

impl<R: PlatformStateReader> LifecycleDelegate for ForegroundDelegate<R> {
    fn on_lifecycle(&self, event: AppLifecycle) {
        if event != AppLifecycle::Foreground {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            if inner.config.refresh_on_foreground {
                StateManager { inner }.schedule_refresh("foreground");
            }
        }
    }
}

fn ignore_not_listening(result: StateResult<()>, source: &str) -> StateResult<()> {
    match result {
        Err(StateError::NotListening) => {
            debug!("{source} was not subscribed");
            Ok(())
        }
        other => other,
    }
}

/// Keeps the authoritative geolocation snapshot and notifies listeners
/// exactly when it changes.
///
/// Candidates arrive from the reader's event source, from
/// [`update_state`](Self::update_state) and from [`apply`](Self::apply). Each
/// one is compared structurally with the stored snapshot; an equal candidate
/// is dropped silently, a different one replaces the snapshot and is handed
/// to every listener in registration order.
///
/// The handle is cheap to clone; clones share the same state. Passes are
/// serialized, so listeners observe transitions in the order they were
/// applied. Listeners may register or remove listeners, or apply further
/// states, from inside their callback; such nested updates are delivered
/// after the current pass finishes.
///
/// # Example
///
/// ```ignore
/// use geokit_state::{ManagerConfig, PlatformReader, StateManager};
///
/// let manager = StateManager::new(PlatformReader::new(), ManagerConfig::default());
/// let id = manager.add_listener(|state| println!("{state:?}"));
/// manager.remove_listener(id);
/// ```
pub struct StateManager<R: PlatformStateReader> {
    inner: Arc<Inner<R>>,
}

impl<R: PlatformStateReader> Clone for StateManager<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: PlatformStateReader> fmt::Debug for StateManager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateManager")
            .field("state", &self.current_state())
            .field("listening", &self.listening_state())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<R: PlatformStateReader> StateManager<R> {
    /// Create a manager around `reader`.
    ///
    /// With [`ManagerConfig::listen_on_start`] set (the default) this also
    /// subscribes to platform and lifecycle events and fetches the first
    /// snapshot; failures there are logged and leave the manager stopped.
    pub fn new(reader: R, config: ManagerConfig) -> Self {
        let listen_on_start = config.listen_on_start;
        let manager = Self {
            inner: Arc::new(Inner {
                reader,
                snapshot: RwLock::new(config.initial_state),
                config,
                listeners: Arc::new(Mutex::new(ListenerRegistry::default())),
                dispatch: Mutex::new(()),
                dispatcher: Mutex::new(None),
                pending: Mutex::new(VecDeque::new()),
                listening: Mutex::new(ListeningState::Uninitialized),
            }),
        };

        if listen_on_start {
            if let Err(err) = manager.start_listening() {
                error!("failed to start listening for geolocation state: {err}");
            }
        }

        manager
    }

    /// The platform reader backing this manager.
    #[must_use]
    pub fn reader(&self) -> &R {
        &self.inner.reader
    }

    /// The last known snapshot.
    #[must_use]
    pub fn current_state(&self) -> GeolocationState {
        self.inner.current_state()
    }

    /// Current subscription state.
    #[must_use]
    pub fn listening_state(&self) -> ListeningState {
        *lock(&self.inner.listening)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    /// Register `listener`.
    ///
    /// It is called immediately with the current snapshot, then on every
    /// change. Registering the same closure twice yields two registrations.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(GeolocationState) + Send + Sync + 'static,
    {
        self.add_shared_listener(Arc::new(listener))
    }

    /// Register an existing callback handle.
    ///
    /// All registrations of the same handle can later be removed at once
    /// with [`remove_shared_listener`](Self::remove_shared_listener).
    pub fn add_shared_listener(&self, listener: Listener) -> ListenerId {
        if self.inner.is_dispatching_here() {
            return self.inner.register(listener);
        }
        // Holding the dispatch lock keeps the replay ahead of any concurrent change.
        let _dispatch = lock(&self.inner.dispatch);
        self.inner.register(listener)
    }

    /// Register `listener` for as long as the returned guard lives.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(GeolocationState) + Send + Sync + 'static,
    {
        let id = self.add_listener(listener);
        Subscription::new(&self.inner.listeners, id)
    }

    /// Remove the registration `id`.
    ///
    /// Only that registration is removed; other registrations of the same
    /// callback stay. Returns `false` if `id` was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = lock(&self.inner.listeners).remove(id);
        if removed {
            debug!("removed {id}");
        }
        removed
    }

    /// Remove every registration of `listener`.
    ///
    /// Returns how many registrations were removed.
    pub fn remove_shared_listener(&self, listener: &Listener) -> usize {
        let removed = lock(&self.inner.listeners).remove_matching(listener);
        debug!("removed {removed} registrations of a shared listener");
        removed
    }

    /// Offer a candidate snapshot.
    ///
    /// Returns `true` if it differed from the stored snapshot and listeners
    /// were notified. Called from inside a listener, the candidate is queued
    /// behind the running pass and `false` is returned.
    pub fn apply(&self, candidate: GeolocationState) -> bool {
        self.inner.reconcile(candidate)
    }

    /// Re-read the state from the platform and apply it.
    ///
    /// Resolves with whether the snapshot changed.
    ///
    /// Awaited from inside a listener on the notifying thread, the fetched
    /// state is queued behind the running pass instead: the call resolves
    /// with `Ok(false)` before it is applied, and listeners see it once the
    /// current pass finishes.
    ///
    /// # Errors
    /// Returns the reader's error if the fetch fails; the stored snapshot is
    /// left untouched.
    pub async fn update_state(&self) -> StateResult<bool> {
        match self.inner.reader.fetch_state().await {
            Ok(state) => Ok(self.inner.reconcile(state)),
            Err(err) => {
                error!("failed to fetch geolocation state: {err}");
                Err(err)
            }
        }
    }

    /// Force a refresh of the state.
    ///
    /// A fallback for when automatic change detection missed an update.
    ///
    /// # Errors
    /// See [`update_state`](Self::update_state).
    pub async fn force_refresh(&self) -> StateResult<bool> {
        self.update_state().await
    }

    /// Subscribe to platform state changes and lifecycle transitions, then
    /// refresh. Does nothing if already listening.
    ///
    /// # Errors
    /// Returns the subscription error. If the lifecycle subscription fails
    /// the platform subscription is rolled back.
    pub fn start_listening(&self) -> StateResult<()> {
        {
            let mut listening = lock(&self.inner.listening);
            if *listening == ListeningState::Listening {
                return Ok(());
            }

            let delegate = Arc::new(ReaderDelegate {
                inner: Arc::downgrade(&self.inner),
            });
            self.inner.reader.subscribe(delegate)?;

            if let Some(lifecycle) = &self.inner.config.lifecycle {
                let delegate = Arc::new(ForegroundDelegate {
                    inner: Arc::downgrade(&self.inner),
                });
                if let Err(err) = lifecycle.subscribe(delegate) {
                    warn!("lifecycle subscription failed, rolling back platform subscription");
                    if let Err(rollback) = self.inner.reader.unsubscribe() {
                        warn!("failed to roll back platform subscription: {rollback}");
                    }
                    return Err(err);
                }
            }

            *listening = ListeningState::Listening;
        }

        debug!("listening for geolocation state changes");
        self.schedule_refresh("listen");
        Ok(())
    }

    /// Unsubscribe from platform state changes and lifecycle transitions.
    ///
    /// Stopping a manager that is not listening does nothing.
    ///
    /// # Errors
    /// Returns a platform error raised while unsubscribing. The manager is
    /// considered stopped either way.
    pub fn stop_listening(&self) -> StateResult<()> {
        let mut listening = lock(&self.inner.listening);
        if *listening != ListeningState::Listening {
            debug!("geolocation state listener already stopped");
            return Ok(());
        }
        *listening = ListeningState::Stopped;

        let reader = ignore_not_listening(self.inner.reader.unsubscribe(), "platform reader");
        let lifecycle = match &self.inner.config.lifecycle {
            Some(lifecycle) => ignore_not_listening(lifecycle.unsubscribe(), "lifecycle signal"),
            None => Ok(()),
        };

        debug!("stopped listening for geolocation state changes");
        reader.and(lifecycle)
    }

    /// Stream every snapshot from now on, starting with the current one.
    pub fn watch(&self) -> StateStream {
        let (sender, receiver) = async_channel::unbounded();
        let subscription = self.subscribe(move |state| {
            if let Err(err) = sender.try_send(state) {
                warn!("dropping geolocation state update: {err}");
            }
        });
        StateStream::new(receiver, subscription)
    }

    fn schedule_refresh(&self, reason: &str) {
        debug!("refreshing geolocation state ({reason})");
        let manager = self.clone();
        // Fetch errors are logged by update_state.
        let refresh = async move {
            let _ = manager.update_state().await;
        };

        match &self.inner.config.spawner {
            Some(spawner) => {
                if let Err(err) = spawner.as_ref().spawn(refresh) {
                    error!("failed to spawn {reason} refresh: {err}");
                }
            }
            None => block_on(refresh),
        }
    }
}
