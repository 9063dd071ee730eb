use std::fmt;
use std::sync::Arc;

use futures::task::Spawn;

use crate::{GeolocationState, LifecycleSignal};

/// Configuration for a [`StateManager`](crate::StateManager).
#[derive(Clone)]
pub struct ManagerConfig {
    /// Snapshot held until the first fetch completes.
    pub initial_state: GeolocationState,
    /// Subscribe to platform events and fetch immediately on construction.
    pub listen_on_start: bool,
    /// Re-fetch when the application returns to the foreground.
    pub refresh_on_foreground: bool,
    /// Host lifecycle source; foreground refresh is disabled without one.
    pub lifecycle: Option<Arc<dyn LifecycleSignal>>,
    /// Executor for background refreshes. Refreshes run inline when unset.
    pub spawner: Option<Arc<dyn Spawn + Send + Sync>>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            initial_state: GeolocationState::default(),
            listen_on_start: true,
            refresh_on_foreground: true,
            lifecycle: None,
            spawner: None,
        }
    }
}

impl ManagerConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot held before the first fetch.
    #[must_use]
    pub fn initial_state(mut self, state: GeolocationState) -> Self {
        self.initial_state = state;
        self
    }

    /// Choose whether construction starts listening.
    #[must_use]
    pub fn listen_on_start(mut self, enabled: bool) -> Self {
        self.listen_on_start = enabled;
        self
    }

    /// Choose whether foreground transitions trigger a refresh.
    #[must_use]
    pub fn refresh_on_foreground(mut self, enabled: bool) -> Self {
        self.refresh_on_foreground = enabled;
        self
    }

    /// Attach a lifecycle source.
    #[must_use]
    pub fn lifecycle(mut self, signal: Arc<dyn LifecycleSignal>) -> Self {
        self.lifecycle = Some(signal);
        self
    }

    /// Run background refreshes on `spawner`.
    #[must_use]
    pub fn spawner(mut self, spawner: Arc<dyn Spawn + Send + Sync>) -> Self {
        self.spawner = Some(spawner);
        self
    }
}

impl fmt::Debug for ManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerConfig")
            .field("initial_state", &self.initial_state)
            .field("listen_on_start", &self.listen_on_start)
            .field("refresh_on_foreground", &self.refresh_on_foreground)
            .field("lifecycle", &self.lifecycle.is_some())
            .field("spawner", &self.spawner.is_some())
            .finish()
    }
}
