//! The capability every platform backend provides to the state manager.

use std::future::Future;
use std::sync::Arc;

use crate::{GeolocationState, StateResult};

/// Receives state candidates pushed by a platform event source.
pub trait StateDelegate: Send + Sync {
    /// Called whenever the platform reports a provider or permission change.
    fn on_state(&self, state: GeolocationState);
}

/// Reads geolocation state from the operating system and reports changes.
///
/// Each platform has one implementation, chosen at compile time and exposed
/// as [`PlatformReader`](crate::PlatformReader).
pub trait PlatformStateReader: Send + Sync + 'static {
    /// Read the current state.
    ///
    /// Fails only when the underlying OS call fails.
    fn fetch_state(&self) -> impl Future<Output = StateResult<GeolocationState>> + Send;

    /// Register `delegate` to receive state changes.
    ///
    /// A reader feeds a single delegate; subscribing again replaces it.
    ///
    /// # Errors
    /// Returns [`StateError::Subscription`](crate::StateError::Subscription)
    /// when the OS registration fails.
    fn subscribe(&self, delegate: Arc<dyn StateDelegate>) -> StateResult<()>;

    /// Stop delivering state changes.
    ///
    /// # Errors
    /// Returns [`StateError::NotListening`](crate::StateError::NotListening)
    /// when no delegate is registered.
    fn unsubscribe(&self) -> StateResult<()>;
}
