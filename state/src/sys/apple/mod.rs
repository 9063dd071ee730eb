//! Apple platform (iOS/macOS) state reader using swift-bridge.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::executor::block_on;
use log::{debug, error};

use crate::{GeolocationState, PlatformStateReader, ProviderStatus, StateDelegate, StateError, StateResult};

#[swift_bridge::bridge]
mod ffi {
    extern "Rust" {
        type StateRelay;

        fn authorization_changed(self: &StateRelay);
    }

    extern "Swift" {
        type AuthorizationObserver;

        #[swift_bridge(init)]
        fn new(relay: StateRelay) -> AuthorizationObserver;

        fn invalidate(self: &AuthorizationObserver);

        fn location_services_enabled() -> bool;
    }
}

/// Forwards `CoreLocation` authorization callbacks to the state delegate.
pub struct StateRelay {
    delegate: Arc<dyn StateDelegate>,
}

impl StateRelay {
    fn authorization_changed(&self) {
        match block_on(read_state()) {
            Ok(state) => self.delegate.on_state(state),
            Err(err) => error!("failed to read geolocation state after authorization change: {err}"),
        }
    }
}

async fn read_state() -> StateResult<GeolocationState> {
    let authorization = geokit_permission::check().await?;
    let services = ProviderStatus::from_enabled(ffi::location_services_enabled());
    // CoreLocation has no separate network provider.
    Ok(GeolocationState::new(authorization, services, None))
}

/// Reads geolocation state from `CoreLocation`.
///
/// Location services map to the GPS provider; there is no network provider.
///
/// Subscribing may happen on any thread. Authorization callbacks arrive on
/// the main thread, so the host must keep its main run loop running.
#[derive(Default)]
pub struct AppleStateReader {
    observer: Mutex<Option<ffi::AuthorizationObserver>>,
}

// Safety: the observer is only touched behind the Mutex. The Swift object
// creates and releases its CLLocationManager on the main queue, which is
// where callbacks are delivered.
#[allow(clippy::non_send_fields_in_send_ty)]
unsafe impl Send for AppleStateReader {}
unsafe impl Sync for AppleStateReader {}

impl fmt::Debug for AppleStateReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppleStateReader")
            .field(
                "observing",
                &self
                    .observer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some(),
            )
            .finish()
    }
}

impl AppleStateReader {
    /// Create a reader that is not yet observing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlatformStateReader for AppleStateReader {
    fn fetch_state(&self) -> impl Future<Output = StateResult<GeolocationState>> + Send {
        read_state()
    }

    fn subscribe(&self, delegate: Arc<dyn StateDelegate>) -> StateResult<()> {
        let observer = ffi::AuthorizationObserver::new(StateRelay { delegate });
        let previous = self
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(observer);
        if let Some(previous) = previous {
            previous.invalidate();
        }
        debug!("observing CoreLocation authorization changes");
        Ok(())
    }

    fn unsubscribe(&self) -> StateResult<()> {
        let observer = self
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(StateError::NotListening)?;
        observer.invalidate();
        Ok(())
    }
}
