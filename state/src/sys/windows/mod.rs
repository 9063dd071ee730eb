//! Windows state reader using the WinRT `Geolocator`.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::executor::block_on;
use log::{debug, error};
use windows::Devices::Geolocation::{Geolocator, PositionStatus, StatusChangedEventArgs};
use windows::Foundation::TypedEventHandler;

use crate::{GeolocationState, PlatformStateReader, ProviderStatus, StateDelegate, StateError, StateResult};

#[allow(clippy::needless_pass_by_value)]
fn platform_error(err: windows::core::Error) -> StateError {
    StateError::Fetch(err.message().to_string())
}

async fn read_state(geolocator: &Geolocator) -> StateResult<GeolocationState> {
    let authorization = geokit_permission::check().await?;
    let status = geolocator.LocationStatus().map_err(platform_error)?;
    let enabled = !matches!(status, PositionStatus::Disabled | PositionStatus::NotAvailable);
    // Windows exposes one combined provider.
    Ok(GeolocationState::new(
        authorization,
        ProviderStatus::from_enabled(enabled),
        None,
    ))
}

/// Reads geolocation state from the Windows location service.
pub struct WindowsStateReader {
    geolocator: Geolocator,
    token: Mutex<Option<i64>>,
}

impl fmt::Debug for WindowsStateReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowsStateReader")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl WindowsStateReader {
    /// Create a reader backed by a new `Geolocator`.
    ///
    /// # Errors
    /// Returns [`StateError::Fetch`] if the `Geolocator` cannot be created.
    pub fn new() -> StateResult<Self> {
        Ok(Self {
            geolocator: Geolocator::new().map_err(platform_error)?,
            token: Mutex::new(None),
        })
    }
}

impl PlatformStateReader for WindowsStateReader {
    fn fetch_state(&self) -> impl Future<Output = StateResult<GeolocationState>> + Send {
        let geolocator = self.geolocator.clone();
        async move { read_state(&geolocator).await }
    }

    fn subscribe(&self, delegate: Arc<dyn StateDelegate>) -> StateResult<()> {
        let mut token = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = token.take() {
            if let Err(err) = self.geolocator.RemoveStatusChanged(previous) {
                debug!("failed to remove previous status handler: {}", err.message());
            }
        }

        let geolocator = self.geolocator.clone();
        let handler = TypedEventHandler::<Geolocator, StatusChangedEventArgs>::new(move |_, _| {
            match block_on(read_state(&geolocator)) {
                Ok(state) => delegate.on_state(state),
                Err(err) => error!("failed to read geolocation state after status change: {err}"),
            }
            Ok(())
        });

        let registered = self
            .geolocator
            .StatusChanged(&handler)
            .map_err(|err| StateError::Subscription(err.message().to_string()))?;
        *token = Some(registered);
        Ok(())
    }

    fn unsubscribe(&self) -> StateResult<()> {
        let token = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(StateError::NotListening)?;
        self.geolocator
            .RemoveStatusChanged(token)
            .map_err(|err| StateError::Subscription(err.message().to_string()))
    }
}

impl Drop for WindowsStateReader {
    fn drop(&mut self) {
        // The handler holds a Geolocator clone; removing it breaks the cycle.
        let token = self.token.get_mut().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(token) = token {
            if let Err(err) = self.geolocator.RemoveStatusChanged(token) {
                debug!("failed to remove status handler on drop: {}", err.message());
            }
        }
    }
}
