//! Linux state reader using the GeoClue2 D-Bus service.
//!
//! GeoClue has no per-provider switches. The accuracy level the agent grants
//! the application decides both the authorization and whether the location
//! service counts as enabled.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use async_channel::{Receiver, Sender};
use futures::executor::block_on;
use futures::future::{self, Either};
use futures::{StreamExt, pin_mut};
use log::{debug, error, warn};
use zbus::Connection;
use zbus::fdo::PropertiesProxy;

use crate::{GeolocationState, PlatformStateReader, ProviderStatus, StateDelegate, StateError, StateResult};

const GEOCLUE_SERVICE: &str = "org.freedesktop.GeoClue2";
const MANAGER_PATH: &str = "/org/freedesktop/GeoClue2/Manager";
const ACCURACY_PROPERTY: &str = "AvailableAccuracyLevel";

async fn read_state() -> StateResult<GeolocationState> {
    let authorization = geokit_permission::check().await?;
    let enabled = authorization.level().is_authorized();
    Ok(GeolocationState::new(
        authorization,
        ProviderStatus::from_enabled(enabled),
        None,
    ))
}

/// Stops the watcher thread when dropped by closing its channel.
struct Watcher {
    shutdown: Sender<()>,
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.shutdown.close();
    }
}

/// Reads geolocation state from GeoClue2.
#[derive(Default)]
pub struct GeoClueStateReader {
    watcher: Mutex<Option<Watcher>>,
}

impl fmt::Debug for GeoClueStateReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoClueStateReader")
            .field(
                "watching",
                &self
                    .watcher
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some(),
            )
            .finish()
    }
}

impl GeoClueStateReader {
    /// Create a reader that is not yet watching.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlatformStateReader for GeoClueStateReader {
    fn fetch_state(&self) -> impl Future<Output = StateResult<GeolocationState>> + Send {
        read_state()
    }

    fn subscribe(&self, delegate: Arc<dyn StateDelegate>) -> StateResult<()> {
        let (shutdown, stopped) = async_channel::bounded(1);
        thread::Builder::new()
            .name("geokit-geoclue".into())
            .spawn(move || block_on(watch(delegate, stopped)))
            .map_err(|err| StateError::Subscription(err.to_string()))?;

        // Replacing the previous watcher drops it, which stops its thread.
        *self.watcher.lock().unwrap_or_else(PoisonError::into_inner) = Some(Watcher { shutdown });
        Ok(())
    }

    fn unsubscribe(&self) -> StateResult<()> {
        self.watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(drop)
            .ok_or(StateError::NotListening)
    }
}

async fn watch(delegate: Arc<dyn StateDelegate>, stopped: Receiver<()>) {
    if let Err(err) = watch_accuracy(&delegate, &stopped).await {
        error!("GeoClue watcher stopped: {err}");
    }
    debug!("GeoClue watcher exited");
}

async fn watch_accuracy(
    delegate: &Arc<dyn StateDelegate>,
    stopped: &Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::system().await?;
    let proxy = PropertiesProxy::builder(&connection)
        .destination(GEOCLUE_SERVICE)?
        .path(MANAGER_PATH)?
        .build()
        .await?;
    let mut changes = Box::pin(proxy.receive_properties_changed().await?);

    let stop = stopped.recv();
    pin_mut!(stop);

    loop {
        let signal = match future::select(changes.next(), stop.as_mut()).await {
            Either::Left((Some(signal), _)) => signal,
            Either::Left((None, _)) | Either::Right(_) => return Ok(()),
        };

        let relevant = signal
            .args()
            .is_ok_and(|args| args.changed_properties().contains_key(ACCURACY_PROPERTY));
        if !relevant {
            continue;
        }

        match read_state().await {
            Ok(state) => delegate.on_state(state),
            Err(err) => warn!("failed to read geolocation state after GeoClue change: {err}"),
        }
    }
}
