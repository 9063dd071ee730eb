//! The process-wide manager.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use log::debug;

use crate::{LifecycleHub, StateError, StateManager, StateResult, sys::PlatformReader};

/// A [`StateManager`] backed by the reader for the current platform.
pub type PlatformStateManager = StateManager<PlatformReader>;

static SHARED: OnceLock<PlatformStateManager> = OnceLock::new();
static LIFECYCLE: OnceLock<Arc<LifecycleHub>> = OnceLock::new();
// Held while the shared manager is built so only one caller constructs it.
static INIT: Mutex<()> = Mutex::new(());

/// The process-wide lifecycle hub.
///
/// The host forwards its foreground/background transitions here, e.g.
/// `shared_lifecycle().notify_str("active")`. The manager created by
/// [`shared_or_init`] is subscribed to it; attach it with
/// [`ManagerConfig::lifecycle`](crate::ManagerConfig::lifecycle) when building
/// a manager for [`install_shared`].
#[must_use]
pub fn shared_lifecycle() -> Arc<LifecycleHub> {
    Arc::clone(LIFECYCLE.get_or_init(|| Arc::new(LifecycleHub::new())))
}

/// Install `manager` as the process-wide instance and return a handle to it.
///
/// On Android this is the only way to create the shared instance, since the
/// reader needs an application `Context`.
///
/// # Errors
/// Returns [`StateError::AlreadyInstalled`] if an instance already exists;
/// `manager` is dropped in that case.
pub fn install_shared(manager: PlatformStateManager) -> StateResult<PlatformStateManager> {
    let mut installed = false;
    let shared = SHARED.get_or_init(|| {
        installed = true;
        manager
    });

    if installed {
        debug!("installed shared geolocation state manager");
        Ok(shared.clone())
    } else {
        Err(StateError::AlreadyInstalled)
    }
}

/// The process-wide instance, if one was installed or initialized.
#[must_use]
pub fn shared() -> Option<PlatformStateManager> {
    SHARED.get().cloned()
}

/// The process-wide instance, created on first use.
///
/// The manager uses the default configuration with [`shared_lifecycle`] as
/// its lifecycle source, so a foreground transition refreshes it.
///
/// # Errors
/// Returns the reader construction error; a later call tries again.
#[cfg(not(target_os = "android"))]
pub fn shared_or_init() -> StateResult<PlatformStateManager> {
    if let Some(manager) = SHARED.get() {
        return Ok(manager.clone());
    }

    let _init = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(manager) = SHARED.get() {
        return Ok(manager.clone());
    }

    let reader = crate::sys::default_reader()?;
    let config = crate::ManagerConfig::default().lifecycle(shared_lifecycle());
    let manager = SHARED.get_or_init(|| StateManager::new(reader, config));
    debug!("initialized shared geolocation state manager");
    Ok(manager.clone())
}
