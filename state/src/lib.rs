//! Cross-platform geolocation state.
//!
//! This crate tracks the location permission granted to the application and
//! whether the device's location providers are switched on, on iOS, macOS,
//! Android, Windows, and Linux. A [`StateManager`] keeps the last known
//! [`GeolocationState`] and tells listeners when, and only when, it changes:
//!
//! ```ignore
//! use geokit_state::shared_or_init;
//!
//! let manager = shared_or_init()?;
//! let _subscription = manager.subscribe(|state| {
//!     println!("gps is {:?}, permission {:?}", state.gps_provider(), state.permission());
//! });
//! ```
//!
//! Changes are picked up from platform events while listening, and by
//! re-reading the state whenever the host reports that the application
//! returned to the foreground (see [`LifecycleHub`]).

#![warn(missing_docs)]

mod config;
mod error;
mod lifecycle;
mod listener;
mod manager;
mod reader;
mod shared;
mod state;
mod stream;

/// Platform-specific implementations.
pub mod sys;

pub use config::ManagerConfig;
pub use error::{StateError, StateResult};
pub use lifecycle::{AppLifecycle, LifecycleDelegate, LifecycleHub, LifecycleSignal, UnknownLifecycle};
pub use listener::{Listener, ListenerId, Subscription};
pub use manager::{ListeningState, StateManager};
pub use reader::{PlatformStateReader, StateDelegate};
#[cfg(not(target_os = "android"))]
pub use shared::shared_or_init;
pub use shared::{PlatformStateManager, install_shared, shared, shared_lifecycle};
pub use state::{GeolocationState, ProviderStatus};
pub use stream::StateStream;
pub use sys::PlatformReader;

pub use geokit_permission::{LocationAuthorization, PermissionError, PermissionLevel, PermissionPrecision};
