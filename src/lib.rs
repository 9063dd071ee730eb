//! # Geokit
//!
//! Cross-platform geolocation permission and provider state.
//!
//! Geokit reports what location access the application has been granted and
//! whether the device's location providers are switched on, across macOS,
//! iOS, Android, Windows, and Linux, and notifies listeners when that changes.
//!
//! ## Features
//!
//! - `permission`: Read the current location authorization.
//! - `state`: Observe permission and provider state through a shared manager.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! geokit = { version = "0.1", features = ["state"] }
//! ```
//!
//! ```rust,ignore
//! use geokit::state;
//!
//! fn watch_gps() -> Result<(), state::StateError> {
//!     let manager = state::shared_or_init()?;
//!     manager.add_listener(|state| {
//!         println!("gps: {:?}", state.gps_provider());
//!     });
//!     Ok(())
//! }
//! ```

#[cfg(feature = "permission")]
pub use geokit_permission as permission;

#[cfg(feature = "state")]
pub use geokit_state as state;
