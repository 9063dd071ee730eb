use thiserror::Error;

use crate::PermissionError;

/// Errors that can occur while reading or observing geolocation state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Geolocation state cannot be read on this platform.
    #[error("geolocation state is not supported on this platform")]
    NotSupported,

    /// An unsubscribe was requested while nothing was registered.
    #[error("state change receiver is not registered")]
    NotListening,

    /// Registering with the platform event source failed.
    #[error("subscription failed: {0}")]
    Subscription(String),

    /// Reading the current state from the platform failed.
    #[error("failed to fetch geolocation state: {0}")]
    Fetch(String),

    /// Reading the location authorization failed.
    #[error("permission check failed: {0}")]
    Permission(#[from] PermissionError),

    /// A state payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A process-wide manager has already been installed.
    #[error("a shared state manager is already installed")]
    AlreadyInstalled,
}

/// Result type for geolocation state operations.
pub type StateResult<T> = std::result::Result<T, StateError>;
