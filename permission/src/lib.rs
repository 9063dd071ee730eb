//! Cross-platform location authorization checks.
//!
//! This crate reads the location permission the operating system has granted
//! the application on iOS, macOS, Android, Windows, and Linux, and maps it to a
//! single [`LocationAuthorization`] value: a [`PermissionLevel`] plus the
//! [`PermissionPrecision`] of the grant.

#![warn(missing_docs)]

mod authorization;

/// Platform-specific implementations.
pub mod sys;

pub use authorization::{
    AndroidGrants, CoreLocationAccuracy, CoreLocationStatus, LocationAuthorization,
    PermissionLevel, PermissionPrecision, WindowsAccessStatus,
};

/// Errors that can occur when reading location authorization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// Authorization checks are not supported on this platform.
    #[error("location authorization is not supported on this platform")]
    NotSupported,
    /// The platform needs a host context (e.g. an Android `Context`) to answer.
    #[error("a platform context is required: {0}")]
    ContextRequired(String),
    /// The underlying platform call failed.
    #[error("platform error: {0}")]
    Platform(String),
}

/// Check the current location authorization without prompting the user.
///
/// On Android this always fails with [`PermissionError::ContextRequired`];
/// use [`sys::android::check_with_context`] instead.
///
/// # Errors
/// Returns a [`PermissionError`] if the platform cannot be queried.
pub async fn check() -> Result<LocationAuthorization, PermissionError> {
    sys::check().await
}
