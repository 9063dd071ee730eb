//! Apple platform (iOS/macOS) authorization implementation using swift-bridge.

use crate::{CoreLocationAccuracy, CoreLocationStatus, LocationAuthorization, PermissionError};

#[swift_bridge::bridge]
mod ffi {
    // Mirrors CLAuthorizationStatus
    enum AuthorizationStatus {
        NotDetermined,
        Restricted,
        Denied,
        AuthorizedAlways,
        AuthorizedWhenInUse,
    }

    // Unavailable before iOS 14 / macOS 11
    enum AccuracyAuthorization {
        Full,
        Reduced,
        Unavailable,
    }

    extern "Swift" {
        fn location_authorization_status() -> AuthorizationStatus;
        fn location_accuracy_authorization() -> AccuracyAuthorization;
    }
}

const fn status_from_ffi(status: ffi::AuthorizationStatus) -> CoreLocationStatus {
    match status {
        ffi::AuthorizationStatus::NotDetermined => CoreLocationStatus::NotDetermined,
        ffi::AuthorizationStatus::Restricted => CoreLocationStatus::Restricted,
        ffi::AuthorizationStatus::Denied => CoreLocationStatus::Denied,
        ffi::AuthorizationStatus::AuthorizedAlways => CoreLocationStatus::AuthorizedAlways,
        ffi::AuthorizationStatus::AuthorizedWhenInUse => CoreLocationStatus::AuthorizedWhenInUse,
    }
}

const fn accuracy_from_ffi(accuracy: ffi::AccuracyAuthorization) -> Option<CoreLocationAccuracy> {
    match accuracy {
        ffi::AccuracyAuthorization::Full => Some(CoreLocationAccuracy::Full),
        ffi::AccuracyAuthorization::Reduced => Some(CoreLocationAccuracy::Reduced),
        ffi::AccuracyAuthorization::Unavailable => None,
    }
}

/// Check location authorization on Apple platforms.
///
/// # Errors
/// Always returns `Ok`; `CoreLocation` reports the status directly.
pub async fn check() -> Result<LocationAuthorization, PermissionError> {
    let status = status_from_ffi(ffi::location_authorization_status());
    let accuracy = accuracy_from_ffi(ffi::location_accuracy_authorization());
    Ok(LocationAuthorization::from_core_location(status, accuracy))
}
