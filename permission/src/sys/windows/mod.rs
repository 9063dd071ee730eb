//! Windows authorization implementation using WinRT.

use crate::{LocationAuthorization, PermissionError, WindowsAccessStatus};

pub(crate) async fn check() -> Result<LocationAuthorization, PermissionError> {
    use windows::Devices::Geolocation::{GeolocationAccessStatus, Geolocator};

    // RequestAccessAsync only prompts once; afterwards it reports the stored choice
    let access = Geolocator::RequestAccessAsync()
        .map_err(|e| PermissionError::Platform(e.message().to_string()))?
        .get()
        .map_err(|e| PermissionError::Platform(e.message().to_string()))?;

    let status = match access {
        GeolocationAccessStatus::Allowed => WindowsAccessStatus::Allowed,
        GeolocationAccessStatus::Denied => WindowsAccessStatus::Denied,
        _ => WindowsAccessStatus::Unspecified,
    };

    Ok(LocationAuthorization::from_windows(status))
}
