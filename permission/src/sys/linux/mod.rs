//! Linux authorization implementation using the GeoClue2 D-Bus service.
//!
//! Linux has no runtime location prompt. The agent configuration decides the
//! accuracy GeoClue will hand out, which is published on the manager object as
//! `AvailableAccuracyLevel`.

use crate::{LocationAuthorization, PermissionError};

pub(crate) async fn check() -> Result<LocationAuthorization, PermissionError> {
    use zbus::Connection;

    let connection = Connection::system()
        .await
        .map_err(|e| PermissionError::Platform(format!("D-Bus connection failed: {e}")))?;

    let reply: zbus::zvariant::OwnedValue = connection
        .call_method(
            Some("org.freedesktop.GeoClue2"),
            "/org/freedesktop/GeoClue2/Manager",
            Some("org.freedesktop.DBus.Properties"),
            "Get",
            &("org.freedesktop.GeoClue2.Manager", "AvailableAccuracyLevel"),
        )
        .await
        .map_err(|e| PermissionError::Platform(format!("GeoClue2 not available: {e}")))?
        .body()
        .deserialize()
        .map_err(|e| PermissionError::Platform(format!("Failed to parse response: {e}")))?;

    let level = reply
        .downcast_ref::<u32>()
        .map_err(|e| PermissionError::Platform(format!("Unexpected accuracy level: {e}")))?;

    Ok(LocationAuthorization::from_geoclue_accuracy(level))
}
