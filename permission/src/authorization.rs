//! Authorization values and the rules that derive them from raw OS flags.

use serde::{Deserialize, Serialize};

/// The level of location access granted to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionLevel {
    /// Location may be accessed while the application is in use.
    AuthorizedWhenInUse,
    /// Location may be accessed at any time, including in the background.
    AuthorizedAlways,
    /// Location access is not granted (denied, restricted or never asked).
    #[default]
    #[serde(alias = "denied")]
    NotAuthorized,
}

impl PermissionLevel {
    /// Returns `true` for either of the authorized levels.
    #[must_use]
    pub const fn is_authorized(self) -> bool {
        !matches!(self, Self::NotAuthorized)
    }
}

/// The precision of a granted location permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionPrecision {
    /// Precise location.
    Fine,
    /// Approximate location.
    Coarse,
    /// No location permission granted.
    #[default]
    NotAuthorized,
}

/// A permission level together with its precision.
///
/// The precision is `NotAuthorized` exactly when the level is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LocationAuthorization {
    level: PermissionLevel,
    precision: PermissionPrecision,
}

impl LocationAuthorization {
    /// No location access.
    pub const NOT_AUTHORIZED: Self = Self {
        level: PermissionLevel::NotAuthorized,
        precision: PermissionPrecision::NotAuthorized,
    };

    /// Combine a level and a precision.
    ///
    /// An unauthorized level always carries `NotAuthorized` precision. An
    /// authorized level reported without a precision is treated as `Coarse`.
    #[must_use]
    pub const fn new(level: PermissionLevel, precision: PermissionPrecision) -> Self {
        let precision = match (level, precision) {
            (PermissionLevel::NotAuthorized, _) => PermissionPrecision::NotAuthorized,
            (_, PermissionPrecision::NotAuthorized) => PermissionPrecision::Coarse,
            (_, precision) => precision,
        };
        Self { level, precision }
    }

    /// The granted level.
    #[must_use]
    pub const fn level(self) -> PermissionLevel {
        self.level
    }

    /// The precision of the grant.
    #[must_use]
    pub const fn precision(self) -> PermissionPrecision {
        self.precision
    }

    /// Derive the authorization from Android runtime permission grants.
    #[must_use]
    pub const fn from_android(grants: AndroidGrants) -> Self {
        let level = if grants.background {
            PermissionLevel::AuthorizedAlways
        } else if grants.fine || grants.coarse {
            PermissionLevel::AuthorizedWhenInUse
        } else {
            PermissionLevel::NotAuthorized
        };

        let precision = if grants.fine {
            PermissionPrecision::Fine
        } else if grants.coarse {
            PermissionPrecision::Coarse
        } else {
            PermissionPrecision::NotAuthorized
        };

        Self::new(level, precision)
    }

    /// Derive the authorization from a `CoreLocation` status.
    ///
    /// `accuracy` is `None` on systems without accuracy authorization
    /// (before iOS 14 / macOS 11), where any grant is precise.
    #[must_use]
    pub const fn from_core_location(
        status: CoreLocationStatus,
        accuracy: Option<CoreLocationAccuracy>,
    ) -> Self {
        let level = match status {
            CoreLocationStatus::AuthorizedWhenInUse => PermissionLevel::AuthorizedWhenInUse,
            CoreLocationStatus::AuthorizedAlways => PermissionLevel::AuthorizedAlways,
            CoreLocationStatus::NotDetermined
            | CoreLocationStatus::Restricted
            | CoreLocationStatus::Denied => PermissionLevel::NotAuthorized,
        };

        let precision = match accuracy {
            None | Some(CoreLocationAccuracy::Full) => PermissionPrecision::Fine,
            Some(CoreLocationAccuracy::Reduced) => PermissionPrecision::Coarse,
        };

        Self::new(level, precision)
    }

    /// Derive the authorization from the Windows geolocation access status.
    #[must_use]
    pub const fn from_windows(status: WindowsAccessStatus) -> Self {
        match status {
            WindowsAccessStatus::Allowed => Self::new(
                PermissionLevel::AuthorizedWhenInUse,
                PermissionPrecision::Fine,
            ),
            WindowsAccessStatus::Denied | WindowsAccessStatus::Unspecified => {
                Self::NOT_AUTHORIZED
            }
        }
    }

    /// Derive the authorization from a GeoClue2 `AvailableAccuracyLevel`.
    ///
    /// Levels below street accuracy (country, city, neighborhood) are coarse.
    #[must_use]
    pub const fn from_geoclue_accuracy(level: u32) -> Self {
        const STREET: u32 = 6;
        match level {
            0 => Self::NOT_AUTHORIZED,
            level if level < STREET => Self::new(
                PermissionLevel::AuthorizedWhenInUse,
                PermissionPrecision::Coarse,
            ),
            _ => Self::new(
                PermissionLevel::AuthorizedWhenInUse,
                PermissionPrecision::Fine,
            ),
        }
    }
}

/// Android location runtime permissions and whether each is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AndroidGrants {
    /// `ACCESS_FINE_LOCATION`.
    pub fine: bool,
    /// `ACCESS_COARSE_LOCATION`.
    pub coarse: bool,
    /// `ACCESS_BACKGROUND_LOCATION`.
    pub background: bool,
}

/// Mirror of `CLAuthorizationStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreLocationStatus {
    /// The user has not chosen yet.
    NotDetermined,
    /// Access is restricted, e.g. by parental controls.
    Restricted,
    /// The user denied access.
    Denied,
    /// Access granted at any time.
    AuthorizedAlways,
    /// Access granted while the app is in use.
    AuthorizedWhenInUse,
}

/// Mirror of `CLAccuracyAuthorization`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreLocationAccuracy {
    /// Precise location.
    Full,
    /// Approximate location.
    Reduced,
}

/// Mirror of WinRT `GeolocationAccessStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowsAccessStatus {
    /// Not yet decided.
    Unspecified,
    /// Access allowed.
    Allowed,
    /// Access denied.
    Denied,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grants(fine: bool, coarse: bool, background: bool) -> AndroidGrants {
        AndroidGrants {
            fine,
            coarse,
            background,
        }
    }

    #[test]
    fn unauthorized_level_forces_unauthorized_precision() {
        let auth = LocationAuthorization::new(
            PermissionLevel::NotAuthorized,
            PermissionPrecision::Fine,
        );
        assert_eq!(auth, LocationAuthorization::NOT_AUTHORIZED);
    }

    #[test]
    fn authorized_level_without_precision_is_coarse() {
        let auth = LocationAuthorization::new(
            PermissionLevel::AuthorizedAlways,
            PermissionPrecision::NotAuthorized,
        );
        assert_eq!(auth.precision(), PermissionPrecision::Coarse);
    }

    #[test]
    fn android_grants() {
        let auth = LocationAuthorization::from_android(grants(true, true, false));
        assert_eq!(auth.level(), PermissionLevel::AuthorizedWhenInUse);
        assert_eq!(auth.precision(), PermissionPrecision::Fine);

        let auth = LocationAuthorization::from_android(grants(false, true, false));
        assert_eq!(auth.precision(), PermissionPrecision::Coarse);

        let auth = LocationAuthorization::from_android(grants(true, false, true));
        assert_eq!(auth.level(), PermissionLevel::AuthorizedAlways);

        let auth = LocationAuthorization::from_android(grants(false, false, false));
        assert_eq!(auth, LocationAuthorization::NOT_AUTHORIZED);
    }

    #[test]
    fn background_grant_alone_keeps_invariant() {
        let auth = LocationAuthorization::from_android(grants(false, false, true));
        assert_eq!(auth.level(), PermissionLevel::AuthorizedAlways);
        assert_ne!(auth.precision(), PermissionPrecision::NotAuthorized);
    }

    #[test]
    fn core_location_denied_collapses() {
        for status in [
            CoreLocationStatus::Denied,
            CoreLocationStatus::Restricted,
            CoreLocationStatus::NotDetermined,
        ] {
            let auth =
                LocationAuthorization::from_core_location(status, Some(CoreLocationAccuracy::Full));
            assert_eq!(auth, LocationAuthorization::NOT_AUTHORIZED);
        }
    }

    #[test]
    fn core_location_accuracy() {
        let reduced = LocationAuthorization::from_core_location(
            CoreLocationStatus::AuthorizedWhenInUse,
            Some(CoreLocationAccuracy::Reduced),
        );
        assert_eq!(reduced.precision(), PermissionPrecision::Coarse);

        let legacy =
            LocationAuthorization::from_core_location(CoreLocationStatus::AuthorizedAlways, None);
        assert_eq!(legacy.level(), PermissionLevel::AuthorizedAlways);
        assert_eq!(legacy.precision(), PermissionPrecision::Fine);
    }

    #[test]
    fn geoclue_levels() {
        assert_eq!(
            LocationAuthorization::from_geoclue_accuracy(0),
            LocationAuthorization::NOT_AUTHORIZED
        );
        assert_eq!(
            LocationAuthorization::from_geoclue_accuracy(4).precision(),
            PermissionPrecision::Coarse
        );
        assert_eq!(
            LocationAuthorization::from_geoclue_accuracy(8).precision(),
            PermissionPrecision::Fine
        );
    }

    #[test]
    fn denied_alias_deserializes() {
        let level: PermissionLevel = serde_json::from_str("\"denied\"").unwrap();
        assert_eq!(level, PermissionLevel::NotAuthorized);
        assert_eq!(
            serde_json::to_string(&PermissionLevel::AuthorizedWhenInUse).unwrap(),
            "\"authorizedWhenInUse\""
        );
    }
}
