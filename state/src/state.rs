use serde::{Deserialize, Serialize};

use crate::{
    LocationAuthorization, PermissionLevel, PermissionPrecision, StateError, StateResult,
};

/// Whether a location provider is switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderStatus {
    /// The provider is enabled.
    Enabled,
    /// The provider is disabled.
    #[default]
    Disabled,
}

impl ProviderStatus {
    /// Map a boolean "is enabled" flag.
    #[must_use]
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled { Self::Enabled } else { Self::Disabled }
    }

    /// Returns `true` when enabled.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// A point-in-time snapshot of the device geolocation state.
///
/// Equality is structural; an absent network provider only equals another
/// absent network provider.
///
/// Serialized with the field names hosts expect:
///
/// ```json
/// {"permission":"authorizedWhenInUse","permissionType":"fine","gpsProvider":"enabled","networkProvider":null}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "StatePayload", into = "StatePayload")]
pub struct GeolocationState {
    authorization: LocationAuthorization,
    gps_provider: ProviderStatus,
    network_provider: Option<ProviderStatus>,
}

impl GeolocationState {
    /// Build a snapshot.
    ///
    /// `network_provider` is `None` on platforms without a separate network
    /// location provider.
    #[must_use]
    pub const fn new(
        authorization: LocationAuthorization,
        gps_provider: ProviderStatus,
        network_provider: Option<ProviderStatus>,
    ) -> Self {
        Self {
            authorization,
            gps_provider,
            network_provider,
        }
    }

    /// Build a snapshot from its four fields.
    ///
    /// The precision is normalized against the level the same way
    /// [`LocationAuthorization::new`] does.
    #[must_use]
    pub const fn from_parts(
        permission: PermissionLevel,
        permission_type: PermissionPrecision,
        gps_provider: ProviderStatus,
        network_provider: Option<ProviderStatus>,
    ) -> Self {
        Self::new(
            LocationAuthorization::new(permission, permission_type),
            gps_provider,
            network_provider,
        )
    }

    /// The granted permission level.
    #[must_use]
    pub const fn permission(&self) -> PermissionLevel {
        self.authorization.level()
    }

    /// The precision of the granted permission.
    #[must_use]
    pub const fn permission_type(&self) -> PermissionPrecision {
        self.authorization.precision()
    }

    /// Permission level and precision together.
    #[must_use]
    pub const fn authorization(&self) -> LocationAuthorization {
        self.authorization
    }

    /// Status of the GPS provider (location services on Apple platforms).
    #[must_use]
    pub const fn gps_provider(&self) -> ProviderStatus {
        self.gps_provider
    }

    /// Status of the network provider, if the platform has one.
    #[must_use]
    pub const fn network_provider(&self) -> Option<ProviderStatus> {
        self.network_provider
    }

    /// Copy of this snapshot with a different authorization.
    #[must_use]
    pub const fn with_authorization(mut self, authorization: LocationAuthorization) -> Self {
        self.authorization = authorization;
        self
    }

    /// Copy of this snapshot with a different GPS provider status.
    #[must_use]
    pub const fn with_gps_provider(mut self, status: ProviderStatus) -> Self {
        self.gps_provider = status;
        self
    }

    /// Copy of this snapshot with a different network provider status.
    #[must_use]
    pub const fn with_network_provider(mut self, status: Option<ProviderStatus>) -> Self {
        self.network_provider = status;
        self
    }

    /// Serialize to the JSON payload used by host bridges.
    ///
    /// # Errors
    /// Returns [`StateError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> StateResult<String> {
        serde_json::to_string(self).map_err(|err| StateError::Serialization(err.to_string()))
    }

    /// Parse the JSON payload used by host bridges.
    ///
    /// # Errors
    /// Returns [`StateError::Serialization`] if the payload is malformed.
    pub fn from_json(json: &str) -> StateResult<Self> {
        serde_json::from_str(json).map_err(|err| StateError::Serialization(err.to_string()))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatePayload {
    permission: PermissionLevel,
    permission_type: PermissionPrecision,
    gps_provider: ProviderStatus,
    #[serde(default)]
    network_provider: Option<ProviderStatus>,
}

impl From<StatePayload> for GeolocationState {
    fn from(payload: StatePayload) -> Self {
        Self::from_parts(
            payload.permission,
            payload.permission_type,
            payload.gps_provider,
            payload.network_provider,
        )
    }
}

impl From<GeolocationState> for StatePayload {
    fn from(state: GeolocationState) -> Self {
        Self {
            permission: state.permission(),
            permission_type: state.permission_type(),
            gps_provider: state.gps_provider,
            network_provider: state.network_provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fully_disabled() {
        let state = GeolocationState::default();
        assert_eq!(state.permission(), PermissionLevel::NotAuthorized);
        assert_eq!(state.permission_type(), PermissionPrecision::NotAuthorized);
        assert_eq!(state.gps_provider(), ProviderStatus::Disabled);
        assert_eq!(state.network_provider(), None);
    }

    #[test]
    fn absent_network_provider_differs_from_disabled() {
        let base = GeolocationState::default();
        assert_ne!(
            base,
            base.with_network_provider(Some(ProviderStatus::Disabled))
        );
        assert_eq!(base, base.with_network_provider(None));
    }

    #[test]
    fn json_payload_shape() {
        let state = GeolocationState::from_parts(
            PermissionLevel::AuthorizedWhenInUse,
            PermissionPrecision::Fine,
            ProviderStatus::Enabled,
            Some(ProviderStatus::Disabled),
        );
        let json = state.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"permission":"authorizedWhenInUse","permissionType":"fine","gpsProvider":"enabled","networkProvider":"disabled"}"#
        );
    }

    #[test]
    fn json_accepts_missing_and_null_network_provider() {
        let missing = GeolocationState::from_json(
            r#"{"permission":"authorizedAlways","permissionType":"coarse","gpsProvider":"enabled"}"#,
        )
        .unwrap();
        let null = GeolocationState::from_json(
            r#"{"permission":"authorizedAlways","permissionType":"coarse","gpsProvider":"enabled","networkProvider":null}"#,
        )
        .unwrap();
        assert_eq!(missing, null);
        assert_eq!(missing.network_provider(), None);
    }

    #[test]
    fn deserialization_keeps_permission_invariant() {
        let denied = GeolocationState::from_json(
            r#"{"permission":"denied","permissionType":"fine","gpsProvider":"enabled","networkProvider":null}"#,
        )
        .unwrap();
        assert_eq!(denied.permission(), PermissionLevel::NotAuthorized);
        assert_eq!(denied.permission_type(), PermissionPrecision::NotAuthorized);

        let unknown_precision = GeolocationState::from_json(
            r#"{"permission":"authorizedWhenInUse","permissionType":"notAuthorized","gpsProvider":"disabled"}"#,
        )
        .unwrap();
        assert_eq!(unknown_precision.permission_type(), PermissionPrecision::Coarse);
    }

    #[test]
    fn malformed_payload_is_a_serialization_error() {
        let err = GeolocationState::from_json(r#"{"permission":"sometimes"}"#).unwrap_err();
        assert!(matches!(err, StateError::Serialization(_)));
    }
}
