//! Device information served at `/api/v2/`.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;

// ============================================================================
// DeviceInfo
// ============================================================================

/// Response of the REST root.
///
/// # Format
///
/// ```json
/// {
///   "id": "uuid:...",
///   "name": "[TV] Samsung Q80",
///   "type": "Samsung SmartTV",
///   "device": { "modelName": "QE55Q80TAT", "PowerState": "on", "TokenAuthSupport": "true" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceInfo {
    /// Device identifier.
    #[serde(default)]
    pub id: Option<String>,

    /// Friendly name.
    #[serde(default)]
    pub name: Option<String>,

    /// Device type.
    #[serde(rename = "type", default)]
    pub device_type: Option<String>,

    /// API version.
    #[serde(default)]
    pub version: Option<String>,

    /// Device details.
    #[serde(default)]
    pub device: DeviceDetails,
}

/// The `device` object of [`DeviceInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceDetails {
    /// Model name, e.g. `"QE55Q80TAT"`.
    #[serde(rename = "modelName", default)]
    pub model_name: Option<String>,

    /// Friendly name.
    #[serde(default)]
    pub name: Option<String>,

    /// Unique device name.
    #[serde(default)]
    pub duid: Option<String>,

    /// Network address as seen by the device.
    #[serde(default)]
    pub ip: Option<String>,

    /// Wi-Fi MAC address.
    #[serde(rename = "wifiMac", default)]
    pub wifi_mac: Option<String>,

    /// `"on"` or `"standby"` on models that report it.
    #[serde(rename = "PowerState", default)]
    pub power_state: Option<String>,

    /// `"true"` when the channel requires token pairing.
    #[serde(rename = "TokenAuthSupport", default)]
    pub token_auth_support: Option<String>,

    /// `"true"` on frame televisions.
    #[serde(rename = "FrameTVSupport", default)]
    pub frame_tv_support: Option<String>,
}

impl DeviceInfo {
    /// Returns `true` if the device requires token pairing.
    #[must_use]
    pub fn supports_token_auth(&self) -> bool {
        self.device.token_auth_support.as_deref() == Some("true")
    }

    /// Returns `true` for frame televisions.
    #[must_use]
    pub fn is_frame_tv(&self) -> bool {
        self.device.frame_tv_support.as_deref() == Some("true")
    }

    /// Returns `false` only when the device reports standby.
    ///
    /// Answering the request at all means the network stack is up; models
    /// without `PowerState` count as on.
    #[must_use]
    pub fn is_powered_on(&self) -> bool {
        self.device
            .power_state
            .as_deref()
            .is_none_or(|state| state.eq_ignore_ascii_case("on"))
    }
}

// ============================================================================
// Tests
// ============================================================================
