//! Cloud registry payloads.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::CloudDeviceId;

// ============================================================================
// Constants
// ============================================================================

/// Capability that marks a registered device as a television.
pub const TV_CHANNEL_CAPABILITY: &str = "tvChannel";

/// Component addressed by single-component commands.
pub const MAIN_COMPONENT: &str = "main";

/// Capability for input source selection.
pub const INPUT_SOURCE_CAPABILITY: &str = "mediaInputSource";

/// Health state reported by a reachable device.
pub const STATE_ONLINE: &str = "ONLINE";

// ============================================================================
// Devices
// ============================================================================

/// Response of `GET /devices`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceList {
    /// Registered devices.
    #[serde(default)]
    pub items: Vec<CloudDevice>,
}

/// A registered device.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDevice {
    /// Registry identifier.
    pub device_id: CloudDeviceId,

    /// User-assigned label.
    #[serde(default)]
    pub label: Option<String>,

    /// Manufacturer name.
    #[serde(default)]
    pub name: Option<String>,

    /// Components and their capabilities.
    #[serde(default)]
    pub components: Vec<Component>,
}

impl CloudDevice {
    /// Returns `true` if any component exposes `capability`.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.components
            .iter()
            .flat_map(|c| &c.capabilities)
            .any(|cap| cap.id == capability)
    }
}

/// A device component.
#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    /// Component name, `"main"` for most devices.
    pub id: String,
    /// Exposed capabilities.
    #[serde(default)]
    pub capabilities: Vec<CapabilityRef>,
}

/// A capability reference inside a component.
#[derive(Debug, Clone, Deserialize)]
pub struct CapabilityRef {
    /// Capability name.
    pub id: String,
    /// Capability version.
    #[serde(default)]
    pub version: Option<u32>,
}

// ============================================================================
// Commands
// ============================================================================

/// One `{component, capability, command, arguments}` triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityCommand {
    pub component: String,
    pub capability: String,
    pub command: String,
    pub arguments: Vec<Value>,
}

impl CapabilityCommand {
    /// Creates a command on the main component without arguments.
    #[must_use]
    pub fn new(capability: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            component: MAIN_COMPONENT.to_string(),
            capability: capability.into(),
            command: command.into(),
            arguments: Vec::new(),
        }
    }

    /// Targets `component` instead of the main one.
    #[must_use]
    pub fn on_component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    /// Appends an argument.
    #[must_use]
    pub fn with_argument(mut self, argument: impl Into<Value>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// Switches the input source to `source`.
    #[must_use]
    pub fn set_input_source(source: &str) -> Self {
        Self::new(INPUT_SOURCE_CAPABILITY, "setInputSource").with_argument(source)
    }
}

// ============================================================================
// Health
// ============================================================================

/// Reachability of the television as seen by the cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// Reported `ONLINE`.
    Online,
    /// Reported any other state.
    Offline,
    /// The cloud could not be asked.
    Unknown,
}

impl Health {
    /// Maps a reported health state.
    #[must_use]
    pub fn from_state(state: Option<&str>) -> Self {
        match state {
            Some(STATE_ONLINE) => Self::Online,
            _ => Self::Offline,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_capability_search() {
        let list: DeviceList = serde_json::from_value(json!({
            "items": [
                { "deviceId": "lamp", "components": [{ "id": "main", "capabilities": [{ "id": "switch" }] }] },
                { "deviceId": "tv", "label": "Living room", "components": [
                    { "id": "main", "capabilities": [{ "id": "switch" }, { "id": "tvChannel", "version": 1 }] }
                ]}
            ]
        }))
        .expect("devices");

        assert!(!list.items[0].has_capability(TV_CHANNEL_CAPABILITY));
        assert!(list.items[1].has_capability(TV_CHANNEL_CAPABILITY));
        assert_eq!(list.items[1].device_id.as_str(), "tv");
    }

    #[test]
    fn test_set_input_source_shape() {
        let command = serde_json::to_value(CapabilityCommand::set_input_source("HDMI1")).expect("json");
        assert_eq!(
            command,
            json!({
                "component": "main",
                "capability": "mediaInputSource",
                "command": "setInputSource",
                "arguments": ["HDMI1"]
            })
        );
    }

    #[test]
    fn test_health_from_state() {
        assert_eq!(Health::from_state(Some("ONLINE")), Health::Online);
        assert_eq!(Health::from_state(Some("OFFLINE")), Health::Offline);
        assert_eq!(Health::from_state(None), Health::Offline);
    }
}
