//! Remote-control command definitions.
//!
//! Every command is a JSON object whose `method` selects the sub-protocol
//! and whose `params` shape depends on the command.
//!
//! # Sub-protocols
//!
//! | Method | Commands |
//! |--------|----------|
//! | `ms.remote.control` | Keys, pointer, text input |
//! | `ms.channel.emit` | App list, app launch, art mode |
//!
//! No command carries an identifier and none is answered directly; replies
//! such as the installed-app list come back later as events.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde::Serialize;
use serde_json::{Value, json};

use crate::identifiers::AppId;

use super::key::{Key, KeyAction, MouseButton};

// ============================================================================
// Constants
// ============================================================================

/// Emit target for events handled by the television itself.
const HOST: &str = "host";

/// Event requesting the installed-app list.
pub const EVENT_INSTALLED_APPS: &str = "ed.installedApp.get";

/// Event launching an application.
pub const EVENT_APP_LAUNCH: &str = "ed.apps.launch";

/// Event addressed to the frame TV art application.
pub const EVENT_ART_REQUEST: &str = "art_app_request";

/// Application identifier of the built-in web browser.
pub const BROWSER_APP_ID: &str = "org.tizen.browser";

// ============================================================================
// Command Wrapper
// ============================================================================

/// A message sent over the remote-control channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum Command {
    /// Remote-control input (keys, pointer, text).
    #[serde(rename = "ms.remote.control")]
    RemoteControl(RemoteControl),

    /// Event emitted on the channel (apps, art mode).
    #[serde(rename = "ms.channel.emit")]
    ChannelEmit(ChannelEmit),
}

// ============================================================================
// Command Constructors
// ============================================================================

impl Command {
    /// Key event.
    #[must_use]
    pub fn key(key: &Key, action: KeyAction) -> Self {
        Self::RemoteControl(RemoteControl {
            cmd: Some(action.as_str().to_string()),
            data_of_cmd: Some(key.code().to_string()),
            option: Some("false".to_string()),
            position: None,
            type_of_remote: RemoteType::SendRemoteKey,
        })
    }

    /// Absolute pointer move, stamped with `time_ms` (epoch millis).
    #[must_use]
    pub fn mouse_move(x: i32, y: i32, time_ms: u64) -> Self {
        Self::RemoteControl(RemoteControl {
            cmd: Some("Move".to_string()),
            data_of_cmd: None,
            option: None,
            position: Some(Position { x, y, time: time_ms }),
            type_of_remote: RemoteType::ProcessMouseDevice,
        })
    }

    /// Pointer click.
    #[must_use]
    pub fn mouse_click(button: MouseButton) -> Self {
        Self::RemoteControl(RemoteControl {
            cmd: Some(button.as_str().to_string()),
            data_of_cmd: None,
            option: None,
            position: None,
            type_of_remote: RemoteType::ProcessMouseDevice,
        })
    }

    /// Text for the focused input field, base64 encoded on the wire.
    #[must_use]
    pub fn input_string(text: &str) -> Self {
        Self::RemoteControl(RemoteControl {
            cmd: Some(Base64Standard.encode(text)),
            data_of_cmd: Some("base64".to_string()),
            option: None,
            position: None,
            type_of_remote: RemoteType::SendInputString,
        })
    }

    /// Ends text input.
    #[must_use]
    pub fn input_end() -> Self {
        Self::RemoteControl(RemoteControl {
            cmd: None,
            data_of_cmd: None,
            option: None,
            position: None,
            type_of_remote: RemoteType::SendInputEnd,
        })
    }

    /// Requests the installed-app list; the answer arrives as an event.
    #[must_use]
    pub fn installed_apps() -> Self {
        Self::ChannelEmit(ChannelEmit::to_host(EVENT_INSTALLED_APPS))
    }

    /// Launches an application through the channel.
    #[must_use]
    pub fn launch_app(app_id: &AppId, launch: LaunchType, meta_tag: Option<&str>) -> Self {
        let mut data = json!({
            "appId": app_id.as_str(),
            "action_type": launch.as_str(),
        });
        if let Some(meta_tag) = meta_tag {
            data["metaTag"] = Value::String(meta_tag.to_string());
        }

        Self::ChannelEmit(ChannelEmit::to_host(EVENT_APP_LAUNCH).with_data(data))
    }

    /// Opens `url` in the built-in browser.
    #[must_use]
    pub fn launch_browser(url: &str) -> Self {
        Self::launch_app(&AppId::new(BROWSER_APP_ID), LaunchType::NativeLaunch, Some(url))
    }

    /// Turns art mode on or off.
    ///
    /// `request_id` identifies the request to the art application;
    /// `device_name` is the client name shown on the television.
    #[must_use]
    pub fn art_mode(on: bool, client_ip: Option<&str>, device_name: &str, request_id: &str) -> Self {
        let data = json!({
            "id": request_id,
            "value": if on { "on" } else { "off" },
            "request": "set_artmode_status",
        });

        Self::ChannelEmit(ChannelEmit {
            event: EVENT_ART_REQUEST.to_string(),
            to: HOST.to_string(),
            // The art application expects its payload as a JSON string
            data: Some(Value::String(data.to_string())),
            client_ip: client_ip.map(str::to_string),
            device_name: Some(Base64Standard.encode(device_name)),
        })
    }

    /// Returns the `method` value of this command.
    #[inline]
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::RemoteControl(_) => "ms.remote.control",
            Self::ChannelEmit(_) => "ms.channel.emit",
        }
    }
}

// ============================================================================
// ms.remote.control
// ============================================================================

/// Parameters of an `ms.remote.control` message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteControl {
    /// Action (`Click`, `Move`, `LeftClick`, base64 text, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,

    /// Action argument (key code, `"base64"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_of_cmd: Option<String>,

    /// Always `"false"` for key events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,

    /// Pointer position for moves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    /// Input device being emulated.
    pub type_of_remote: RemoteType,
}

/// Input device emulated by an `ms.remote.control` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemoteType {
    /// Remote-control button.
    SendRemoteKey,
    /// Pointer device.
    ProcessMouseDevice,
    /// On-screen keyboard text.
    SendInputString,
    /// End of on-screen keyboard input.
    SendInputEnd,
}

/// Pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
    /// Client timestamp in epoch milliseconds.
    #[serde(rename = "Time")]
    pub time: u64,
}

// ============================================================================
// ms.channel.emit
// ============================================================================

/// Parameters of an `ms.channel.emit` message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEmit {
    /// Event name.
    pub event: String,

    /// Recipient, `"host"` for the television.
    pub to: String,

    /// Event payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Address of this client, required by the art application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,

    /// Base64 client name, required by the art application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
}

impl ChannelEmit {
    /// Creates an event addressed to the television.
    #[must_use]
    pub fn to_host(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            to: HOST.to_string(),
            data: None,
            client_ip: None,
            device_name: None,
        }
    }

    /// Sets the payload.
    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// How the launcher starts an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LaunchType {
    /// Native Tizen application.
    #[default]
    NativeLaunch,
    /// Web application, optionally with a deep link.
    DeepLink,
}

impl LaunchType {
    /// Returns the `action_type` value sent on the wire.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LaunchType::NativeLaunch => "NATIVE_LAUNCH",
            LaunchType::DeepLink => "DEEP_LINK",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn to_value(command: &Command) -> Value {
        serde_json::to_value(command).expect("serialize")
    }

    #[test]
    fn test_key_click() {
        let value = to_value(&Command::key(&Key::Power, KeyAction::Click));
        assert_eq!(
            value,
            json!({
                "method": "ms.remote.control",
                "params": {
                    "Cmd": "Click",
                    "DataOfCmd": "KEY_POWER",
                    "Option": "false",
                    "TypeOfRemote": "SendRemoteKey"
                }
            })
        );
    }

    #[test]
    fn test_mouse_move_has_timestamp() {
        let value = to_value(&Command::mouse_move(10, -4, 1_700_000_000_000));
        let params = &value["params"];
        assert_eq!(params["Cmd"], "Move");
        assert_eq!(params["Position"], json!({ "x": 10, "y": -4, "Time": 1_700_000_000_000u64 }));
        assert_eq!(params["TypeOfRemote"], "ProcessMouseDevice");
        assert!(params.get("DataOfCmd").is_none());
    }

    #[test]
    fn test_mouse_click() {
        let value = to_value(&Command::mouse_click(MouseButton::Left));
        assert_eq!(
            value["params"],
            json!({ "Cmd": "LeftClick", "TypeOfRemote": "ProcessMouseDevice" })
        );
    }

    #[test]
    fn test_input_string_is_base64() {
        let value = to_value(&Command::input_string("héllo"));
        assert_eq!(value["params"]["Cmd"], Base64Standard.encode("héllo"));
        assert_eq!(value["params"]["DataOfCmd"], "base64");
        assert_eq!(value["params"]["TypeOfRemote"], "SendInputString");
    }

    #[test]
    fn test_input_end() {
        let value = to_value(&Command::input_end());
        assert_eq!(value["params"], json!({ "TypeOfRemote": "SendInputEnd" }));
    }

    #[test]
    fn test_installed_apps() {
        let value = to_value(&Command::installed_apps());
        assert_eq!(
            value,
            json!({
                "method": "ms.channel.emit",
                "params": { "event": "ed.installedApp.get", "to": "host" }
            })
        );
    }

    #[test]
    fn test_launch_browser() {
        let value = to_value(&Command::launch_browser("https://example.com"));
        assert_eq!(value["params"]["event"], "ed.apps.launch");
        assert_eq!(
            value["params"]["data"],
            json!({
                "appId": "org.tizen.browser",
                "action_type": "NATIVE_LAUNCH",
                "metaTag": "https://example.com"
            })
        );
    }

    #[test]
    fn test_launch_without_meta_tag() {
        let command = Command::launch_app(&AppId::new("3201907018807"), LaunchType::DeepLink, None);
        let value = to_value(&command);
        assert_eq!(value["params"]["data"]["action_type"], "DEEP_LINK");
        assert!(value["params"]["data"].get("metaTag").is_none());
    }

    #[test]
    fn test_art_mode_payload() {
        let value = to_value(&Command::art_mode(true, Some("10.0.0.2"), "remote", "req-1"));
        let params = &value["params"];
        assert_eq!(params["event"], "art_app_request");
        assert_eq!(params["clientIp"], "10.0.0.2");
        assert_eq!(params["deviceName"], Base64Standard.encode("remote"));

        let inner: Value =
            serde_json::from_str(params["data"].as_str().expect("string data")).expect("json");
        assert_eq!(
            inner,
            json!({ "id": "req-1", "value": "on", "request": "set_artmode_status" })
        );
    }

    #[test]
    fn test_method_names() {
        assert_eq!(Command::input_end().method(), "ms.remote.control");
        assert_eq!(Command::installed_apps().method(), "ms.channel.emit");
    }
}
