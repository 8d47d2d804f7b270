//! Event message types.
//!
//! Events are pushed by the television over the remote-control channel.
//! None of them answers a specific command, so they are dispatched by
//! event name only.
//!
//! # Event Types
//!
//! | Event | Meaning |
//! |-------|---------|
//! | `ms.channel.connect` | Connection acknowledged, may carry a fresh token |
//! | `ms.channel.unauthorized` | Pairing was declined on the television |
//! | `ed.installedApp.get` | Installed-app list |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::identifiers::AppId;

use super::command::EVENT_INSTALLED_APPS;

// ============================================================================
// Constants
// ============================================================================

/// Connection acknowledgement.
pub const EVENT_CHANNEL_CONNECT: &str = "ms.channel.connect";

/// Pairing declined.
pub const EVENT_UNAUTHORIZED: &str = "ms.channel.unauthorized";

// ============================================================================
// Event
// ============================================================================

/// A raw event from the television.
///
/// # Format
///
/// ```json
/// {
///   "event": "ms.channel.connect",
///   "data": { "token": "12345678", "clients": [ ... ] }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Event name.
    pub event: String,

    /// Event-specific data, `Null` when absent.
    #[serde(default)]
    pub data: Value,
}

impl Event {
    /// Parses an event from a text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not an object with an `event` field.
    pub fn from_text(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        match self.event.as_str() {
            EVENT_CHANNEL_CONNECT => ParsedEvent::ChannelConnect {
                token: self.token(),
            },

            EVENT_UNAUTHORIZED => ParsedEvent::Unauthorized,

            EVENT_INSTALLED_APPS => {
                // The list is nested one level deeper than other payloads
                let list = self.data.get("data").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<Vec<AppEntry>>(list) {
                    Ok(apps) => ParsedEvent::InstalledApps(apps),
                    Err(e) => ParsedEvent::Malformed {
                        event: self.event.clone(),
                        message: e.to_string(),
                    },
                }
            }

            _ => ParsedEvent::Other {
                event: self.event.clone(),
            },
        }
    }

    /// Returns the non-empty `data.token`, if any.
    fn token(&self) -> Option<String> {
        match self.data.get("token") {
            Some(Value::String(token)) if !token.is_empty() => Some(token.clone()),
            Some(Value::Number(token)) => Some(token.to_string()),
            _ => None,
        }
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Typed view of an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    /// Connection acknowledged.
    ChannelConnect {
        /// Token issued by the television, if any.
        token: Option<String>,
    },

    /// Pairing was declined on the television.
    Unauthorized,

    /// Installed-app list.
    InstalledApps(Vec<AppEntry>),

    /// Known event whose payload did not have the expected shape.
    Malformed {
        /// Event name.
        event: String,
        /// Decoding failure.
        message: String,
    },

    /// Event this client does not handle.
    Other {
        /// Event name.
        event: String,
    },
}

/// One entry of the installed-app list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppEntry {
    /// Application identifier.
    #[serde(rename = "appId")]
    pub app_id: AppId,

    /// Display name.
    pub name: String,
}

// ============================================================================
// Tests
// ============================================================================
