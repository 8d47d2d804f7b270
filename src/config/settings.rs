//! Externally persisted device settings.
//!
//! The client never owns durable storage. It reads the persisted fields
//! through a [`SettingsStore`] and asks the store to persist the two values
//! it discovers on its own: a rotated token and the model name.
//!
//! # Keys
//!
//! [`Settings`] serializes with the key names used by the settings store:
//!
//! | Key | Field |
//! |-----|-------|
//! | `ipaddress` | [`Settings::ip_address`] |
//! | `mac_address` | [`Settings::mac_address`] |
//! | `token` | [`Settings::token`] |
//! | `tokenAuthSupport` | [`Settings::token_auth_support`] |
//! | `frameTVSupport` | [`Settings::frame_tv_support`] |
//! | `delay_keys` | [`Settings::delay_keys`] |
//! | `delay_channel_keys` | [`Settings::delay_channel_keys`] |
//! | `modelName` | [`Settings::model_name`] |
//! | `smartthings` | [`Settings::smartthings`] |
//! | `smartthings_token` | [`Settings::smartthings_token`] |

// ============================================================================
// Imports
// ============================================================================

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Default pause between keys of a sequence, in milliseconds.
pub const DEFAULT_DELAY_KEYS_MS: u64 = 100;

/// Default pause between digits of a channel number, in milliseconds.
pub const DEFAULT_DELAY_CHANNEL_KEYS_MS: u64 = 1250;

// ============================================================================
// Settings
// ============================================================================

/// Persisted settings of one television.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// IP address of the television.
    #[serde(rename = "ipaddress")]
    pub ip_address: String,

    /// MAC address, used by wake-on-LAN collaborators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,

    /// Token granted by the television.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Connect over `wss://` with token pairing.
    #[serde(rename = "tokenAuthSupport", default)]
    pub token_auth_support: bool,

    /// Television supports art mode.
    #[serde(rename = "frameTVSupport", default)]
    pub frame_tv_support: bool,

    /// Pause between keys of a sequence, in milliseconds.
    #[serde(default = "default_delay_keys")]
    pub delay_keys: u64,

    /// Pause between digits of a channel number, in milliseconds.
    #[serde(default = "default_delay_channel_keys")]
    pub delay_channel_keys: u64,

    /// Model name, `"unknown"` once a lookup has failed.
    #[serde(rename = "modelName", default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,

    /// Cloud fallback enabled.
    #[serde(default)]
    pub smartthings: bool,

    /// Personal access token for the cloud API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smartthings_token: Option<String>,
}

fn default_delay_keys() -> u64 {
    DEFAULT_DELAY_KEYS_MS
}

fn default_delay_channel_keys() -> u64 {
    DEFAULT_DELAY_CHANNEL_KEYS_MS
}

impl Settings {
    /// Creates settings for `ip_address` with every other field at its default.
    #[must_use]
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            mac_address: None,
            token: None,
            token_auth_support: false,
            frame_tv_support: false,
            delay_keys: DEFAULT_DELAY_KEYS_MS,
            delay_channel_keys: DEFAULT_DELAY_CHANNEL_KEYS_MS,
            model_name: None,
            smartthings: false,
            smartthings_token: None,
        }
    }
}

// ============================================================================
// SettingsStore
// ============================================================================

/// Storage owned by the embedding application.
///
/// Implementations must be cheap to call; the client reads them on every
/// cloud request.
pub trait SettingsStore: Send + Sync {
    /// Returns the current settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn load(&self) -> Result<Settings>;

    /// Persists a token granted by the television.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn save_token(&self, token: &str) -> Result<()>;

    /// Persists the model name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn save_model_name(&self, model_name: &str) -> Result<()>;
}

// ============================================================================
// MemorySettings
// ============================================================================

/// In-process [`SettingsStore`].
#[derive(Debug)]
pub struct MemorySettings {
    inner: RwLock<Settings>,
}

impl MemorySettings {
    /// Creates a store holding `settings`.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Returns a copy of the stored settings.
    #[must_use]
    pub fn snapshot(&self) -> Settings {
        self.inner.read().clone()
    }

    /// Applies `f` to the stored settings.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.inner.write());
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> Result<Settings> {
        Ok(self.snapshot())
    }

    fn save_token(&self, token: &str) -> Result<()> {
        self.inner.write().token = Some(token.to_string());
        Ok(())
    }

    fn save_model_name(&self, model_name: &str) -> Result<()> {
        self.inner.write().model_name = Some(model_name.to_string());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
