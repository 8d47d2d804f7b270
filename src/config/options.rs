//! Working configuration of a remote client.
//!
//! [`Config`] combines the persisted [`Settings`] with protocol defaults.
//! It is shared by reference between the connection manager, the command
//! paths and the caller as a [`SharedConfig`], so a token rotated by the
//! television is visible to everyone as soon as it is written.
//!
//! # Example
//!
//! ```ignore
//! use samsung_remote::{Config, Settings};
//!
//! let config = Config::from_settings(&Settings::new("192.168.1.20"))
//!     .with_name("living-room")
//!     .with_idle_timeout(Duration::from_secs(60));
//!
//! assert_eq!(
//!     config.ws_url(),
//!     "ws://192.168.1.20:8001/api/v2/channels/samsung.remote.control?name=bGl2aW5nLXJvb20="
//! );
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::identifiers::AppId;

use super::settings::Settings;

// ============================================================================
// Constants
// ============================================================================

/// Client name announced to the television.
pub const DEFAULT_CLIENT_NAME: &str = "samsung-remote";

/// Plain remote-control and REST port.
pub const DEFAULT_PORT: u16 = 8001;

/// `wss://` port used in token mode.
pub const DEFAULT_SECURE_PORT: u16 = 8002;

/// DIAL port serving YouTube launch and legacy pairing.
pub const DEFAULT_DIAL_PORT: u16 = 8080;

/// Cloud API base URL.
pub const DEFAULT_CLOUD_BASE_URL: &str = "https://api.smartthings.com/v1";

/// Deadline for opening the WebSocket and receiving the acknowledgement.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for device-info queries.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(2);

/// Deadline for application lifecycle calls.
pub const DEFAULT_APP_TIMEOUT: Duration = Duration::from_secs(10);

/// How long frame televisions need `KEY_POWER` held to switch off.
pub const FRAME_POWER_OFF_HOLD: Duration = Duration::from_millis(5000);

/// Inactivity window after which the WebSocket is closed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Path of the remote-control channel.
const CHANNEL_PATH: &str = "/api/v2/channels/samsung.remote.control";

// ============================================================================
// Types
// ============================================================================

/// Configuration shared between the client and its owner.
pub type SharedConfig = Arc<RwLock<Config>>;

// ============================================================================
// Config
// ============================================================================

/// Working configuration of one television client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// IP address or host name of the television.
    pub address: String,

    /// MAC address, passed through for wake-on-LAN.
    pub mac_address: Option<String>,

    /// Address of this client, announced in art-mode requests.
    pub client_ip: Option<String>,

    /// Client name shown on the television.
    pub name: String,

    /// Plain WebSocket and REST port.
    pub port: u16,

    /// Secure WebSocket port.
    pub secure_port: u16,

    /// DIAL port.
    pub dial_port: u16,

    /// Connect over `wss://` with token pairing.
    pub token_auth: bool,

    /// Current token. Written only by the connection manager.
    pub token: Option<String>,

    /// Television supports art mode and needs a long press to power off.
    pub frame_tv: bool,

    /// Pause between keys of a sequence.
    pub delay_keys: Duration,

    /// Pause between digits of a channel number.
    pub delay_channel_keys: Duration,

    /// How long `KEY_POWER` is held to switch a frame television off.
    pub power_off_hold: Duration,

    /// Known model name.
    pub model_name: Option<String>,

    /// Cloud API base URL.
    pub cloud_base_url: String,

    /// WebSocket connect deadline.
    pub connect_timeout: Duration,

    /// Device-info deadline.
    pub api_timeout: Duration,

    /// Application lifecycle deadline.
    pub app_timeout: Duration,

    /// WebSocket inactivity window.
    pub idle_timeout: Duration,
}

// ============================================================================
// Constructors
// ============================================================================

impl Config {
    /// Creates a plain-mode configuration for `address`.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self::from_settings(&Settings::new(address))
    }

    /// Builds a configuration from persisted settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            address: settings.ip_address.clone(),
            mac_address: settings.mac_address.clone(),
            client_ip: None,
            name: DEFAULT_CLIENT_NAME.to_string(),
            port: DEFAULT_PORT,
            secure_port: DEFAULT_SECURE_PORT,
            dial_port: DEFAULT_DIAL_PORT,
            token_auth: settings.token_auth_support,
            token: settings.token.clone().filter(|t| !t.is_empty()),
            frame_tv: settings.frame_tv_support,
            delay_keys: Duration::from_millis(settings.delay_keys),
            delay_channel_keys: Duration::from_millis(settings.delay_channel_keys),
            power_off_hold: FRAME_POWER_OFF_HOLD,
            model_name: settings.model_name.clone(),
            cloud_base_url: DEFAULT_CLOUD_BASE_URL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            api_timeout: DEFAULT_API_TIMEOUT,
            app_timeout: DEFAULT_APP_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Wraps the configuration for sharing.
    #[inline]
    #[must_use]
    pub fn shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Config {
    /// Sets the client name.
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the client address announced in art-mode requests.
    #[inline]
    #[must_use]
    pub fn with_client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = Some(client_ip.into());
        self
    }

    /// Overrides the plain, secure and DIAL ports.
    #[inline]
    #[must_use]
    pub fn with_ports(mut self, port: u16, secure_port: u16, dial_port: u16) -> Self {
        self.port = port;
        self.secure_port = secure_port;
        self.dial_port = dial_port;
        self
    }

    /// Sets the WebSocket inactivity window.
    #[inline]
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets the WebSocket connect deadline.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the cloud API base URL.
    #[inline]
    #[must_use]
    pub fn with_cloud_base_url(mut self, url: impl Into<String>) -> Self {
        self.cloud_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

// ============================================================================
// Addressing
// ============================================================================

impl Config {
    /// Returns the remote-control channel URL for the current mode and token.
    #[must_use]
    pub fn ws_url(&self) -> String {
        self.ws_url_for(self.token_auth, self.token.as_deref())
    }

    /// Returns the channel URL for an explicit mode and token.
    #[must_use]
    pub fn ws_url_for(&self, secure: bool, token: Option<&str>) -> String {
        let (scheme, port) = if secure {
            ("wss", self.secure_port)
        } else {
            ("ws", self.port)
        };

        let mut url = format!(
            "{scheme}://{}:{port}{CHANNEL_PATH}?name={}",
            self.address,
            self.encoded_name()
        );
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            url.push_str("&token=");
            url.push_str(token);
        }
        url
    }

    /// Returns `host:port` of the channel for the current mode.
    #[must_use]
    pub fn ws_address(&self) -> String {
        let port = if self.token_auth {
            self.secure_port
        } else {
            self.port
        };
        format!("{}:{port}", self.address)
    }

    /// Returns the REST root, for `address` or the configured one.
    #[must_use]
    pub fn api_url(&self, address: Option<&str>) -> String {
        format!(
            "http://{}:{}/api/v2/",
            address.unwrap_or(&self.address),
            self.port
        )
    }

    /// Returns the lifecycle URL of an application.
    #[must_use]
    pub fn app_url(&self, app_id: &AppId) -> String {
        format!("{}applications/{app_id}", self.api_url(None))
    }

    /// Returns a URL on the DIAL port; `path` starts with `/`.
    #[must_use]
    pub fn dial_url(&self, path: &str) -> String {
        format!("http://{}:{}{path}", self.address, self.dial_port)
    }

    /// Returns `true` if the handshake offers a token.
    ///
    /// Decides between a missing and an invalid token when the television
    /// rejects the connection.
    #[inline]
    #[must_use]
    pub fn token_present(&self) -> bool {
        self.token_auth && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Returns the base64 client name.
    #[must_use]
    pub fn encoded_name(&self) -> String {
        Base64Standard.encode(&self.name)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty address or name, or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::config(
                "Television address is required. Use .address() to set it.",
            ));
        }
        if self.name.is_empty() {
            return Err(Error::config("Client name must not be empty"));
        }
        if self.connect_timeout.is_zero() || self.idle_timeout.is_zero() {
            return Err(Error::config("Timeouts must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_settings() {
        let mut settings = Settings::new("192.168.1.20");
        settings.delay_keys = 250;
        let config = Config::from_settings(&settings);

        assert_eq!(config.port, 8001);
        assert_eq!(config.secure_port, 8002);
        assert_eq!(config.dial_port, 8080);
        assert_eq!(config.delay_keys, Duration::from_millis(250));
        assert_eq!(config.idle_timeout, Duration::from_secs(120));
        assert_eq!(config.app_timeout, Duration::from_secs(10));
        assert!(!config.token_auth);
    }

    #[test]
    fn test_plain_ws_url() {
        let config = Config::new("192.168.1.20").with_name("homey");
        assert_eq!(
            config.ws_url(),
            "ws://192.168.1.20:8001/api/v2/channels/samsung.remote.control?name=aG9tZXk="
        );
        assert_eq!(config.ws_address(), "192.168.1.20:8001");
    }

    #[test]
    fn test_token_ws_url() {
        let mut settings = Settings::new("192.168.1.20");
        settings.token_auth_support = true;
        settings.token = Some("777".to_string());
        let config = Config::from_settings(&settings).with_name("homey");

        assert_eq!(
            config.ws_url(),
            "wss://192.168.1.20:8002/api/v2/channels/samsung.remote.control?name=aG9tZXk=&token=777"
        );
        assert!(config.token_present());
        assert_eq!(config.ws_address(), "192.168.1.20:8002");
    }

    #[test]
    fn test_empty_token_is_absent() {
        let mut settings = Settings::new("10.0.0.1");
        settings.token_auth_support = true;
        settings.token = Some(String::new());
        let config = Config::from_settings(&settings);

        assert_eq!(config.token, None);
        assert!(!config.token_present());
        assert!(!config.ws_url().contains("token="));
    }

    #[test]
    fn test_http_urls() {
        let config = Config::new("10.0.0.5");
        assert_eq!(config.api_url(None), "http://10.0.0.5:8001/api/v2/");
        assert_eq!(config.api_url(Some("10.0.0.9")), "http://10.0.0.9:8001/api/v2/");
        assert_eq!(
            config.app_url(&AppId::new("netflix")),
            "http://10.0.0.5:8001/api/v2/applications/netflix"
        );
        assert_eq!(
            config.dial_url("/ws/apps/YouTube"),
            "http://10.0.0.5:8080/ws/apps/YouTube"
        );
    }

    #[test]
    fn test_validate() {
        assert!(Config::new("10.0.0.5").validate().is_ok());
        assert!(Config::new("  ").validate().is_err());
        assert!(
            Config::new("10.0.0.5")
                .with_idle_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_cloud_base_url_trims_slash() {
        let config = Config::new("10.0.0.5").with_cloud_base_url("http://127.0.0.1:9/v1/");
        assert_eq!(config.cloud_base_url, "http://127.0.0.1:9/v1");
    }
}
