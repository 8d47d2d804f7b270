//! Cloud registry client.
//!
//! Every call reads the bearer token from the settings store first, so a
//! disabled or unconfigured cloud fails before any request is made. The
//! television is found by capability search once and cached until
//! [`CloudClient::clear_device`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::SettingsStore;
use crate::error::{Error, Result};
use crate::identifiers::CloudDeviceId;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

use super::types::{CapabilityCommand, DeviceList, Health, TV_CHANNEL_CAPABILITY};

// ============================================================================
// Constants
// ============================================================================

/// Deadline of a single cloud request.
pub const DEFAULT_CLOUD_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// CloudClient
// ============================================================================

/// Client for the cloud device registry.
pub struct CloudClient {
    http: Arc<dyn HttpTransport>,
    settings: Arc<dyn SettingsStore>,
    base_url: String,
    device: Mutex<Option<CloudDeviceId>>,
    timeout: Duration,
}

impl std::fmt::Debug for CloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClient")
            .field("base_url", &self.base_url)
            .field("device", &*self.device.lock())
            .finish_non_exhaustive()
    }
}

impl CloudClient {
    /// Creates a client against `base_url`, e.g. `https://api.smartthings.com/v1`.
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpTransport>,
        settings: Arc<dyn SettingsStore>,
        base_url: String,
    ) -> Self {
        Self {
            http,
            settings,
            base_url,
            device: Mutex::new(None),
            timeout: DEFAULT_CLOUD_TIMEOUT,
        }
    }

    /// Returns `true` if the settings enable the cloud and carry a token.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.token().is_ok()
    }

    /// Forgets the resolved television.
    ///
    /// Call after the address or credentials change.
    pub fn clear_device(&self) {
        *self.device.lock() = None;
    }

    /// Lists the registered devices.
    ///
    /// # Errors
    ///
    /// - [`Error::CloudNotEnabled`] / [`Error::CloudNoToken`] before any request
    /// - [`Error::CloudTokenInvalid`] on `401`
    /// - the classified HTTP failure otherwise
    pub async fn devices(&self) -> Result<DeviceList> {
        let token = self.token()?;
        let url = format!("{}/devices", self.base_url);
        let response = self.send(HttpRequest::get(url), token).await?;

        if response.status == 401 {
            info!("Cloud rejected the access token");
            return Err(Error::CloudTokenInvalid);
        }
        if let Err(e) = response.check() {
            info!(status = response.status, "Listing cloud devices failed");
            return Err(e);
        }
        response.json()
    }

    /// Returns the television's registry identifier.
    ///
    /// The first device exposing the TV channel capability wins. The
    /// result is cached.
    ///
    /// # Errors
    ///
    /// - [`Error::CloudNoTvFound`] if no device qualifies
    /// - any error of [`CloudClient::devices`]
    pub async fn tv_device(&self) -> Result<CloudDeviceId> {
        if let Some(id) = self.device.lock().clone() {
            return Ok(id);
        }

        let devices = self.devices().await?;
        let id = devices
            .items
            .into_iter()
            .find(|d| d.has_capability(TV_CHANNEL_CAPABILITY))
            .map(|d| d.device_id)
            .ok_or(Error::CloudNoTvFound)?;

        debug!(device_id = %id, "Cloud television resolved");
        *self.device.lock() = Some(id.clone());
        Ok(id)
    }

    /// Returns the television's health.
    ///
    /// Never fails; anything that prevents an answer is [`Health::Unknown`].
    pub async fn health(&self) -> Health {
        match self.device_get("/health").await {
            Ok(value) => {
                let health = Health::from_state(value.get("state").and_then(Value::as_str));
                debug!(?health, "Cloud health");
                health
            }
            Err(e) => {
                debug!(error = %e, "Cloud health unavailable");
                Health::Unknown
            }
        }
    }

    /// Returns the input sources the television supports.
    ///
    /// Failures yield an empty list.
    pub async fn input_sources(&self) -> Vec<String> {
        let status = match self.device_get("/status").await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Reading cloud input sources failed");
                return Vec::new();
            }
        };

        status
            .pointer("/components/main/mediaInputSource/supportedInputSources/value")
            .and_then(Value::as_array)
            .map(|sources| {
                sources
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Switches the television to `source`.
    ///
    /// # Errors
    ///
    /// Returns any error of [`CloudClient::execute`].
    pub async fn set_input_source(&self, source: &str) -> Result<()> {
        self.execute(&[CapabilityCommand::set_input_source(source)])
            .await
    }

    /// Sends capability commands to the television.
    ///
    /// # Errors
    ///
    /// - any error of [`CloudClient::tv_device`]
    /// - the classified HTTP failure
    pub async fn execute(&self, commands: &[CapabilityCommand]) -> Result<()> {
        let device_id = self.tv_device().await?;
        let token = self.token()?;
        let url = format!("{}/devices/{device_id}/commands", self.base_url);

        info!(%device_id, count = commands.len(), "Sending cloud commands");
        let request = HttpRequest::post(url).with_json(json!({ "commands": commands }));
        let response = self.send(request, token).await?;

        if let Err(e) = response.check() {
            info!(status = response.status, body = %response.body, "Cloud command failed");
            return Err(e);
        }
        Ok(())
    }

    /// Reads `/devices/{id}{path}` as JSON.
    async fn device_get(&self, path: &str) -> Result<Value> {
        let device_id = self.tv_device().await?;
        let token = self.token()?;
        let url = format!("{}/devices/{device_id}{path}", self.base_url);

        let response = self.send(HttpRequest::get(url), token).await?;
        response.check()?;
        response.json()
    }

    /// Reads the bearer token from the settings store.
    fn token(&self) -> Result<String> {
        let settings = self.settings.load()?;
        if !settings.smartthings {
            return Err(Error::CloudNotEnabled);
        }
        settings
            .smartthings_token
            .filter(|token| !token.is_empty())
            .ok_or(Error::CloudNoToken)
    }

    async fn send(&self, request: HttpRequest, token: String) -> Result<HttpResponse> {
        self.http
            .execute(request.with_bearer(token).with_timeout(self.timeout))
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::{MemorySettings, Settings};
    use crate::error::ErrorKind;
    use crate::transport::testing::MockHttp;
    use crate::transport::{Body, Method};

    const BASE: &str = "https://cloud.test/v1";

    fn client(http: &Arc<MockHttp>, enabled: bool, token: Option<&str>) -> CloudClient {
        let mut settings = Settings::new("10.0.0.5");
        settings.smartthings = enabled;
        settings.smartthings_token = token.map(str::to_string);

        CloudClient::new(
            Arc::clone(http) as Arc<dyn HttpTransport>,
            Arc::new(MemorySettings::new(settings)),
            BASE.to_string(),
        )
    }

    fn with_tv(http: &MockHttp) -> &MockHttp {
        http.route(
            Method::Get,
            "/v1/devices",
            200,
            json!({ "items": [
                { "deviceId": "fridge", "components": [{ "id": "main", "capabilities": [{ "id": "refrigeration" }] }] },
                { "deviceId": "tv-1", "components": [{ "id": "main", "capabilities": [{ "id": "tvChannel" }] }] }
            ]}),
        )
    }

    #[tokio::test]
    async fn test_device_is_cached() {
        let http = MockHttp::new();
        with_tv(&http);
        let cloud = client(&http, true, Some("pat"));

        assert_eq!(cloud.tv_device().await.expect("tv").as_str(), "tv-1");
        assert_eq!(cloud.tv_device().await.expect("tv").as_str(), "tv-1");
        assert_eq!(http.count(Method::Get, "/devices"), 1);

        cloud.clear_device();
        cloud.tv_device().await.expect("tv");
        assert_eq!(http.count(Method::Get, "/devices"), 2);
    }

    #[tokio::test]
    async fn test_disabled_or_tokenless_makes_no_request() {
        let http = MockHttp::new();

        let err = client(&http, false, Some("pat")).tv_device().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CloudNotEnabled);

        let err = client(&http, true, None).tv_device().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CloudNoToken);

        let err = client(&http, true, Some("")).set_input_source("HDMI1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CloudNoToken);

        assert!(http.requests().is_empty());
        assert!(!client(&http, true, None).is_enabled());
    }

    #[tokio::test]
    async fn test_rejected_token() {
        let http = MockHttp::new();
        http.route(Method::Get, "/v1/devices", 401, json!({}));

        let err = client(&http, true, Some("stale")).tv_device().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CloudTokenInvalid);
        assert_eq!(http.requests()[0].bearer.as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_no_television_registered() {
        let http = MockHttp::new();
        http.route(Method::Get, "/v1/devices", 200, json!({ "items": [] }));

        let err = client(&http, true, Some("pat")).tv_device().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CloudNoTvFound);
    }

    #[tokio::test]
    async fn test_health_states() {
        let http = MockHttp::new();
        with_tv(&http).route(Method::Get, "/devices/tv-1/health", 200, json!({ "state": "ONLINE" }));
        let cloud = client(&http, true, Some("pat"));
        assert_eq!(cloud.health().await, Health::Online);

        let http = MockHttp::new();
        http.route(Method::Get, "/v1/devices", 500, json!({}));
        assert_eq!(client(&http, true, Some("pat")).health().await, Health::Unknown);
    }

    #[tokio::test]
    async fn test_input_sources() {
        let http = MockHttp::new();
        with_tv(&http).route(
            Method::Get,
            "/devices/tv-1/status",
            200,
            json!({ "components": { "main": { "mediaInputSource": {
                "supportedInputSources": { "value": ["digitalTv", "HDMI1", "HDMI2"] }
            }}}}),
        );
        let cloud = client(&http, true, Some("pat"));

        assert_eq!(cloud.input_sources().await, vec!["digitalTv", "HDMI1", "HDMI2"]);
    }

    #[tokio::test]
    async fn test_input_sources_on_failure_is_empty() {
        let http = MockHttp::new();
        with_tv(&http).route(Method::Get, "/devices/tv-1/status", 200, json!({ "components": {} }));

        assert!(client(&http, true, Some("pat")).input_sources().await.is_empty());
        assert!(client(&http, false, None).input_sources().await.is_empty());
    }

    #[tokio::test]
    async fn test_set_input_source() {
        let http = MockHttp::new();
        with_tv(&http).route(Method::Post, "/devices/tv-1/commands", 200, json!({ "results": [] }));
        let cloud = client(&http, true, Some("pat"));

        cloud.set_input_source("HDMI2").await.expect("switch");

        let request = http
            .requests()
            .into_iter()
            .find(|r| r.method == Method::Post)
            .expect("command request");
        assert_eq!(request.url, "https://cloud.test/v1/devices/tv-1/commands");
        assert_eq!(
            request.body,
            Body::Json(json!({ "commands": [{
                "component": "main",
                "capability": "mediaInputSource",
                "command": "setInputSource",
                "arguments": ["HDMI2"]
            }]}))
        );
    }

    #[tokio::test]
    async fn test_failed_command_is_classified() {
        let http = MockHttp::new();
        with_tv(&http).route(Method::Post, "/commands", 422, json!({ "error": { "message": "bad" } }));

        let err = client(&http, true, Some("pat"))
            .execute(&[CapabilityCommand::new("switch", "off")])
            .await
            .unwrap_err();
        assert!(err.is_http_error());
    }
}
