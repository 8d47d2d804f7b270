//! The remote-control client.
//!
//! [`Remote`] is the public entry point. It composes the connection
//! manager, the command queue, the HTTP transport and the cloud client,
//! and exposes every television operation as an async method.
//!
//! # Example
//!
//! ```ignore
//! use samsung_remote::{Key, Remote};
//!
//! let remote = Remote::builder().address("192.168.1.20").build()?;
//!
//! remote.send_key(Key::VolumeUp).await?;
//! remote.send_text("breaking bad").await?;
//! remote.launch_app(&"3201907018807".into()).await?;
//! remote.close_current_app().await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use tokio::time::sleep;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cloud::{CloudClient, Health};
use crate::config::{Config, RemoteBuilder, SettingsStore, SharedConfig};
use crate::error::{Error, Result};
use crate::identifiers::AppId;
use crate::pairing::{self, PinPairing};
use crate::protocol::{Command, Key, KeyAction, LaunchType, MouseButton};
use crate::transport::connection::adopt_token;
use crate::transport::{
    CommandQueue, ConnectionManager, ConnectionState, HttpRequest, HttpTransport,
};

use super::catalog::AppCatalog;
use super::info::DeviceInfo;

// ============================================================================
// Constants
// ============================================================================

/// Default duration of [`Remote::hold_key`].
pub const DEFAULT_HOLD: Duration = Duration::from_millis(1000);

/// Model name stored when the lookup fails.
pub const UNKNOWN_MODEL: &str = "unknown";

// ============================================================================
// Remote
// ============================================================================

/// Client for one television.
///
/// Cheap to clone; clones share the session, the catalog and the tracked
/// foreground application.
#[derive(Clone)]
pub struct Remote {
    pub(super) inner: Arc<RemoteInner>,
}

/// Shared state behind [`Remote`].
pub(super) struct RemoteInner {
    pub(super) config: SharedConfig,
    pub(super) settings: Arc<dyn SettingsStore>,
    pub(super) http: Arc<dyn HttpTransport>,
    pub(super) connection: Arc<ConnectionManager>,
    pub(super) queue: CommandQueue,
    pub(super) catalog: Arc<RwLock<AppCatalog>>,
    /// Last launched application, written only by the lifecycle calls.
    pub(super) current_app: Mutex<Option<AppId>>,
    pub(super) cloud: CloudClient,
}

impl std::fmt::Debug for Remote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remote")
            .field("address", &self.inner.config.read().address)
            .field("state", &self.inner.connection.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Construction
// ============================================================================

impl Remote {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> RemoteBuilder {
        RemoteBuilder::new()
    }

    /// Assembles a client from validated parts.
    pub(crate) fn from_parts(
        config: Config,
        settings: Arc<dyn SettingsStore>,
        http: Arc<dyn HttpTransport>,
    ) -> Self {
        let cloud = CloudClient::new(
            Arc::clone(&http),
            Arc::clone(&settings),
            config.cloud_base_url.clone(),
        );
        let config = config.shared();
        let catalog = Arc::new(RwLock::new(AppCatalog::new()));
        let connection = Arc::new(ConnectionManager::new(
            Arc::clone(&config),
            Arc::clone(&settings),
            Arc::clone(&catalog),
        ));
        let queue = CommandQueue::new(Arc::clone(&connection));

        Self {
            inner: Arc::new(RemoteInner {
                config,
                settings,
                http,
                connection,
                queue,
                catalog,
                current_app: Mutex::new(None),
                cloud,
            }),
        }
    }

    /// Returns the shared configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> SharedConfig {
        Arc::clone(&self.inner.config)
    }

    /// Returns the cloud client.
    #[inline]
    #[must_use]
    pub fn cloud(&self) -> &CloudClient {
        &self.inner.cloud
    }
}

// ============================================================================
// Session
// ============================================================================

impl Remote {
    /// Returns the WebSocket session state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// Closes the WebSocket session. The next command reconnects.
    pub fn disconnect(&self) {
        self.inner.connection.disconnect();
    }

    /// Submits a raw command.
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn send(&self, command: &Command) -> Result<()> {
        self.inner.queue.submit(command).await
    }
}

// ============================================================================
// Keys
// ============================================================================

impl Remote {
    /// Clicks `key`.
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn send_key(&self, key: impl Into<Key>) -> Result<()> {
        self.send_key_action(&key.into(), KeyAction::Click).await
    }

    /// Sends one key event.
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn send_key_action(&self, key: &Key, action: KeyAction) -> Result<()> {
        self.send(&Command::key(key, action)).await
    }

    /// Presses `key`, waits `duration`, then releases it.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the key is not released if the press failed.
    pub async fn hold_key(&self, key: impl Into<Key>, duration: Duration) -> Result<()> {
        let key = key.into();
        self.send_key_action(&key, KeyAction::Press).await?;
        sleep(duration).await;
        self.send_key_action(&key, KeyAction::Release).await
    }

    /// Clicks `keys` in order, pausing `delay_keys` between them.
    ///
    /// # Errors
    ///
    /// Stops at the first failure.
    pub async fn send_keys(&self, keys: impl IntoIterator<Item = Key>) -> Result<()> {
        let delay = self.inner.config.read().delay_keys;
        self.send_spaced(keys, delay).await
    }

    /// Tunes to `channel` by typing its digits followed by `KEY_ENTER`.
    ///
    /// # Errors
    ///
    /// Stops at the first failure.
    pub async fn set_channel(&self, channel: u32) -> Result<()> {
        let delay = self.inner.config.read().delay_channel_keys;
        let digits = channel.to_string();
        let keys = digits
            .bytes()
            .filter_map(|b| Key::digit(b - b'0'))
            .chain(std::iter::once(Key::Enter));
        self.send_spaced(keys, delay).await
    }

    /// Switches the television off.
    ///
    /// Frame televisions only enter art mode on a click, so `KEY_POWER` is
    /// held for [`Config::power_off_hold`] on them.
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn turn_off(&self) -> Result<()> {
        let (frame_tv, hold) = {
            let config = self.inner.config.read();
            (config.frame_tv, config.power_off_hold)
        };
        if frame_tv {
            self.hold_key(Key::Power, hold).await
        } else {
            self.send_key(Key::Power).await
        }
    }

    async fn send_spaced(&self, keys: impl IntoIterator<Item = Key>, delay: Duration) -> Result<()> {
        for (i, key) in keys.into_iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                sleep(delay).await;
            }
            self.send_key_action(&key, KeyAction::Click).await?;
        }
        Ok(())
    }
}

// ============================================================================
// Pointer & Text
// ============================================================================

impl Remote {
    /// Moves the pointer to (`x`, `y`).
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn mouse_move(&self, x: i32, y: i32) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        self.send(&Command::mouse_move(x, y, now)).await
    }

    /// Clicks a pointer button.
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn mouse_click(&self, button: MouseButton) -> Result<()> {
        self.send(&Command::mouse_click(button)).await
    }

    /// Types `text` into the focused field and ends input.
    ///
    /// Success means both frames were written; the television does not
    /// confirm it accepted the text.
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn send_text(&self, text: &str) -> Result<()> {
        self.send(&Command::input_string(text)).await?;
        self.send_input_end().await
    }

    /// Ends text input.
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn send_input_end(&self) -> Result<()> {
        self.send(&Command::input_end()).await
    }
}

// ============================================================================
// Apps over the channel
// ============================================================================

impl Remote {
    /// Asks the television for its installed apps.
    ///
    /// The list arrives later as an event and replaces the catalog; see
    /// [`Remote::apps`].
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn request_app_list(&self) -> Result<()> {
        self.send(&Command::installed_apps()).await
    }

    /// Requests the app list if the catalog is older than `max_age`.
    ///
    /// Returns `true` if a request was sent.
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn refresh_apps_if_stale(&self, max_age: Duration) -> Result<bool> {
        if !self.inner.catalog.read().is_stale(max_age) {
            return Ok(false);
        }
        debug!("App catalog stale, requesting app list");
        self.request_app_list().await?;
        Ok(true)
    }

    /// Returns the catalog sorted by name.
    #[must_use]
    pub fn apps(&self) -> Vec<(AppId, String)> {
        self.inner.catalog.read().entries()
    }

    /// Returns catalog entries whose name contains `query`.
    #[must_use]
    pub fn search_apps(&self, query: &str) -> Vec<(AppId, String)> {
        self.inner.catalog.read().search(query)
    }

    /// Returns the display name of `app_id`.
    #[must_use]
    pub fn app_name(&self, app_id: &AppId) -> Option<String> {
        self.inner.catalog.read().get(app_id).map(str::to_string)
    }

    /// Returns when the catalog was last replaced.
    #[must_use]
    pub fn catalog_refreshed_at(&self) -> Option<std::time::Instant> {
        self.inner.catalog.read().refreshed_at()
    }

    /// Opens `url` in the built-in browser.
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn launch_browser(&self, url: &str) -> Result<()> {
        self.send(&Command::launch_browser(url)).await
    }

    /// Launches an application through the channel.
    ///
    /// Unlike [`Remote::launch_app`] this does not track the application.
    ///
    /// # Errors
    ///
    /// Returns the classified connect or send failure.
    pub async fn launch_app_via_socket(
        &self,
        app_id: &AppId,
        launch: LaunchType,
        meta_tag: Option<&str>,
    ) -> Result<()> {
        self.send(&Command::launch_app(app_id, launch, meta_tag))
            .await
    }

    /// Turns art mode on or off.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityUnsupported`] on non-frame televisions, before any I/O
    /// - the classified connect or send failure
    pub async fn art_mode(&self, on: bool) -> Result<()> {
        let command = {
            let config = self.inner.config.read();
            if !config.frame_tv {
                return Err(Error::capability_unsupported("art mode"));
            }
            Command::art_mode(
                on,
                config.client_ip.as_deref(),
                &config.name,
                &Uuid::new_v4().to_string(),
            )
        };
        self.send(&command).await
    }
}

// ============================================================================
// Device Info & Pairing
// ============================================================================

impl Remote {
    /// Fetches device information from `address`, or the configured address.
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure, or [`Error::Json`] for an
    /// unexpected body.
    pub async fn get_info(&self, address: Option<&str>) -> Result<DeviceInfo> {
        let (url, deadline) = {
            let config = self.inner.config.read();
            (config.api_url(address), config.api_timeout)
        };
        let response = self
            .inner
            .http
            .execute(HttpRequest::get(url).with_timeout(deadline))
            .await?;
        response.check()?;
        response.json()
    }

    /// Returns `true` if the REST root answers.
    pub async fn api_active(&self) -> bool {
        self.get_info(None).await.is_ok()
    }

    /// Returns the model name, fetching and persisting it if unknown.
    ///
    /// A failed lookup stores [`UNKNOWN_MODEL`] so it is not retried.
    ///
    /// # Errors
    ///
    /// Returns an error only if the settings store fails.
    pub async fn ensure_model_name(&self) -> Result<String> {
        if let Some(model) = self
            .inner
            .settings
            .load()?
            .model_name
            .filter(|m| !m.is_empty())
        {
            return Ok(model);
        }

        let model = match self.get_info(None).await {
            Ok(info) => info
                .device
                .model_name
                .unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
            Err(e) => {
                info!(error = %e, "Fetching model name failed");
                UNKNOWN_MODEL.to_string()
            }
        };

        self.inner.settings.save_model_name(&model)?;
        self.inner.config.write().model_name = Some(model.clone());
        info!(%model, "Model name set");
        Ok(model)
    }

    /// Requests a token over a dedicated secure socket.
    ///
    /// The television shows an approval prompt; the returned token is also
    /// stored in the configuration and the settings store. Callers retry
    /// with [`RetryPolicy`](crate::RetryPolicy) while the prompt is pending.
    ///
    /// # Errors
    ///
    /// - [`Error::PairingFailed`] if the television answered without a token
    /// - the classified connect failure
    pub async fn pair(&self) -> Result<String> {
        let config = self.inner.config.read().clone();
        let token = pairing::request_token(&config).await?;
        adopt_token(&self.inner.config, self.inner.settings.as_ref(), &token);
        Ok(token)
    }

    /// Returns the legacy PIN pairing flow for this television.
    #[must_use]
    pub fn pin_pairing(&self) -> PinPairing {
        PinPairing::new(Arc::clone(&self.inner.http), &self.inner.config.read())
    }

    /// Returns whether the television is on.
    ///
    /// Asks the cloud when it is enabled and falls back to
    /// [`Remote::api_active`] when the cloud cannot tell.
    pub async fn power_state(&self) -> bool {
        if self.inner.cloud.is_enabled() {
            match self.inner.cloud.health().await {
                Health::Online => return true,
                Health::Offline => return false,
                Health::Unknown => {}
            }
        }
        self.api_active().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(super) mod tests {
    use super::*;

    use serde_json::json;

    use crate::config::{MemorySettings, Settings};
    use crate::error::ErrorKind;
    use crate::transport::Method;
    use crate::transport::testing::{FakeTv, MockHttp};

    /// Builds a client over `config` with scripted HTTP.
    pub(in crate::remote) fn remote_with(
        config: Config,
        http: &Arc<MockHttp>,
    ) -> (Remote, Arc<MemorySettings>) {
        let settings = Arc::new(MemorySettings::new(Settings::new(config.address.clone())));
        let remote = Remote::from_parts(
            config,
            Arc::clone(&settings) as Arc<dyn SettingsStore>,
            Arc::clone(http) as Arc<dyn HttpTransport>,
        );
        (remote, settings)
    }

    #[tokio::test]
    async fn test_send_key() {
        let mut tv = FakeTv::acknowledging(None).await;
        let (remote, _) = remote_with(tv.config(), &MockHttp::new());

        remote.send_key(Key::VolumeUp).await.expect("send");

        let frame = tv.next_text().await;
        assert_eq!(frame["params"]["Cmd"], "Click");
        assert_eq!(frame["params"]["DataOfCmd"], "KEY_VOLUP");
        assert_eq!(remote.connection_state(), ConnectionState::Open);
    }

    #[tokio::test]
    async fn test_hold_key_presses_then_releases() {
        let mut tv = FakeTv::acknowledging(None).await;
        let (remote, _) = remote_with(tv.config(), &MockHttp::new());

        remote
            .hold_key("KEY_AMBIENT", Duration::from_millis(20))
            .await
            .expect("hold");

        assert_eq!(tv.next_text().await["params"]["Cmd"], "Press");
        let release = tv.next_text().await;
        assert_eq!(release["params"]["Cmd"], "Release");
        assert_eq!(release["params"]["DataOfCmd"], "KEY_AMBIENT");
    }

    #[tokio::test]
    async fn test_turn_off_clicks_power() {
        let mut tv = FakeTv::acknowledging(None).await;
        let (remote, _) = remote_with(tv.config(), &MockHttp::new());

        remote.turn_off().await.expect("turn off");

        let frame = tv.next_text().await;
        assert_eq!(frame["params"]["Cmd"], "Click");
        assert_eq!(frame["params"]["DataOfCmd"], "KEY_POWER");
    }

    #[tokio::test]
    async fn test_turn_off_holds_power_on_frame_tv() {
        let mut tv = FakeTv::acknowledging(None).await;
        let mut config = tv.config();
        config.frame_tv = true;
        config.power_off_hold = Duration::from_millis(30);
        let (remote, _) = remote_with(config, &MockHttp::new());

        remote.turn_off().await.expect("turn off");

        let press = tv.next_text().await;
        assert_eq!(press["params"]["Cmd"], "Press");
        assert_eq!(press["params"]["DataOfCmd"], "KEY_POWER");
        let release = tv.next_text().await;
        assert_eq!(release["params"]["Cmd"], "Release");
        assert_eq!(release["params"]["DataOfCmd"], "KEY_POWER");
        assert!(tv.nothing_received());
    }

    #[test]
    fn test_power_off_hold_defaults_to_five_seconds() {
        assert_eq!(Config::new("10.0.0.5").power_off_hold, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_set_channel_types_digits_then_enter() {
        let mut tv = FakeTv::acknowledging(None).await;
        let mut config = tv.config();
        config.delay_channel_keys = Duration::from_millis(5);
        let (remote, _) = remote_with(config, &MockHttp::new());

        remote.set_channel(105).await.expect("channel");

        for expected in ["KEY_1", "KEY_0", "KEY_5", "KEY_ENTER"] {
            assert_eq!(tv.next_text().await["params"]["DataOfCmd"], expected);
        }
    }

    #[tokio::test]
    async fn test_send_text_ends_input() {
        let mut tv = FakeTv::acknowledging(None).await;
        let (remote, _) = remote_with(tv.config(), &MockHttp::new());

        remote.send_text("abc").await.expect("text");

        let first = tv.next_text().await;
        assert_eq!(first["params"]["TypeOfRemote"], "SendInputString");
        assert_eq!(first["params"]["Cmd"], "YWJj");
        assert_eq!(
            tv.next_text().await["params"]["TypeOfRemote"],
            "SendInputEnd"
        );
    }

    #[tokio::test]
    async fn test_art_mode_unsupported_touches_nothing() {
        let tv = FakeTv::acknowledging(None).await;
        let http = MockHttp::new();
        let (remote, _) = remote_with(tv.config(), &http);

        let err = remote.art_mode(true).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CapabilityUnsupported);
        assert_eq!(tv.accepted(), 0);
        assert!(http.requests().is_empty());
        assert_eq!(remote.connection_state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_art_mode_on_frame_tv() {
        let mut tv = FakeTv::acknowledging(None).await;
        let mut config = tv.config().with_client_ip("10.0.0.2");
        config.frame_tv = true;
        let (remote, _) = remote_with(config, &MockHttp::new());

        remote.art_mode(false).await.expect("art mode");

        let frame = tv.next_text().await;
        assert_eq!(frame["method"], "ms.channel.emit");
        assert_eq!(frame["params"]["event"], "art_app_request");
        assert_eq!(frame["params"]["clientIp"], "10.0.0.2");
        let data: serde_json::Value =
            serde_json::from_str(frame["params"]["data"].as_str().expect("string")).expect("json");
        assert_eq!(data["value"], "off");
    }

    #[tokio::test]
    async fn test_app_list_round_trip() {
        let mut tv = FakeTv::start(vec![
            FakeTv::ack(None),
            FakeTv::event(
                "ed.installedApp.get",
                json!({ "data": [
                    { "appId": "a2", "name": "YouTube" },
                    { "appId": "a1", "name": "Netflix" }
                ]}),
            ),
        ])
        .await;
        let (remote, _) = remote_with(tv.config(), &MockHttp::new());

        assert!(remote.refresh_apps_if_stale(Duration::from_secs(300)).await.expect("refresh"));
        assert_eq!(
            tv.next_text().await["params"]["event"],
            "ed.installedApp.get"
        );

        for _ in 0..50 {
            if remote.catalog_refreshed_at().is_some() {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(
            remote.apps(),
            vec![
                (AppId::new("a1"), "Netflix".to_string()),
                (AppId::new("a2"), "YouTube".to_string()),
            ]
        );
        assert_eq!(remote.search_apps("tube").len(), 1);
        assert_eq!(remote.app_name(&AppId::new("a1")).as_deref(), Some("Netflix"));
        assert!(!remote.refresh_apps_if_stale(Duration::from_secs(300)).await.expect("fresh"));
    }

    #[tokio::test]
    async fn test_get_info_and_model_name() {
        let http = MockHttp::new();
        http.route(
            Method::Get,
            "/api/v2/",
            200,
            json!({ "name": "TV", "device": { "modelName": "QE55Q80TAT" } }),
        );
        let (remote, settings) = remote_with(Config::new("10.0.0.5"), &http);

        let info = remote.get_info(None).await.expect("info");
        assert_eq!(info.device.model_name.as_deref(), Some("QE55Q80TAT"));
        assert!(remote.api_active().await);

        assert_eq!(remote.ensure_model_name().await.expect("model"), "QE55Q80TAT");
        assert_eq!(settings.snapshot().model_name.as_deref(), Some("QE55Q80TAT"));

        // Cached in settings, no further request
        let before = http.requests().len();
        remote.ensure_model_name().await.expect("model");
        assert_eq!(http.requests().len(), before);
    }

    #[tokio::test]
    async fn test_model_name_unknown_on_failure() {
        let http = MockHttp::new();
        let (remote, settings) = remote_with(Config::new("10.0.0.5"), &http);

        assert_eq!(remote.ensure_model_name().await.expect("model"), UNKNOWN_MODEL);
        assert_eq!(settings.snapshot().model_name.as_deref(), Some(UNKNOWN_MODEL));
        assert!(!remote.api_active().await);
    }

    #[tokio::test]
    async fn test_get_info_other_address() {
        let http = MockHttp::new();
        http.route(Method::Get, "10.0.0.9:8001/api/v2/", 200, json!({}));
        let (remote, _) = remote_with(Config::new("10.0.0.5"), &http);

        assert!(remote.get_info(Some("10.0.0.9")).await.is_ok());
        assert!(remote.get_info(None).await.is_err());
    }

    #[tokio::test]
    async fn test_power_state_without_cloud_uses_api() {
        let http = MockHttp::new();
        http.route(Method::Get, "/api/v2/", 200, json!({}));
        let (remote, _) = remote_with(Config::new("10.0.0.5"), &http);

        assert!(remote.power_state().await);
        assert_eq!(http.count(Method::Get, "smartthings"), 0);
    }

    #[tokio::test]
    async fn test_power_state_prefers_cloud() {
        let http = MockHttp::new();
        http.route(Method::Get, "/api/v2/", 200, json!({}))
            .route(
                Method::Get,
                "/v1/devices",
                200,
                json!({ "items": [{
                    "deviceId": "tv-1",
                    "components": [{ "id": "main", "capabilities": [{ "id": "tvChannel" }] }]
                }]}),
            )
            .route(Method::Get, "/devices/tv-1/health", 200, json!({ "state": "OFFLINE" }));
        let config = Config::new("10.0.0.5").with_cloud_base_url("https://cloud.test/v1");
        let (remote, settings) = remote_with(config, &http);
        settings.update(|s| {
            s.smartthings = true;
            s.smartthings_token = Some("pat".into());
        });

        assert!(!remote.power_state().await);
        assert_eq!(http.count(Method::Get, "/api/v2/"), 0);
    }
}
