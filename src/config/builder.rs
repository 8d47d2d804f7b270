//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Remote`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use samsung_remote::{MemorySettings, Remote, Settings};
//!
//! # fn example() -> samsung_remote::Result<()> {
//! let mut settings = Settings::new("192.168.1.20");
//! settings.token_auth_support = true;
//!
//! let remote = Remote::builder()
//!     .settings(Arc::new(MemorySettings::new(settings)))
//!     .name("Living Room Hub")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::remote::Remote;
use crate::transport::{HttpTransport, ReqwestTransport};

use super::options::Config;
use super::settings::{MemorySettings, Settings, SettingsStore};

// ============================================================================
// RemoteBuilder
// ============================================================================

/// Builder for configuring a [`Remote`] instance.
///
/// Use [`Remote::builder()`] to create a new builder. Either an address or
/// a settings store carrying one is required.
#[derive(Default, Clone)]
pub struct RemoteBuilder {
    /// Television address, overrides the stored one.
    address: Option<String>,
    /// Persisted settings.
    settings: Option<Arc<dyn SettingsStore>>,
    /// HTTP transport.
    http: Option<Arc<dyn HttpTransport>>,
    /// Client name shown on the television.
    name: Option<String>,
    /// Own address announced in art-mode requests.
    client_ip: Option<String>,
    /// Cloud registry base URL.
    cloud_base_url: Option<String>,
    /// Plain, secure and DIAL ports.
    ports: Option<(u16, u16, u16)>,
    /// Idle close deadline.
    idle_timeout: Option<Duration>,
    /// Connect and acknowledgement deadline.
    connect_timeout: Option<Duration>,
}

impl std::fmt::Debug for RemoteBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBuilder")
            .field("address", &self.address)
            .field("settings", &self.settings.is_some())
            .field("http", &self.http.is_some())
            .field("name", &self.name)
            .field("client_ip", &self.client_ip)
            .field("cloud_base_url", &self.cloud_base_url)
            .field("ports", &self.ports)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RemoteBuilder Implementation
// ============================================================================

impl RemoteBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the television address.
    #[inline]
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Sets the settings store.
    ///
    /// Without one, an in-memory store is created from the address.
    #[inline]
    #[must_use]
    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the HTTP transport used by the lifecycle, pairing and cloud paths.
    #[inline]
    #[must_use]
    pub fn http(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the client name shown in the pairing prompt.
    #[inline]
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the own address announced in art-mode requests.
    #[inline]
    #[must_use]
    pub fn client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = Some(client_ip.into());
        self
    }

    /// Sets the cloud registry base URL.
    #[inline]
    #[must_use]
    pub fn cloud_base_url(mut self, url: impl Into<String>) -> Self {
        self.cloud_base_url = Some(url.into());
        self
    }

    /// Sets the plain, secure and DIAL ports.
    #[inline]
    #[must_use]
    pub fn ports(mut self, port: u16, secure_port: u16, dial_port: u16) -> Self {
        self.ports = Some((port, secure_port, dial_port));
        self
    }

    /// Sets how long an idle session stays open.
    #[inline]
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Sets the connect and acknowledgement deadline.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Builds the client with validation.
    ///
    /// No connection is made; the session opens on the first command.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no address is available or an override is invalid
    /// - any error of [`SettingsStore::load`]
    /// - any error of [`ReqwestTransport::new`] when no transport is given
    pub fn build(self) -> Result<Remote> {
        let settings = self.resolve_settings()?;
        let config = self.resolve_config(settings.as_ref())?;

        let http = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(Remote::from_parts(config, settings, http))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl RemoteBuilder {
    /// Returns the given store or an in-memory one seeded from the address.
    fn resolve_settings(&self) -> Result<Arc<dyn SettingsStore>> {
        if let Some(settings) = &self.settings {
            return Ok(Arc::clone(settings));
        }

        let address = self.address.clone().ok_or_else(|| {
            Error::config(
                "Television address is required. Use .address() or .settings() to set it.\n\
                 Example: Remote::builder().address(\"192.168.1.20\")",
            )
        })?;

        Ok(Arc::new(MemorySettings::new(Settings::new(address))))
    }

    /// Builds the working configuration and applies the overrides.
    fn resolve_config(&self, settings: &dyn SettingsStore) -> Result<Config> {
        let mut config = Config::from_settings(&settings.load()?);

        if let Some(address) = &self.address {
            config.address.clone_from(address);
        }
        if let Some(name) = &self.name {
            config.name.clone_from(name);
        }
        if let Some(client_ip) = &self.client_ip {
            config.client_ip = Some(client_ip.clone());
        }
        if let Some(url) = &self.cloud_base_url {
            config = config.with_cloud_base_url(url.clone());
        }
        if let Some((port, secure_port, dial_port)) = self.ports {
            config = config.with_ports(port, secure_port, dial_port);
        }
        if let Some(timeout) = self.idle_timeout {
            config = config.with_idle_timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            config = config.with_connect_timeout(timeout);
        }

        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ErrorKind;
    use crate::transport::testing::MockHttp;

    fn mock() -> Arc<dyn HttpTransport> {
        MockHttp::new()
    }

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = RemoteBuilder::new();
        assert!(builder.address.is_none());
        assert!(builder.settings.is_none());
        assert!(builder.http.is_none());
    }

    #[test]
    fn test_build_without_address_fails() {
        let err = RemoteBuilder::new().http(mock()).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_build_with_blank_address_fails() {
        let err = RemoteBuilder::new()
            .address("  ")
            .http(mock())
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_build_from_settings_store() {
        let mut settings = Settings::new("192.168.1.20");
        settings.token_auth_support = true;
        settings.token = Some("stored".into());

        let remote = RemoteBuilder::new()
            .settings(Arc::new(MemorySettings::new(settings)))
            .http(mock())
            .build()
            .expect("remote");

        let config = remote.config();
        let config = config.read();
        assert_eq!(config.address, "192.168.1.20");
        assert_eq!(config.token.as_deref(), Some("stored"));
        assert!(config.token_present());
    }

    #[test]
    fn test_overrides_apply() {
        let remote = RemoteBuilder::new()
            .address("10.0.0.5")
            .name("Hub")
            .client_ip("10.0.0.2")
            .ports(18001, 18002, 18080)
            .cloud_base_url("https://cloud.test/v1/")
            .idle_timeout(Duration::from_secs(30))
            .http(mock())
            .build()
            .expect("remote");

        let config = remote.config();
        let config = config.read();
        assert_eq!(config.name, "Hub");
        assert_eq!(config.client_ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(config.dial_port, 18080);
        assert_eq!(config.cloud_base_url, "https://cloud.test/v1");
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = RemoteBuilder::new()
            .address("10.0.0.5")
            .connect_timeout(Duration::ZERO)
            .http(mock())
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
