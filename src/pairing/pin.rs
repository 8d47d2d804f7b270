//! Legacy PIN pairing.
//!
//! Older encrypted-protocol televisions pair through the DIAL port with a
//! PIN shown on screen. The flow is driven step by step by the pairing UI:
//!
//! | Step | Call | Request |
//! |------|------|---------|
//! | 1 | [`PinPairing::show_pin_page`] | `POST /ws/apps/CloudPINPage` |
//! | 2 | [`PinPairing::start_pairing`] | `GET /ws/pairing?step=0` |
//! | 3 | [`PinPairing::confirm_pin`] | `POST /ws/pairing?step=1` |
//! | 4 | [`PinPairing::acknowledge_request_id`] | `POST /ws/pairing?step=2` |
//! | 5 | [`PinPairing::hide_pin_page`] | `DELETE /ws/apps/CloudPINPage/run` |
//!
//! The SPC key exchange payloads are produced by a caller-supplied
//! [`PinHandshake`]. Step 5 must run whether or not pairing succeeded;
//! [`PinPairing::pair_with_pin`] does steps 3 to 5 in one call.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::identifiers::PairingRequestId;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

// ============================================================================
// Constants
// ============================================================================

/// Application identifier announced during pairing.
pub const DEFAULT_PAIRING_APP_ID: &str = "721b6fce-4ee6-48ba-8045-955a539edadb";

/// Device identifier announced during pairing.
pub const DEFAULT_PAIRING_DEVICE_ID: &str = "654321";

/// Authentication scheme of the exchange.
const AUTH_TYPE: &str = "SPC";

// ============================================================================
// PinHandshake
// ============================================================================

/// Produces the SPC key exchange messages.
pub trait PinHandshake: Send + Sync {
    /// Returns the `GeneratorServerHello` payload for `pin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be generated.
    fn server_hello(&self, pin: &str) -> Result<String>;

    /// Returns the `ServerAckMsg` payload answering `client_hello`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PairingFailed`] if `client_hello` does not verify,
    /// which usually means a wrong PIN.
    fn server_ack(&self, client_hello: &str) -> Result<String>;
}

// ============================================================================
// Types
// ============================================================================

/// State between PIN confirmation and acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingSession {
    /// Request identifier issued by the television.
    pub request_id: PairingRequestId,
    /// `GeneratorClientHello` payload to verify.
    pub client_hello: String,
}

/// Identity granted by a completed pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedIdentity {
    /// Session identifier.
    pub session_id: String,
    /// `ClientAckMsg` payload.
    pub client_ack: String,
}

// ============================================================================
// PinPairing
// ============================================================================

/// Legacy PIN pairing against one television.
pub struct PinPairing {
    http: Arc<dyn HttpTransport>,
    base_url: String,
    app_id: String,
    device_id: String,
    timeout: Duration,
}

impl std::fmt::Debug for PinPairing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinPairing")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

impl PinPairing {
    /// Creates a flow against the DIAL port of `config`'s television.
    #[must_use]
    pub fn new(http: Arc<dyn HttpTransport>, config: &Config) -> Self {
        Self {
            http,
            base_url: config.dial_url(""),
            app_id: DEFAULT_PAIRING_APP_ID.to_string(),
            device_id: DEFAULT_PAIRING_DEVICE_ID.to_string(),
            timeout: config.api_timeout,
        }
    }

    /// Overrides the announced application and device identifiers.
    #[must_use]
    pub fn with_identity(mut self, app_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self.device_id = device_id.into();
        self
    }

    /// Sets the per-request deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shows the PIN on the television.
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn show_pin_page(&self) -> Result<()> {
        let url = format!("{}/ws/apps/CloudPINPage", self.base_url);
        self.execute(HttpRequest::post(url)).await.map(drop)
    }

    /// Hides the PIN page.
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn hide_pin_page(&self) -> Result<()> {
        let url = format!("{}/ws/apps/CloudPINPage/run", self.base_url);
        self.execute(HttpRequest::delete(url)).await.map(drop)
    }

    /// Opens a pairing request.
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn start_pairing(&self) -> Result<()> {
        let url = self.step_url(0)?;
        self.execute(HttpRequest::get(url)).await.map(drop)
    }

    /// Submits the PIN and returns the session to acknowledge.
    ///
    /// # Errors
    ///
    /// - [`Error::PairingFailed`] if the reply lacks the request identifier
    ///   or client hello
    /// - the classified HTTP failure
    pub async fn confirm_pin(&self, pin: &str, handshake: &dyn PinHandshake) -> Result<PairingSession> {
        let body = json!({
            "auth_Data": {
                "auth_type": AUTH_TYPE,
                "GeneratorServerHello": handshake.server_hello(pin)?,
            }
        });
        let response = self
            .execute(HttpRequest::post(self.step_url(1)?).with_json(body))
            .await?;

        let auth_data = auth_data(&response)?;
        let request_id = string_field(&auth_data, "request_id")?;
        let client_hello = string_field(&auth_data, "GeneratorClientHello")?;

        debug!(%request_id, "PIN confirmed");
        Ok(PairingSession {
            request_id: PairingRequestId::new(request_id),
            client_hello,
        })
    }

    /// Exchanges the session for a durable identity.
    ///
    /// # Errors
    ///
    /// - [`Error::PairingFailed`] if the client hello does not verify or the
    ///   reply lacks the acknowledgement
    /// - the classified HTTP failure
    pub async fn acknowledge_request_id(
        &self,
        session: &PairingSession,
        handshake: &dyn PinHandshake,
    ) -> Result<PairedIdentity> {
        let body = json!({
            "auth_Data": {
                "auth_type": AUTH_TYPE,
                "request_id": session.request_id.as_str(),
                "ServerAckMsg": handshake.server_ack(&session.client_hello)?,
            }
        });
        let response = self
            .execute(HttpRequest::post(self.step_url(2)?).with_json(body))
            .await?;

        let auth_data = auth_data(&response)?;
        let identity = PairedIdentity {
            session_id: string_field(&auth_data, "session_id")?,
            client_ack: string_field(&auth_data, "ClientAckMsg")?,
        };

        info!(session_id = %identity.session_id, "PIN pairing completed");
        Ok(identity)
    }

    /// Confirms `pin`, acknowledges the session and hides the PIN page.
    ///
    /// The page is hidden even when pairing fails; a failure to hide it is
    /// only logged.
    ///
    /// # Errors
    ///
    /// Returns the first failure of confirmation or acknowledgement.
    pub async fn pair_with_pin(&self, pin: &str, handshake: &dyn PinHandshake) -> Result<PairedIdentity> {
        let result = async {
            let session = self.confirm_pin(pin, handshake).await?;
            self.acknowledge_request_id(&session, handshake).await
        }
        .await;

        if let Err(e) = self.hide_pin_page().await {
            warn!(error = %e, "Failed to hide PIN page");
        }

        result
    }

    /// Returns the pairing URL for `step`.
    fn step_url(&self, step: u8) -> Result<String> {
        let step = step.to_string();
        let mut params = vec![
            ("step", step.as_str()),
            ("app_id", self.app_id.as_str()),
            ("device_id", self.device_id.as_str()),
        ];
        if step == "0" {
            params.push(("type", "1"));
        }

        Url::parse_with_params(&format!("{}/ws/pairing", self.base_url), &params)
            .map(String::from)
            .map_err(|e| Error::config(format!("Invalid pairing URL: {e}")))
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self
            .http
            .execute(request.with_timeout(self.timeout))
            .await?;
        response.check()?;
        Ok(response)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns the `auth_data` object, which some firmwares send as a JSON string.
fn auth_data(response: &HttpResponse) -> Result<Value> {
    match response.value().get("auth_data") {
        Some(Value::String(text)) => serde_json::from_str(text)
            .map_err(|e| Error::pairing_failed(format!("unreadable auth_data: {e}"))),
        Some(value @ Value::Object(_)) => Ok(value.clone()),
        _ => Err(Error::pairing_failed("reply without auth_data")),
    }
}

/// Reads a string or numeric field.
fn string_field(value: &Value, key: &str) -> Result<String> {
    match value.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(Error::pairing_failed(format!("reply without {key}"))),
    }
}

// ============================================================================
// Tests
// ============================================================================
