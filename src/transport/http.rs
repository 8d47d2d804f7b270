//! One-shot HTTP transport.
//!
//! The application lifecycle endpoints, the legacy pairing endpoints and the
//! SmartThings API are all plain request/response HTTP. They go through the
//! [`HttpTransport`] trait so the protocol code never touches `reqwest`
//! directly; [`ReqwestTransport`] is the production implementation.
//!
//! A transport only fails for exchanges that produced no status at all
//! (refused, unreachable, timed out). Non-2xx statuses come back as an
//! [`HttpResponse`] and are checked by the caller with
//! [`check_status`](super::classify::check_status).

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};

use super::classify;

// ============================================================================
// Constants
// ============================================================================

/// Timeout applied when a request does not set one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Method
// ============================================================================

/// HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Returns the verb as sent on the wire.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// HttpRequest
// ============================================================================

/// Request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// `application/json` body.
    Json(Value),
    /// `text/plain` body.
    Text(String),
}

/// A single HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Bearer token for the `Authorization` header.
    pub bearer: Option<String>,
    /// Request body.
    pub body: Body,
    /// Deadline for the whole exchange.
    pub timeout: Duration,
}

impl HttpRequest {
    /// Creates a request with no body and the default timeout.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            body: Body::Empty,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Creates a `GET` request.
    #[inline]
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a `POST` request.
    #[inline]
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Creates a `DELETE` request.
    #[inline]
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Sets a JSON body.
    #[inline]
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    /// Sets a plain-text body.
    #[inline]
    #[must_use]
    pub fn with_text(mut self, body: impl Into<String>) -> Self {
        self.body = Body::Text(body.into());
        self
    }

    /// Sets the bearer token.
    #[inline]
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Sets the request deadline.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns `host:port` of the request URL, for error reporting.
    #[must_use]
    pub fn address(&self) -> String {
        address_of(&self.url)
    }
}

// ============================================================================
// HttpResponse
// ============================================================================

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Canonical reason phrase for the status.
    pub reason: String,
    /// Raw response body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            reason,
            body: body.into(),
        }
    }

    /// Returns `true` for any 2xx status.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Checks the status, see [`classify::check_status`].
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP error for non-2xx statuses.
    pub fn check(&self) -> Result<()> {
        classify::check_status(self.status, &self.reason)
    }

    /// Deserializes the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Parses the body as untyped JSON, `Value::Null` if it is not JSON.
    #[must_use]
    pub fn value(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

// ============================================================================
// HttpTransport
// ============================================================================

/// Executes one-shot HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs the exchange.
    ///
    /// # Errors
    ///
    /// Returns a classified connection error when no response was received.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

// ============================================================================
// ReqwestTransport
// ============================================================================

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[inline]
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let address = request.address();
        trace!(method = %request.method, url = %request.url, "HTTP request");

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout);

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Text(text) => builder
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .body(text),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| classify::classify_reqwest(&e, &address))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify::classify_reqwest(&e, &address))?;

        trace!(status = status.as_u16(), len = body.len(), "HTTP response");

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns `host:port` for a URL, or the URL itself if it does not parse.
#[must_use]
pub fn address_of(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => url.to_string(),
        },
        Err(_) => url.to_string(),
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
    fn test_request_builders() {
        let request = HttpRequest::post("http://10.0.0.5:8080/ws/apps/YouTube")
            .with_text("v=abc")
            .with_timeout(Duration::from_secs(3));

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body, Body::Text("v=abc".to_string()));
        assert_eq!(request.timeout, Duration::from_secs(3));
        assert!(request.bearer.is_none());
    }

    #[test]
    fn test_request_address() {
        let request = HttpRequest::get("http://10.0.0.5:8001/api/v2/");
        assert_eq!(request.address(), "10.0.0.5:8001");

        let request = HttpRequest::get("https://api.smartthings.com/v1/devices");
        assert_eq!(request.address(), "api.smartthings.com:443");
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
        assert_eq!(HttpResponse::new(404, "").reason, "Not Found");
    }

    #[test]
    fn test_response_json_helpers() {
        let response = HttpResponse::new(200, json!({ "visible": true }).to_string());
        assert_eq!(response.value()["visible"], json!(true));

        let garbage = HttpResponse::new(200, "<html>");
        assert_eq!(garbage.value(), Value::Null);
        assert!(garbage.json::<Value>().is_err());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
