//! Error types for the Samsung remote client.
//!
//! This module defines the closed error taxonomy shared by the WebSocket
//! session, the HTTP application channel, legacy pairing and the cloud path.
//! Raw transport failures are mapped onto it by
//! [`transport::classify`](crate::transport::classify).
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use samsung_remote::{Error, ErrorKind, Result};
//!
//! async fn example(remote: &Remote) -> Result<()> {
//!     match remote.close_current_app().await {
//!         Err(e) if e.kind() == ErrorKind::NoAppRunning => Ok(()),
//!         other => other,
//!     }
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::ConnectionRefused`], [`Error::HostUnreachable`], [`Error::NetworkUnreachable`], [`Error::TimedOut`], [`Error::ConnectionReset`] |
//! | Authentication | [`Error::AuthTokenMissing`], [`Error::AuthTokenInvalid`], [`Error::PairingFailed`] |
//! | Socket | [`Error::SocketNotReady`], [`Error::SendFailed`] |
//! | HTTP | [`Error::HttpForbidden`], [`Error::HttpNotFound`], [`Error::HttpPayloadTooLarge`], [`Error::HttpNotImplemented`], [`Error::HttpServiceUnavailable`], [`Error::HttpOther`] |
//! | Applications | [`Error::NoAppRunning`], [`Error::AppNotRunning`], [`Error::CapabilityUnsupported`] |
//! | Cloud | [`Error::CloudNotEnabled`], [`Error::CloudNoToken`], [`Error::CloudTokenInvalid`], [`Error::CloudNoTvFound`] |
//! | Other | [`Error::Protocol`], [`Error::Unknown`], [`Error::Json`], [`Error::Io`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::AppId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging. Use
/// [`Error::kind`] to match on the taxonomy entry without destructuring.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the client configuration is invalid or incomplete.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The television refused the connection.
    #[error("Connection refused by {address}")]
    ConnectionRefused {
        /// `host:port` that refused the connection.
        address: String,
    },

    /// No route to the television.
    #[error("Host unreachable: {address}")]
    HostUnreachable {
        /// `host:port` that could not be reached.
        address: String,
    },

    /// The local network is unreachable.
    #[error("Network unreachable: {address}")]
    NetworkUnreachable {
        /// `host:port` that was being contacted.
        address: String,
    },

    /// Connect, handshake or HTTP request timed out.
    #[error("Timed out: {operation}")]
    TimedOut {
        /// Description of the operation that timed out.
        operation: String,
    },

    /// The peer reset the connection.
    #[error("Connection reset by peer")]
    ConnectionReset,

    // ========================================================================
    // Authentication Errors
    // ========================================================================
    /// The television closed the handshake and no token is configured.
    ///
    /// Usually means access still has to be approved on the television.
    #[error("Connection closed by the television: no authentication token configured")]
    AuthTokenMissing,

    /// The television closed the handshake although a token was sent.
    #[error("Connection closed by the television: authentication token rejected")]
    AuthTokenInvalid,

    /// Pairing did not yield a token or identity.
    #[error("Pairing failed: {message}")]
    PairingFailed {
        /// Description of the pairing failure.
        message: String,
    },

    // ========================================================================
    // Socket Errors
    // ========================================================================
    /// A send was attempted on a socket that is not open.
    #[error("Socket is not open")]
    SocketNotReady,

    /// Writing a command to the socket failed.
    #[error("Send failed: {message}")]
    SendFailed {
        /// Description of the write failure.
        message: String,
    },

    // ========================================================================
    // HTTP Errors
    // ========================================================================
    /// HTTP 403: the television denied the request.
    #[error("Request forbidden (403)")]
    HttpForbidden,

    /// HTTP 404: unknown application or path.
    #[error("Not found (404)")]
    HttpNotFound,

    /// HTTP 413: request body too large.
    #[error("Payload too large (413)")]
    HttpPayloadTooLarge,

    /// HTTP 501: operation not implemented by this firmware.
    #[error("Not implemented (501)")]
    HttpNotImplemented,

    /// HTTP 503: service temporarily unavailable.
    #[error("Service unavailable (503)")]
    HttpServiceUnavailable,

    /// Any other non-success HTTP status.
    #[error("Request failed: {status} {message}")]
    HttpOther {
        /// HTTP status code.
        status: u16,
        /// Status reason or response detail.
        message: String,
    },

    // ========================================================================
    // Application Errors
    // ========================================================================
    /// Close requested while no foreground application is tracked.
    #[error("No application is running")]
    NoAppRunning,

    /// The tracked application is not running on the television.
    #[error("Application {app_id} is not running")]
    AppNotRunning {
        /// The tracked application.
        app_id: AppId,
    },

    /// The device does not advertise a required capability.
    #[error("Capability not supported by this device: {capability}")]
    CapabilityUnsupported {
        /// Name of the missing capability.
        capability: String,
    },

    // ========================================================================
    // Cloud Errors
    // ========================================================================
    /// Cloud control is disabled in the settings.
    #[error("SmartThings is not enabled")]
    CloudNotEnabled,

    /// Cloud control is enabled but no access token is configured.
    #[error("SmartThings access token is missing")]
    CloudNoToken,

    /// The cloud API rejected the access token.
    #[error("SmartThings access token was rejected")]
    CloudTokenInvalid,

    /// No registered device exposes a TV-channel capability.
    #[error("No television found in SmartThings")]
    CloudNoTvFound,

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// Malformed reply where a reply was required.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Transport failure that matches no other classification.
    #[error("Unknown error: {message}")]
    Unknown {
        /// Original failure text.
        message: String,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error, e.g. from a file-backed settings store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// ErrorKind
// ============================================================================

/// Fieldless discriminant of [`enum@Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    ConnectionRefused,
    HostUnreachable,
    NetworkUnreachable,
    TimedOut,
    ConnectionReset,
    AuthTokenMissing,
    AuthTokenInvalid,
    PairingFailed,
    SocketNotReady,
    SendFailed,
    HttpForbidden,
    HttpNotFound,
    HttpPayloadTooLarge,
    HttpNotImplemented,
    HttpServiceUnavailable,
    HttpOther,
    NoAppRunning,
    AppNotRunning,
    CapabilityUnsupported,
    CloudNotEnabled,
    CloudNoToken,
    CloudTokenInvalid,
    CloudNoTvFound,
    Protocol,
    Unknown,
    Json,
    Io,
}

impl Error {
    /// Returns the taxonomy entry of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::ConnectionRefused { .. } => ErrorKind::ConnectionRefused,
            Self::HostUnreachable { .. } => ErrorKind::HostUnreachable,
            Self::NetworkUnreachable { .. } => ErrorKind::NetworkUnreachable,
            Self::TimedOut { .. } => ErrorKind::TimedOut,
            Self::ConnectionReset => ErrorKind::ConnectionReset,
            Self::AuthTokenMissing => ErrorKind::AuthTokenMissing,
            Self::AuthTokenInvalid => ErrorKind::AuthTokenInvalid,
            Self::PairingFailed { .. } => ErrorKind::PairingFailed,
            Self::SocketNotReady => ErrorKind::SocketNotReady,
            Self::SendFailed { .. } => ErrorKind::SendFailed,
            Self::HttpForbidden => ErrorKind::HttpForbidden,
            Self::HttpNotFound => ErrorKind::HttpNotFound,
            Self::HttpPayloadTooLarge => ErrorKind::HttpPayloadTooLarge,
            Self::HttpNotImplemented => ErrorKind::HttpNotImplemented,
            Self::HttpServiceUnavailable => ErrorKind::HttpServiceUnavailable,
            Self::HttpOther { .. } => ErrorKind::HttpOther,
            Self::NoAppRunning => ErrorKind::NoAppRunning,
            Self::AppNotRunning { .. } => ErrorKind::AppNotRunning,
            Self::CapabilityUnsupported { .. } => ErrorKind::CapabilityUnsupported,
            Self::CloudNotEnabled => ErrorKind::CloudNotEnabled,
            Self::CloudNoToken => ErrorKind::CloudNoToken,
            Self::CloudTokenInvalid => ErrorKind::CloudTokenInvalid,
            Self::CloudNoTvFound => ErrorKind::CloudNoTvFound,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Unknown { .. } => ErrorKind::Unknown,
            Self::Json(_) => ErrorKind::Json,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection refused error.
    #[inline]
    pub fn connection_refused(address: impl Into<String>) -> Self {
        Self::ConnectionRefused {
            address: address.into(),
        }
    }

    /// Creates a host unreachable error.
    #[inline]
    pub fn host_unreachable(address: impl Into<String>) -> Self {
        Self::HostUnreachable {
            address: address.into(),
        }
    }

    /// Creates a network unreachable error.
    #[inline]
    pub fn network_unreachable(address: impl Into<String>) -> Self {
        Self::NetworkUnreachable {
            address: address.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timed_out(operation: impl Into<String>) -> Self {
        Self::TimedOut {
            operation: operation.into(),
        }
    }

    /// Creates a pairing failure.
    #[inline]
    pub fn pairing_failed(message: impl Into<String>) -> Self {
        Self::PairingFailed {
            message: message.into(),
        }
    }

    /// Creates a send failure.
    #[inline]
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
        }
    }

    /// Creates a catch-all HTTP error.
    #[inline]
    pub fn http_other(status: u16, message: impl Into<String>) -> Self {
        Self::HttpOther {
            status,
            message: message.into(),
        }
    }

    /// Creates an app not running error.
    #[inline]
    pub fn app_not_running(app_id: AppId) -> Self {
        Self::AppNotRunning { app_id }
    }

    /// Creates a capability unsupported error.
    #[inline]
    pub fn capability_unsupported(capability: impl Into<String>) -> Self {
        Self::CapabilityUnsupported {
            capability: capability.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an unknown error.
    #[inline]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Returns `true` if the television could not be reached or dropped the link.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionRefused { .. }
                | Self::HostUnreachable { .. }
                | Self::NetworkUnreachable { .. }
                | Self::TimedOut { .. }
                | Self::ConnectionReset
                | Self::SocketNotReady
                | Self::SendFailed { .. }
        )
    }

    /// Returns `true` if the television rejected our credentials.
    #[inline]
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::AuthTokenMissing | Self::AuthTokenInvalid | Self::PairingFailed { .. }
        )
    }

    /// Returns `true` if this is an HTTP status error.
    #[inline]
    #[must_use]
    pub fn is_http_error(&self) -> bool {
        matches!(
            self,
            Self::HttpForbidden
                | Self::HttpNotFound
                | Self::HttpPayloadTooLarge
                | Self::HttpNotImplemented
                | Self::HttpServiceUnavailable
                | Self::HttpOther { .. }
        )
    }

    /// Returns `true` if this error came from the cloud path.
    #[inline]
    #[must_use]
    pub fn is_cloud_error(&self) -> bool {
        matches!(
            self,
            Self::CloudNotEnabled
                | Self::CloudNoToken
                | Self::CloudTokenInvalid
                | Self::CloudNoTvFound
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry, e.g. once the television
    /// has finished booting or the user approved access.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TimedOut { .. }
                | Self::ConnectionRefused { .. }
                | Self::ConnectionReset
                | Self::SocketNotReady
                | Self::AuthTokenMissing
                | Self::HttpServiceUnavailable
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
