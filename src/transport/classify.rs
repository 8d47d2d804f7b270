//! Transport failure classification.
//!
//! Maps raw failures from the WebSocket and HTTP stacks onto the closed
//! [`Error`] taxonomy. Classification is a pure function of the error code,
//! close frame or HTTP status that the transport reports; nothing here
//! retries.
//!
//! | Input | Function |
//! |-------|----------|
//! | `std::io::Error` | [`classify_io`] |
//! | tungstenite error | [`classify_ws`] |
//! | close frame before acknowledgement | [`classify_close`] |
//! | reqwest error | [`classify_reqwest`] |
//! | HTTP status | [`check_status`] |
//! | free-form failure text | [`classify_message`] |

// ============================================================================
// Imports
// ============================================================================

use std::error::Error as StdError;
use std::io::{Error as IoError, ErrorKind as IoErrorKind};

use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::error::ProtocolError;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Close code reported when the peer closes without a status.
///
/// The television closes the channel this way when it rejects the
/// (missing or stale) authentication token.
pub const CLOSE_NO_STATUS: u16 = 1005;

// ============================================================================
// Socket Failures
// ============================================================================

/// Classifies an OS-level socket error.
///
/// `address` is the `host:port` that was being contacted.
#[must_use]
pub fn classify_io(err: &IoError, address: &str) -> Error {
    match err.kind() {
        IoErrorKind::ConnectionRefused => Error::connection_refused(address),
        IoErrorKind::HostUnreachable => Error::host_unreachable(address),
        IoErrorKind::NetworkUnreachable => Error::network_unreachable(address),
        IoErrorKind::TimedOut => Error::timed_out(format!("connect to {address}")),
        IoErrorKind::ConnectionReset
        | IoErrorKind::ConnectionAborted
        | IoErrorKind::BrokenPipe
        | IoErrorKind::UnexpectedEof => Error::ConnectionReset,
        _ => classify_message(&err.to_string(), address),
    }
}

/// Classifies a WebSocket error raised while connecting or reading.
///
/// `token_present` tells whether a token was offered in the handshake,
/// which decides between [`Error::AuthTokenMissing`] and
/// [`Error::AuthTokenInvalid`] when the handshake is rejected.
#[must_use]
pub fn classify_ws(err: &WsError, address: &str, token_present: bool) -> Error {
    match err {
        WsError::Io(io) => classify_io(io, address),
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => Error::ConnectionReset,
        WsError::Http(response) => {
            let status = response.status();
            match status.as_u16() {
                401 if token_present => Error::AuthTokenInvalid,
                401 => Error::AuthTokenMissing,
                code => match check_status(code, status.canonical_reason().unwrap_or_default()) {
                    Err(e) => e,
                    Ok(()) => Error::unknown(format!("unexpected handshake status {code}")),
                },
            }
        }
        other => classify_message(&other.to_string(), address),
    }
}

/// Classifies a close frame received before the connection acknowledgement.
///
/// A close without status (1005) means the television rejected the
/// token; any other code is reported verbatim.
#[must_use]
pub fn classify_close(code: Option<u16>, reason: &str, token_present: bool) -> Error {
    match code {
        None | Some(CLOSE_NO_STATUS) if token_present => Error::AuthTokenInvalid,
        None | Some(CLOSE_NO_STATUS) => Error::AuthTokenMissing,
        Some(code) if reason.is_empty() => {
            Error::unknown(format!("connection closed with code {code}"))
        }
        Some(code) => Error::unknown(format!("connection closed with code {code}: {reason}")),
    }
}

// ============================================================================
// HTTP Failures
// ============================================================================

/// Classifies a failed HTTP exchange (no status received).
#[must_use]
pub fn classify_reqwest(err: &reqwest::Error, address: &str) -> Error {
    if err.is_timeout() {
        return Error::timed_out(format!("request to {address}"));
    }

    // Walk the source chain down to the socket error, if there is one
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<IoError>() {
            return classify_io(io, address);
        }
        source = cause.source();
    }

    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    classify_message(&text, address)
}

/// Checks an HTTP status returned by the television or the cloud API.
///
/// Any 2xx status is success. The statuses the application endpoints are
/// known to answer with get their own kind; everything else becomes
/// [`Error::HttpOther`] carrying `message`.
///
/// # Errors
///
/// Returns the classified error for any non-2xx status.
pub fn check_status(status: u16, message: &str) -> Result<()> {
    match status {
        200..=299 => Ok(()),
        403 => Err(Error::HttpForbidden),
        404 => Err(Error::HttpNotFound),
        413 => Err(Error::HttpPayloadTooLarge),
        501 => Err(Error::HttpNotImplemented),
        503 => Err(Error::HttpServiceUnavailable),
        _ => Err(Error::http_other(status, message)),
    }
}

// ============================================================================
// Free-form Failures
// ============================================================================

/// Classifies a failure from its textual description.
///
/// Used when the transport only hands back a message, e.g. a TLS or
/// resolver error wrapping the errno name.
#[must_use]
pub fn classify_message(message: &str, address: &str) -> Error {
    let lower = message.to_ascii_lowercase();

    if lower.contains("econnrefused") || lower.contains("connection refused") {
        Error::connection_refused(address)
    } else if lower.contains("ehostunreach") || lower.contains("no route to host") {
        Error::host_unreachable(address)
    } else if lower.contains("enetunreach") || lower.contains("network is unreachable") {
        Error::network_unreachable(address)
    } else if lower.contains("etimedout") || lower.contains("timed out") {
        Error::timed_out(format!("connect to {address}"))
    } else if lower.contains("econnreset") || lower.contains("connection reset") {
        Error::ConnectionReset
    } else {
        Error::unknown(message)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::error::ErrorKind;

    const ADDR: &str = "192.168.1.20:8001";

    #[test]
    fn test_io_kinds() {
        let cases = [
            (IoErrorKind::ConnectionRefused, ErrorKind::ConnectionRefused),
            (IoErrorKind::HostUnreachable, ErrorKind::HostUnreachable),
            (IoErrorKind::NetworkUnreachable, ErrorKind::NetworkUnreachable),
            (IoErrorKind::TimedOut, ErrorKind::TimedOut),
            (IoErrorKind::ConnectionReset, ErrorKind::ConnectionReset),
            (IoErrorKind::BrokenPipe, ErrorKind::ConnectionReset),
        ];

        for (io_kind, expected) in cases {
            let err = classify_io(&IoError::new(io_kind, "boom"), ADDR);
            assert_eq!(err.kind(), expected, "io kind {io_kind:?}");
        }
    }

    #[test]
    fn test_io_refused_keeps_address() {
        let err = classify_io(&IoError::from(IoErrorKind::ConnectionRefused), ADDR);
        assert!(err.to_string().contains(ADDR));
    }

    #[test]
    fn test_io_other_falls_back_to_message() {
        let err = classify_io(&IoError::other("connect EHOSTUNREACH 10.0.0.9:8002"), ADDR);
        assert_eq!(err.kind(), ErrorKind::HostUnreachable);

        let err = classify_io(&IoError::other("something odd"), ADDR);
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_ws_closed_is_reset() {
        assert_eq!(
            classify_ws(&WsError::ConnectionClosed, ADDR, false).kind(),
            ErrorKind::ConnectionReset
        );
        assert_eq!(
            classify_ws(
                &WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake),
                ADDR,
                true
            )
            .kind(),
            ErrorKind::ConnectionReset
        );
    }

    #[test]
    fn test_ws_io_is_classified() {
        let err = WsError::Io(IoError::from(IoErrorKind::ConnectionRefused));
        assert_eq!(classify_ws(&err, ADDR, false).kind(), ErrorKind::ConnectionRefused);
    }

    #[test]
    fn test_close_without_status_depends_on_token() {
        assert_eq!(classify_close(None, "", false).kind(), ErrorKind::AuthTokenMissing);
        assert_eq!(classify_close(None, "", true).kind(), ErrorKind::AuthTokenInvalid);
        assert_eq!(
            classify_close(Some(CLOSE_NO_STATUS), "", false).kind(),
            ErrorKind::AuthTokenMissing
        );
        assert_eq!(
            classify_close(Some(CLOSE_NO_STATUS), "", true).kind(),
            ErrorKind::AuthTokenInvalid
        );
    }

    #[test]
    fn test_close_with_other_code_is_unknown() {
        let err = classify_close(Some(1011), "internal", true);
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.to_string().contains("1011"));
        assert!(err.to_string().contains("internal"));
    }

    #[test]
    fn test_check_status_specific_codes() {
        assert!(check_status(200, "OK").is_ok());
        assert!(check_status(201, "Created").is_ok());
        assert_eq!(check_status(403, "").unwrap_err().kind(), ErrorKind::HttpForbidden);
        assert_eq!(check_status(404, "").unwrap_err().kind(), ErrorKind::HttpNotFound);
        assert_eq!(
            check_status(413, "").unwrap_err().kind(),
            ErrorKind::HttpPayloadTooLarge
        );
        assert_eq!(
            check_status(501, "").unwrap_err().kind(),
            ErrorKind::HttpNotImplemented
        );
        assert_eq!(
            check_status(503, "").unwrap_err().kind(),
            ErrorKind::HttpServiceUnavailable
        );
    }

    #[test]
    fn test_check_status_other_keeps_status() {
        let err = check_status(500, "Internal Server Error").unwrap_err();
        match err {
            Error::HttpOther { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_message_patterns() {
        let cases = [
            ("connect ECONNREFUSED 1.2.3.4:8001", ErrorKind::ConnectionRefused),
            ("No route to host (os error 113)", ErrorKind::HostUnreachable),
            ("Network is unreachable", ErrorKind::NetworkUnreachable),
            ("Error: ETIMEDOUT", ErrorKind::TimedOut),
            ("read ECONNRESET", ErrorKind::ConnectionReset),
            ("certificate expired", ErrorKind::Unknown),
        ];

        for (message, expected) in cases {
            assert_eq!(classify_message(message, ADDR).kind(), expected, "{message}");
        }
    }

    proptest! {
        #[test]
        fn prop_success_statuses_never_fail(status in 200u16..300) {
            prop_assert!(check_status(status, "").is_ok());
        }

        #[test]
        fn prop_failure_statuses_are_http_errors(status in 300u16..600) {
            let err = check_status(status, "x").unwrap_err();
            prop_assert!(err.is_http_error());
        }
    }
}
