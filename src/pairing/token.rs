//! Token pairing and caller-side retry.
//!
//! Token-mode televisions grant a token the first time a client connects
//! without one and the user approves the prompt on screen. The regular
//! session picks the token up from the acknowledgement; [`request_token`]
//! does the same over a dedicated socket so callers can pair up front.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::protocol::Event;
use crate::transport::classify;
use crate::transport::connection::open_socket;

// ============================================================================
// Constants
// ============================================================================

/// Attempts made by the default [`RetryPolicy`].
pub const DEFAULT_PAIR_ATTEMPTS: u32 = 3;

/// Pause between attempts of the default [`RetryPolicy`].
pub const DEFAULT_PAIR_DELAY: Duration = Duration::from_secs(1);

// ============================================================================
// Token Request
// ============================================================================

/// Requests a token from the television over `wss://`.
///
/// Waits for the first event on a fresh token-less socket and returns
/// the token it carries.
///
/// # Errors
///
/// - [`Error::PairingFailed`] if the first event carries no token
/// - the classified connect failure
pub async fn request_token(config: &Config) -> Result<String> {
    let url = config.ws_url_for(true, None);
    let address = format!("{}:{}", config.address, config.secure_port);
    info!(%address, "Pairing started");

    request_token_at(&url, &address, true, config.connect_timeout).await
}

/// Requests a token over the socket at `url`.
pub(crate) async fn request_token_at(
    url: &str,
    address: &str,
    secure: bool,
    deadline: Duration,
) -> Result<String> {
    let mut stream = open_socket(url, address, secure, false, deadline).await?;

    let first = loop {
        match timeout(deadline, stream.next()).await {
            Err(_) => break Err(Error::timed_out(format!("pairing with {address}"))),
            Ok(None) => break Err(Error::pairing_failed("connection closed without reply")),
            Ok(Some(Err(e))) => break Err(classify::classify_ws(&e, address, false)),
            Ok(Some(Ok(Message::Text(text)))) => break Ok(text.as_str().to_string()),
            Ok(Some(Ok(Message::Close(_)))) => {
                break Err(Error::pairing_failed("television declined pairing"));
            }
            Ok(Some(Ok(_))) => {}
        }
    };

    let _ = stream.close(None).await;
    token_from_reply(&first?)
}

/// Extracts `data.token` from the first event of a pairing socket.
///
/// # Errors
///
/// Returns [`Error::PairingFailed`] if the reply carries no token.
pub fn token_from_reply(text: &str) -> Result<String> {
    let event = Event::from_text(text)
        .map_err(|e| Error::pairing_failed(format!("unreadable reply: {e}")))?;

    match event.data.get("token") {
        Some(serde_json::Value::String(token)) if !token.is_empty() => {
            info!("Pairing granted a token");
            Ok(token.clone())
        }
        Some(serde_json::Value::Number(token)) => Ok(token.to_string()),
        _ => {
            debug!(event = %event.event, "Pairing reply without token");
            Err(Error::pairing_failed(format!(
                "no token in `{}` reply",
                event.event
            )))
        }
    }
}

// ============================================================================
// RetryPolicy
// ============================================================================

/// Bounded retry with a fixed pause, for callers driving pairing.
///
/// The client never retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, at least one.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_PAIR_ATTEMPTS,
            delay: DEFAULT_PAIR_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy.
    #[inline]
    #[must_use]
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Runs `operation` until it succeeds or the attempts are used up.
    ///
    /// `operation` receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    debug!(attempt, attempts, error = %e, "Attempt failed, retrying");
                    sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
