//! In-process test doubles for the transports.
//!
//! [`FakeTv`] is a WebSocket server on `127.0.0.1` speaking the
//! remote-control channel; [`MockHttp`] is a scripted [`HttpTransport`]
//! that records every request.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{Error, Result};

use super::http::{HttpRequest, HttpResponse, HttpTransport, Method};

// ============================================================================
// Logging
// ============================================================================

/// Installs a test subscriber honouring `RUST_LOG`, once per process.
pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// FakeTv
// ============================================================================

/// WebSocket server impersonating a television.
///
/// Every accepted connection is sent `greeting`, then every text frame the
/// client sends is forwarded to [`FakeTv::next_text`].
pub(crate) struct FakeTv {
    address: SocketAddr,
    accepted: Arc<AtomicUsize>,
    uris: Arc<Mutex<Vec<String>>>,
    received: mpsc::UnboundedReceiver<String>,
    handle: JoinHandle<()>,
}

impl FakeTv {
    /// Starts a server that greets each client with `greeting`.
    pub(crate) async fn start(greeting: Vec<Message>) -> Self {
        init_logging();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        let accepted = Arc::new(AtomicUsize::new(0));
        let uris = Arc::new(Mutex::new(Vec::new()));
        let (received_tx, received) = mpsc::unbounded_channel();

        let handle = tokio::spawn({
            let accepted = Arc::clone(&accepted);
            let uris = Arc::clone(&uris);
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    let uris = Arc::clone(&uris);
                    let greeting = greeting.clone();
                    let received_tx = received_tx.clone();

                    tokio::spawn(async move {
                        let callback = move |request: &Request,
                                             response: Response|
                              -> std::result::Result<Response, ErrorResponse> {
                            uris.lock().push(request.uri().to_string());
                            Ok(response)
                        };
                        let Ok(mut ws) = accept_hdr_async(stream, callback).await else {
                            return;
                        };

                        for message in greeting {
                            if ws.send(message).await.is_err() {
                                return;
                            }
                        }

                        while let Some(Ok(message)) = ws.next().await {
                            if let Message::Text(text) = message {
                                let _ = received_tx.send(text.as_str().to_string());
                            }
                        }
                    });
                }
            }
        });

        Self {
            address,
            accepted,
            uris,
            received,
            handle,
        }
    }

    /// Starts a server that acknowledges connections, optionally granting `token`.
    pub(crate) async fn acknowledging(token: Option<&str>) -> Self {
        Self::start(vec![Self::ack(token)]).await
    }

    /// Builds a `ms.channel.connect` frame.
    pub(crate) fn ack(token: Option<&str>) -> Message {
        let data = match token {
            Some(token) => json!({ "token": token, "clients": [] }),
            None => json!({ "clients": [] }),
        };
        Self::event("ms.channel.connect", data)
    }

    /// Builds an event frame.
    pub(crate) fn event(event: &str, data: Value) -> Message {
        Message::text(json!({ "event": event, "data": data }).to_string())
    }

    /// Returns a plain-mode configuration pointing at this server.
    pub(crate) fn config(&self) -> Config {
        let port = self.address.port();
        Config::new("127.0.0.1")
            .with_name("test-remote")
            .with_ports(port, port, port)
            .with_connect_timeout(Duration::from_secs(2))
    }

    /// Returns the number of accepted TCP connections.
    pub(crate) fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Returns the request URIs of all handshakes so far.
    pub(crate) fn uris(&self) -> Vec<String> {
        self.uris.lock().clone()
    }

    /// Waits for the next text frame sent by the client.
    pub(crate) async fn next_text(&mut self) -> Value {
        let text = timeout(Duration::from_secs(5), self.received.recv())
            .await
            .expect("timed out waiting for frame")
            .expect("server stopped");
        serde_json::from_str(&text).expect("client sent invalid JSON")
    }

    /// Returns `true` if no frame is waiting.
    pub(crate) fn nothing_received(&mut self) -> bool {
        self.received.try_recv().is_err()
    }
}

impl Drop for FakeTv {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// MockHttp
// ============================================================================

/// Scripted [`HttpTransport`].
///
/// A request is answered by the most recently added route whose method
/// matches and whose URL fragment occurs in the request URL. Unrouted
/// requests fail with [`Error::ConnectionRefused`].
#[derive(Default)]
pub(crate) struct MockHttp {
    routes: Mutex<Vec<(Method, String, HttpResponse)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttp {
    /// Creates a transport with no routes.
    pub(crate) fn new() -> Arc<Self> {
        init_logging();
        Arc::new(Self::default())
    }

    /// Answers `method` requests containing `url_part` with `status` and `body`.
    pub(crate) fn route(&self, method: Method, url_part: &str, status: u16, body: Value) -> &Self {
        let body = if body.is_null() {
            String::new()
        } else {
            body.to_string()
        };
        self.routes
            .lock()
            .push((method, url_part.to_string(), HttpResponse::new(status, body)));
        self
    }

    /// Returns all recorded requests.
    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Returns `(method, url)` of all recorded requests.
    pub(crate) fn calls(&self) -> Vec<(Method, String)> {
        self.requests
            .lock()
            .iter()
            .map(|r| (r.method, r.url.clone()))
            .collect()
    }

    /// Counts recorded `method` requests containing `url_part`.
    pub(crate) fn count(&self, method: Method, url_part: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.url.contains(url_part))
            .count()
    }
}

#[async_trait]
impl HttpTransport for MockHttp {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request.clone());

        let routes = self.routes.lock();
        routes
            .iter()
            .rev()
            .find(|(method, part, _)| *method == request.method && request.url.contains(part))
            .map(|(_, _, response)| response.clone())
            .ok_or_else(|| Error::connection_refused(request.address()))
    }
}
