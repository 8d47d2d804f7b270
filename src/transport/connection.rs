//! WebSocket connection manager and event loop.
//!
//! Owns the single remote-control session of a client. The socket is
//! opened lazily by [`ConnectionManager::ensure_open`] and closed again
//! after a period without traffic.
//!
//! # State Machine
//!
//! ```text
//! Closed ──ensure_open──► Connecting ──ms.channel.connect──► Open
//!    ▲                        │                              │
//!    │                        └──error / timeout──► Failed   │
//!    └────────────── close / idle timeout / disconnect ◄─────┘
//! ```
//!
//! # Event Loop
//!
//! Each open socket is driven by a tokio task that handles:
//!
//! - Incoming events (acknowledgement, token grant, app-list pushes)
//! - Outgoing frames submitted through [`Connection::send_text`]
//! - The idle timer, re-armed on every send and every `ensure_open`

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};
use tracing::{debug, info, trace, warn};

use crate::config::{SettingsStore, SharedConfig};
use crate::error::{Error, Result};
use crate::protocol::{Event, ParsedEvent};
use crate::remote::AppCatalog;

use super::{classify, tls};

// ============================================================================
// Types
// ============================================================================

/// WebSocket stream to the television.
pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Settles a pending connect.
type ReadySender = oneshot::Sender<Result<()>>;

// ============================================================================
// ConnectionState
// ============================================================================

/// Observable state of the remote-control session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket.
    Closed,
    /// Socket opening, acknowledgement not yet received.
    Connecting,
    /// Acknowledged and ready for commands.
    Open,
    /// The last connect attempt failed.
    Failed(String),
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("closed"),
            Self::Connecting => f.write_str("connecting"),
            Self::Open => f.write_str("open"),
            Self::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

/// Internal phase, holding the live connection when open.
enum Phase {
    Closed,
    Connecting,
    Open(Connection),
    Failed(String),
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a text frame.
    Send {
        text: String,
        ack: oneshot::Sender<Result<()>>,
    },
    /// Re-arm the idle timer.
    Touch,
    /// Close the socket.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to an open socket.
///
/// Cheap to clone; all clones drive the same event loop.
#[derive(Clone)]
pub struct Connection {
    id: u64,
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    open: Arc<AtomicBool>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Connection {
    /// Returns `true` while the socket accepts writes.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.command_tx.is_closed()
    }

    /// Re-arms the idle timer.
    pub fn touch(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Touch);
    }

    /// Writes one text frame and waits until the socket accepted it.
    ///
    /// # Errors
    ///
    /// - [`Error::SocketNotReady`] if the socket is not open or closes
    ///   before the frame is written
    /// - [`Error::SendFailed`] if the write fails
    pub async fn send_text(&self, text: String) -> Result<()> {
        if !self.is_open() {
            return Err(Error::SocketNotReady);
        }

        let (ack, ack_rx) = oneshot::channel();
        self.command_tx
            .send(ConnectionCommand::Send { text, ack })
            .map_err(|_| Error::SocketNotReady)?;

        // Every processed frame is answered, so a dropped reply means the
        // loop closed before writing it
        ack_rx.await.map_err(|_| Error::SocketNotReady)?
    }

    /// Closes the socket gracefully.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Owner of the single remote-control session.
pub struct ConnectionManager {
    config: SharedConfig,
    settings: Arc<dyn SettingsStore>,
    catalog: Arc<RwLock<AppCatalog>>,
    phase: Arc<Mutex<Phase>>,
    /// Serializes connect attempts.
    connect_lock: tokio::sync::Mutex<()>,
    next_id: AtomicU64,
}

impl ConnectionManager {
    /// Creates a manager in the `Closed` state.
    #[must_use]
    pub fn new(
        config: SharedConfig,
        settings: Arc<dyn SettingsStore>,
        catalog: Arc<RwLock<AppCatalog>>,
    ) -> Self {
        Self {
            config,
            settings,
            catalog,
            phase: Arc::new(Mutex::new(Phase::Closed)),
            connect_lock: tokio::sync::Mutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        match &*self.phase.lock() {
            Phase::Closed => ConnectionState::Closed,
            Phase::Connecting => ConnectionState::Connecting,
            Phase::Open(connection) if connection.is_open() => ConnectionState::Open,
            Phase::Open(_) => ConnectionState::Closed,
            Phase::Failed(message) => ConnectionState::Failed(message.clone()),
        }
    }

    /// Returns an open connection, connecting first if needed.
    ///
    /// A live connection only has its idle timer re-armed. Otherwise a new
    /// socket is opened and this call waits for the television's
    /// acknowledgement; concurrent callers share one attempt.
    ///
    /// # Errors
    ///
    /// Returns the classified connect failure, see
    /// [`classify`](super::classify).
    pub async fn ensure_open(&self) -> Result<Connection> {
        if let Some(connection) = self.live() {
            connection.touch();
            return Ok(connection);
        }

        let _guard = self.connect_lock.lock().await;

        // Another caller may have connected while we waited
        if let Some(connection) = self.live() {
            connection.touch();
            return Ok(connection);
        }

        *self.phase.lock() = Phase::Connecting;

        match self.connect().await {
            Ok(connection) => {
                *self.phase.lock() = Phase::Open(connection.clone());
                Ok(connection)
            }
            Err(e) => {
                debug!(error = %e, "Connect failed");
                *self.phase.lock() = Phase::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Closes the session if one is open.
    pub fn disconnect(&self) {
        let previous = std::mem::replace(&mut *self.phase.lock(), Phase::Closed);
        if let Phase::Open(connection) = previous {
            debug!(id = connection.id, "Disconnecting");
            connection.shutdown();
        }
    }

    /// Returns the open connection, if any.
    fn live(&self) -> Option<Connection> {
        match &*self.phase.lock() {
            Phase::Open(connection) if connection.is_open() => Some(connection.clone()),
            _ => None,
        }
    }

    /// Opens a socket and waits for the acknowledgement.
    async fn connect(&self) -> Result<Connection> {
        let (url, address, secure, token_present, connect_timeout, idle_timeout) = {
            let config = self.config.read();
            (
                config.ws_url(),
                config.ws_address(),
                config.token_auth,
                config.token_present(),
                config.connect_timeout,
                config.idle_timeout,
            )
        };

        debug!(%address, secure, token_present, "Connecting to television");

        let stream = open_socket(&url, &address, secure, token_present, connect_timeout).await?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = oneshot::channel();

        let event_loop = EventLoop {
            id,
            address: address.clone(),
            token_present,
            idle_timeout,
            config: Arc::clone(&self.config),
            settings: Arc::clone(&self.settings),
            catalog: Arc::clone(&self.catalog),
            phase: Arc::clone(&self.phase),
            open: Arc::clone(&open),
            ready: Some(ready_tx),
        };
        tokio::spawn(event_loop.run(stream, command_rx));

        let connection = Connection {
            id,
            command_tx,
            open,
        };

        match timeout(connect_timeout, ready_rx).await {
            Ok(Ok(Ok(()))) => {
                info!(%address, id, "Connected to television");
                Ok(connection)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(_)) => Err(Error::ConnectionReset),
            Err(_) => {
                connection.shutdown();
                Err(Error::timed_out(format!("acknowledgement from {address}")))
            }
        }
    }
}

// ============================================================================
// Socket Setup
// ============================================================================

/// Opens the WebSocket, classifying any failure.
///
/// `secure` selects `wss://` with the television's self-signed certificate.
pub(crate) async fn open_socket(
    url: &str,
    address: &str,
    secure: bool,
    token_present: bool,
    deadline: Duration,
) -> Result<WsStream> {
    let connector = if secure {
        Some(Connector::Rustls(tls::television_client_config()?))
    } else {
        None
    };

    trace!(%url, "Opening WebSocket");

    match timeout(deadline, connect_async_tls_with_config(url, None, false, connector)).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(e)) => Err(classify::classify_ws(&e, address, token_present)),
        Err(_) => Err(Error::timed_out(format!("connect to {address}"))),
    }
}

/// Stores a token granted by the television and asks the store to persist it.
///
/// This is the only place the token is written.
pub(crate) fn adopt_token(config: &SharedConfig, settings: &dyn SettingsStore, token: &str) {
    {
        let mut config = config.write();
        if config.token.as_deref() == Some(token) {
            return;
        }
        config.token = Some(token.to_string());
    }

    info!("Television granted a new token");
    if let Err(e) = settings.save_token(token) {
        warn!(error = %e, "Failed to persist token");
    }
}

// ============================================================================
// EventLoop
// ============================================================================

/// State owned by the task driving one socket.
struct EventLoop {
    id: u64,
    address: String,
    token_present: bool,
    idle_timeout: Duration,
    config: SharedConfig,
    settings: Arc<dyn SettingsStore>,
    catalog: Arc<RwLock<AppCatalog>>,
    phase: Arc<Mutex<Phase>>,
    open: Arc<AtomicBool>,
    /// Pending connect, taken on acknowledgement or failure.
    ready: Option<ReadySender>,
}

impl EventLoop {
    async fn run(
        mut self,
        stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    ) {
        let (mut ws_write, mut ws_read) = stream.split();

        // Armed only once acknowledged; the connect deadline covers the rest
        let idle = sleep(self.idle_timeout);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            let was_pending = self.ready.is_some();
                            if !self.handle_text(text.as_str()) {
                                break;
                            }
                            if was_pending && self.ready.is_none() {
                                idle.as_mut().reset(Instant::now() + self.idle_timeout);
                            }
                        }

                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (Some(u16::from(f.code)), f.reason.as_str().to_string()))
                                .unwrap_or((None, String::new()));
                            debug!(id = self.id, ?code, %reason, "WebSocket closed by television");
                            self.fail_ready(classify::classify_close(code, &reason, self.token_present));
                            break;
                        }

                        Some(Err(e)) => {
                            let err = classify::classify_ws(&e, &self.address, self.token_present);
                            warn!(id = self.id, error = %err, "WebSocket error");
                            self.fail_ready(err);
                            break;
                        }

                        None => {
                            debug!(id = self.id, "WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { text, ack }) => {
                            trace!(id = self.id, len = text.len(), "Sending frame");
                            let result = ws_write
                                .send(Message::Text(text.into()))
                                .await
                                .map_err(|e| Error::send_failed(e.to_string()));
                            let failed = result.is_err();
                            let _ = ack.send(result);

                            if failed {
                                break;
                            }
                            idle.as_mut().reset(Instant::now() + self.idle_timeout);
                        }

                        Some(ConnectionCommand::Touch) => {
                            idle.as_mut().reset(Instant::now() + self.idle_timeout);
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!(id = self.id, "Shutdown requested");
                            self.open.store(false, Ordering::Release);
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!(id = self.id, "Command channel closed");
                            break;
                        }
                    }
                }

                () = &mut idle, if self.ready.is_none() => {
                    debug!(id = self.id, "Idle timeout, closing connection");
                    self.open.store(false, Ordering::Release);
                    let _ = ws_write.close().await;
                    break;
                }
            }
        }

        self.finish();
    }

    /// Handles one text frame. Returns `false` to stop the loop.
    fn handle_text(&mut self, text: &str) -> bool {
        let event = match Event::from_text(text) {
            Ok(event) => event,
            Err(e) => {
                warn!(id = self.id, error = %e, "Ignoring unparsable frame");
                return true;
            }
        };

        match event.parse() {
            ParsedEvent::ChannelConnect { token } => {
                // The token must be stored before the connect resolves
                if let Some(token) = token {
                    adopt_token(&self.config, self.settings.as_ref(), &token);
                }
                if let Some(ready) = self.ready.take() {
                    let _ = ready.send(Ok(()));
                }
                true
            }

            ParsedEvent::Unauthorized => {
                if self.ready.is_some() {
                    let err = classify::classify_close(None, "", self.token_present);
                    self.fail_ready(err);
                    false
                } else {
                    warn!(id = self.id, "Unauthorized event on open connection");
                    true
                }
            }

            ParsedEvent::InstalledApps(apps) => {
                let count = apps.len();
                if self.catalog.write().replace(apps) {
                    info!(id = self.id, count, "App catalog refreshed");
                } else {
                    debug!(id = self.id, "Ignoring empty app list");
                }
                true
            }

            ParsedEvent::Malformed { event, message } => {
                warn!(id = self.id, %event, %message, "Ignoring malformed event");
                true
            }

            ParsedEvent::Other { event } => {
                trace!(id = self.id, %event, "Unhandled event");
                true
            }
        }
    }

    /// Rejects the pending connect, if any.
    fn fail_ready(&mut self, err: Error) {
        if let Some(ready) = self.ready.take() {
            let _ = ready.send(Err(err));
        }
    }

    /// Marks the connection closed.
    fn finish(mut self) {
        self.open.store(false, Ordering::Release);
        self.fail_ready(Error::ConnectionReset);

        let mut phase = self.phase.lock();
        if let Phase::Open(connection) = &*phase
            && connection.id == self.id
        {
            *phase = Phase::Closed;
        }
        drop(phase);

        debug!(id = self.id, "Event loop terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================
