//! Samsung Remote - Remote-control client for Samsung Tizen televisions.
//!
//! This library drives a television over its local remote-control
//! protocol, with a cloud registry as an alternate path.
//!
//! # Architecture
//!
//! The client talks to three surfaces:
//!
//! - **WebSocket channel**: key presses, pointer and text input, app list,
//!   browser launch and art mode, over one lazily opened session
//! - **HTTP**: application lifecycle at `/api/v2/applications/{id}`, device
//!   info and legacy PIN pairing
//! - **Cloud REST**: capability commands and health when enabled
//!
//! Key design principles:
//!
//! - One session per [`Remote`], opened on the first command and closed
//!   after two minutes idle
//! - Commands are written in submission order by a single queue worker
//! - Every failure is classified into an [`ErrorKind`]; nothing retries
//!   on its own
//! - Only the session writes the token; only lifecycle calls write the
//!   tracked application
//!
//! # Quick Start
//!
//! ```no_run
//! use samsung_remote::{Key, Remote, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let remote = Remote::builder().address("192.168.1.20").build()?;
//!
//!     remote.send_key(Key::VolumeUp).await?;
//!     remote.set_channel(105).await?;
//!
//!     remote.launch_app(&"3201907018807".into()).await?;
//!     remote.close_current_app().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cloud`] | Cloud registry client |
//! | [`config`] | Settings, working configuration and builder |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`pairing`] | Token and legacy PIN pairing |
//! | [`protocol`] | WebSocket message types |
//! | [`remote`] | The [`Remote`] client and application lifecycle |
//! | [`transport`] | Session, command queue, HTTP and failure classification |

// ============================================================================
// Modules
// ============================================================================

/// Cloud fallback path.
pub mod cloud;

/// Settings, working configuration and the client builder.
///
/// Use [`Remote::builder()`] to create a configured client.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Token and legacy PIN pairing.
pub mod pairing;

/// WebSocket protocol message types.
pub mod protocol;

/// The remote-control client.
pub mod remote;

/// Transport layer.
///
/// Session management, command queue, HTTP and failure classification.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use remote::{AppCatalog, AppStatus, DeviceInfo, Remote};

// Configuration types
pub use config::{Config, MemorySettings, RemoteBuilder, Settings, SettingsStore, SharedConfig};

// Error types
pub use error::{Error, ErrorKind, Result};

// Identifier types
pub use identifiers::{AppId, CloudDeviceId, PairingRequestId};

// Protocol types
pub use protocol::{Command, Key, KeyAction, LaunchType, MouseButton};

// Cloud types
pub use cloud::{CapabilityCommand, CloudClient, Health};

// Pairing types
pub use pairing::{PairedIdentity, PairingSession, PinHandshake, PinPairing, RetryPolicy};

// Transport types
pub use transport::{ConnectionState, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
