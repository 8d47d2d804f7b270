//! Transport layer.
//!
//! This module handles the two local transports to the television and the
//! failure taxonomy they share.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   submit    ┌──────────────┐  ensure_open  ┌───────────────────┐
//! │    Remote    │────────────►│ CommandQueue │──────────────►│ ConnectionManager │
//! │              │             │    (FIFO)    │               │   + event loop    │
//! │              │             └──────────────┘               └─────────┬─────────┘
//! │              │                                                      │ ws / wss
//! │              │            HttpTransport (reqwest)                   ▼
//! │              │─────────────────────────────────────────────►   Television
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `classify` | Raw failure to [`Error`](crate::Error) mapping |
//! | `connection` | WebSocket session and event loop |
//! | `http` | One-shot HTTP requests |
//! | `queue` | Serialized command submission |
//! | `tls` | Self-signed certificate handling |

// ============================================================================
// Submodules
// ============================================================================

/// Transport failure classification.
pub mod classify;

/// WebSocket session and event loop.
pub mod connection;

/// One-shot HTTP transport.
pub mod http;

/// Serialized command submission.
pub mod queue;

/// TLS client configuration.
pub mod tls;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ConnectionManager, ConnectionState};
pub use http::{Body, HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
pub use queue::CommandQueue;
