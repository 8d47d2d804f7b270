//! Remote-control channel message types.
//!
//! This module defines the JSON messages exchanged with the television
//! over the `samsung.remote.control` WebSocket channel.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`Command`] | Client → TV | Key, pointer, text, app and art-mode requests |
//! | [`Event`] | TV → Client | Acknowledgement, app list, pairing outcome |
//!
//! Commands are fire-and-forget: the channel has no request identifiers and
//! no per-command reply.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Outgoing command shapes |
//! | `event` | Incoming event parsing |
//! | `key` | Remote key codes and actions |

// ============================================================================
// Submodules
// ============================================================================

/// Outgoing command definitions.
pub mod command;

/// Incoming event types.
pub mod event;

/// Remote key codes.
pub mod key;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{ChannelEmit, Command, LaunchType, Position, RemoteControl, RemoteType};
pub use event::{AppEntry, Event, ParsedEvent};
pub use key::{Key, KeyAction, MouseButton};
