//! Client configuration.
//!
//! | Type | Role |
//! |------|------|
//! | [`Settings`] | Persisted fields, owned by the embedding application |
//! | [`SettingsStore`] | Read and persist [`Settings`] |
//! | [`Config`] | Working configuration shared by every component |
//! | [`RemoteBuilder`] | Validated construction of a [`Remote`](crate::Remote) |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent client builder.
pub mod builder;

/// Working configuration.
pub mod options;

/// Persisted settings.
pub mod settings;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::RemoteBuilder;
pub use options::{Config, SharedConfig};
pub use settings::{MemorySettings, Settings, SettingsStore};
