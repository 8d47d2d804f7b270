//! Remote-control client.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `client` | [`Remote`], keys, pointer, text, channel apps, device info |
//! | `apps` | Application lifecycle over HTTP |
//! | `catalog` | Installed-app catalog |
//! | `info` | Device information |

// ============================================================================
// Submodules
// ============================================================================

/// Application lifecycle.
pub mod apps;

/// Installed-app catalog.
pub mod catalog;

/// Remote client.
pub mod client;

/// Device information.
pub mod info;

// ============================================================================
// Re-exports
// ============================================================================

pub use apps::AppStatus;
pub use catalog::{AppCatalog, DEFAULT_CATALOG_MAX_AGE};
pub use client::Remote;
pub use info::{DeviceDetails, DeviceInfo};
