//! Installed-application catalog.
//!
//! Filled from `ed.installedApp.get` pushes. Every push replaces the
//! catalog as a whole; entries are never merged.

// ============================================================================
// Imports
// ============================================================================

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::identifiers::AppId;
use crate::protocol::AppEntry;

// ============================================================================
// Constants
// ============================================================================

/// Age after which the catalog should be requested again.
pub const DEFAULT_CATALOG_MAX_AGE: Duration = Duration::from_secs(5 * 60);

// ============================================================================
// AppCatalog
// ============================================================================

/// Mapping from application identifier to display name.
#[derive(Debug, Clone, Default)]
pub struct AppCatalog {
    apps: FxHashMap<AppId, String>,
    refreshed_at: Option<Instant>,
}

impl AppCatalog {
    /// Creates an empty catalog that has never been refreshed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the catalog with `entries`.
    ///
    /// An empty list is ignored and returns `false`; the television sends
    /// one while it is still starting up.
    pub fn replace(&mut self, entries: Vec<AppEntry>) -> bool {
        if entries.is_empty() {
            return false;
        }

        self.apps = entries
            .into_iter()
            .map(|entry| (entry.app_id, entry.name))
            .collect();
        self.refreshed_at = Some(Instant::now());
        true
    }

    /// Returns the display name of `app_id`.
    #[inline]
    #[must_use]
    pub fn get(&self, app_id: &AppId) -> Option<&str> {
        self.apps.get(app_id).map(String::as_str)
    }

    /// Returns the number of applications.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Returns `true` if no list has been received yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Returns all entries sorted by name, case-insensitively.
    #[must_use]
    pub fn entries(&self) -> Vec<(AppId, String)> {
        let mut entries: Vec<_> = self
            .apps
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect();
        entries.sort_by_cached_key(|(id, name)| (name.to_lowercase(), id.clone()));
        entries
    }

    /// Returns entries whose name contains `query`, case-insensitively.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<(AppId, String)> {
        let needle = query.to_lowercase();
        self.entries()
            .into_iter()
            .filter(|(_, name)| name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Returns when the last non-empty list arrived.
    #[inline]
    #[must_use]
    pub fn refreshed_at(&self) -> Option<Instant> {
        self.refreshed_at
    }

    /// Returns `true` if the catalog was never filled or is older than `max_age`.
    #[must_use]
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.refreshed_at
            .is_none_or(|at| at.elapsed() > max_age)
    }

    /// Returns the raw mapping.
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &FxHashMap<AppId, String> {
        &self.apps
    }
}

// ============================================================================
// Tests
// ============================================================================
