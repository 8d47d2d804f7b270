//! Application lifecycle over HTTP.
//!
//! Applications are queried, launched and closed at
//! `/api/v2/applications/{id}` with `GET`, `POST` and `DELETE`. The client
//! tracks the last application it launched so it can close it later; the
//! television stays the source of truth and is asked before closing.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::identifiers::AppId;
use crate::transport::{HttpRequest, HttpResponse, Method};

use super::client::Remote;

// ============================================================================
// AppStatus
// ============================================================================

/// Status reported by `GET /api/v2/applications/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppStatus {
    /// Application identifier.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Process is running.
    pub running: bool,
    /// Application is in the foreground.
    pub visible: bool,
    /// Installed version.
    pub version: Option<String>,
}

// ============================================================================
// Lifecycle
// ============================================================================

impl Remote {
    /// Queries the status of `app_id`.
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn get_app(&self, app_id: &AppId) -> Result<AppStatus> {
        let response = self.application_call(Method::Get, app_id).await?;
        if response.body.trim().is_empty() {
            return Ok(AppStatus::default());
        }
        response.json()
    }

    /// Returns `true` if the television reports `app_id` in the foreground.
    ///
    /// Any failure counts as not running.
    pub async fn is_app_running(&self, app_id: &AppId) -> bool {
        match self.get_app(app_id).await {
            Ok(status) => status.visible,
            Err(e) => {
                debug!(%app_id, error = %e, "Running check failed");
                false
            }
        }
    }

    /// Launches `app_id` and tracks it as the current application.
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure; the current application is
    /// unchanged in that case.
    pub async fn launch_app(&self, app_id: &AppId) -> Result<()> {
        self.application_call(Method::Post, app_id).await?;
        *self.inner.current_app.lock() = Some(app_id.clone());
        Ok(())
    }

    /// Closes `app_id`.
    ///
    /// Clears the current application if it is `app_id`.
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn close_app(&self, app_id: &AppId) -> Result<()> {
        self.application_call(Method::Delete, app_id).await?;
        self.clear_current_app(app_id);
        Ok(())
    }

    /// Closes the application launched last.
    ///
    /// # Errors
    ///
    /// - [`Error::NoAppRunning`] if nothing was launched, without any request
    /// - [`Error::AppNotRunning`] if the television does not report it
    ///   running; it is no longer tracked afterwards and no close is sent
    /// - the classified HTTP failure of the close
    pub async fn close_current_app(&self) -> Result<()> {
        let Some(app_id) = self.current_app() else {
            return Err(Error::NoAppRunning);
        };

        if !self.is_app_running(&app_id).await {
            self.clear_current_app(&app_id);
            return Err(Error::app_not_running(app_id));
        }

        self.clear_current_app(&app_id);
        self.application_call(Method::Delete, &app_id).await?;
        Ok(())
    }

    /// Returns the tracked application.
    #[must_use]
    pub fn current_app(&self) -> Option<AppId> {
        self.inner.current_app.lock().clone()
    }

    /// Starts YouTube playing `video_id`.
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn launch_youtube(&self, video_id: &str) -> Result<()> {
        let (url, deadline) = {
            let config = self.inner.config.read();
            (config.dial_url("/ws/apps/YouTube"), config.app_timeout)
        };

        let request = HttpRequest::post(url)
            .with_text(format!("v={video_id}"))
            .with_timeout(deadline);
        let response = self.inner.http.execute(request).await?;
        response.check()?;

        info!(%video_id, "YouTube started");
        Ok(())
    }

    /// Clears the tracked application if it is still `app_id`.
    fn clear_current_app(&self, app_id: &AppId) {
        let mut current = self.inner.current_app.lock();
        if current.as_ref() == Some(app_id) {
            *current = None;
        }
    }

    /// Performs one lifecycle request and checks its status.
    async fn application_call(&self, method: Method, app_id: &AppId) -> Result<HttpResponse> {
        let (url, deadline) = {
            let config = self.inner.config.read();
            (config.app_url(app_id), config.app_timeout)
        };

        let request = HttpRequest::new(method, url).with_timeout(deadline);
        let response = match self.inner.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                info!(%method, %app_id, error = %e, "Application command failed");
                return Err(e);
            }
        };

        if let Err(e) = response.check() {
            info!(%method, %app_id, status = response.status, "Application command failed");
            return Err(e);
        }

        info!(%method, %app_id, "Application command OK");
        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
