//! Shared application state and the session-level flows that span the
//! backend, the persisted store and the dashboard.
//!
//! Fetch failures here are logged and surfaced as empty results; they never
//! abort the caller.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::backend::{BackendClient, BackendError};
use crate::dashboard::{Dashboard, SelectionError};
use crate::policy::{can, Action};
use crate::store::StateStore;
use crate::{Config, RangeProfile, Reading};

// ---

#[derive(Debug, Error)]
pub enum SelectProfileError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("State store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("No session")]
    NoSession,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: BackendClient,
    pub store: StateStore,
    pub dashboard: Arc<RwLock<Dashboard>>,
}

impl AppState {
    pub fn new(config: Config, backend: BackendClient, store: StateStore) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            store,
            dashboard: Arc::new(RwLock::new(Dashboard::new())),
        }
    }

    /// Stored token for sensor calls. Those go out unauthenticated without one.
    async fn sensor_token(&self) -> Option<String> {
        // ---
        match self.store.session().await {
            Ok(session) => session.token,
            Err(e) => {
                tracing::error!("Failed to read session: {}", e);
                None
            }
        }
    }

    /// Poll the latest reading for the configured device and feed it to the
    /// dashboard. `None` when the fetch failed; the dashboard is untouched.
    pub async fn poll_latest(&self) -> Option<Reading> {
        // ---
        let token = self.sensor_token().await;
        match self
            .backend
            .latest_reading(token.as_deref(), Some(&self.config.device_id))
            .await
        {
            Ok(reading) => {
                let mut dashboard = self.dashboard.write().await;
                let alerts = dashboard.on_reading(reading.clone());
                if alerts.is_empty() {
                    tracing::debug!("Reading at {} within range", reading.timestamp);
                } else {
                    tracing::info!("Reading at {} raised {} alert(s)", reading.timestamp, alerts.len());
                }
                Some(reading)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch latest reading: {}", e);
                None
            }
        }
    }

    /// Readings for a report. Empty when the fetch failed.
    pub async fn history(&self) -> Vec<Reading> {
        // ---
        let token = self.sensor_token().await;
        let device = Some(self.config.device_id.as_str());
        match self
            .backend
            .reading_history(token.as_deref(), device, Some(self.config.report_history_limit))
            .await
        {
            Ok(readings) => {
                tracing::debug!("Fetched {} historical readings", readings.len());
                readings
            }
            Err(e) => {
                tracing::warn!("Failed to fetch reading history: {}", e);
                Vec::new()
            }
        }
    }

    /// Profiles visible to the current session.
    ///
    /// Administrators also see inactive profiles. Without a token the
    /// backend is not called. A 401 clears the stored credentials.
    pub async fn load_profiles(&self) -> Vec<RangeProfile> {
        // ---
        let session = match self.store.session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Failed to read session: {}", e);
                return Vec::new();
            }
        };
        let Some(token) = session.token.as_deref() else {
            tracing::debug!("No session, profile list is empty");
            return Vec::new();
        };

        let include_inactive = can(Action::ViewInactiveProfiles, session.role());
        match self.backend.list_profiles(token, include_inactive).await {
            Ok(profiles) => profiles,
            Err(BackendError::Unauthorized) => {
                tracing::warn!("Session rejected while listing profiles, clearing credentials");
                if let Err(e) = self.store.clear_auth().await {
                    tracing::error!("Failed to clear credentials: {}", e);
                }
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to list profiles: {}", e);
                Vec::new()
            }
        }
    }

    /// Select the profile with `id`, or clear the selection with `None`.
    /// The choice is persisted.
    pub async fn select_profile(&self, id: Option<i64>) -> Result<Option<RangeProfile>, SelectProfileError> {
        // ---
        let profile = match id {
            Some(id) => {
                let session = self.store.session().await?;
                let token = session.token.ok_or(SelectProfileError::NoSession)?;
                Some(self.backend.get_profile(&token, id).await?)
            }
            None => None,
        };

        self.dashboard.write().await.select_profile(profile.clone())?;
        self.store.set_active_profile_id(id).await?;

        match &profile {
            Some(p) => tracing::info!("Active profile: {} ({})", p.name, p.id),
            None => tracing::info!("Active profile cleared"),
        }
        Ok(profile)
    }

    /// Re-select the stored active profile. Needs a session; when the
    /// profile cannot be fetched or selected the stored id is dropped.
    pub async fn restore_active_profile(&self) -> Option<RangeProfile> {
        // ---
        let stored = match self.store.active_profile_id().await {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::error!("Failed to read stored profile id: {}", e);
                return None;
            }
        };

        match self.select_profile(Some(stored)).await {
            Ok(profile) => profile,
            Err(SelectProfileError::NoSession) => {
                tracing::debug!("No session, active profile {} not restored", stored);
                None
            }
            Err(e) => {
                tracing::warn!("Could not restore active profile {}: {}", stored, e);
                if let Err(e) = self.store.set_active_profile_id(None).await {
                    tracing::error!("Failed to clear stored profile id: {}", e);
                }
                None
            }
        }
    }

    /// Keep the selection in step with an edited profile.
    pub async fn profile_updated(&self, profile: &RangeProfile) -> Result<(), sqlx::Error> {
        // ---
        let changed = self.dashboard.write().await.profile_updated(profile);
        if changed && !profile.active {
            tracing::info!("Active profile {} deactivated, selection cleared", profile.id);
            self.store.set_active_profile_id(None).await?;
        }
        Ok(())
    }

    pub async fn profile_removed(&self, id: i64) -> Result<(), sqlx::Error> {
        // ---
        if self.dashboard.write().await.profile_removed(id) {
            tracing::info!("Active profile {} deleted, selection cleared", id);
            self.store.set_active_profile_id(None).await?;
        }
        Ok(())
    }

    /// Drop credentials and the in-memory selection.
    pub async fn logout(&self) -> Result<(), sqlx::Error> {
        // ---
        self.store.clear_auth().await?;
        // Clearing never fails
        let _ = self.dashboard.write().await.select_profile(None);
        Ok(())
    }
}
