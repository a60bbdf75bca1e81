//! REST client for the SMIIVERN backend.
//!
//! Covers sensor readings, authentication, plant profiles and user
//! administration. Every call returns a [`BackendError`] so callers can tell
//! an expired session (401) apart from transport or server failures.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::models::{ApiResponse, LoginCredentials, LoginResponse, ProfileDraft, RegisterRequest, User};
use crate::{RangeProfile, Reading};

// ---

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Session rejected by backend (401)")]
    Unauthorized,
    #[error("Server returned status {0}")]
    ServerError(StatusCode),
    #[error("Backend reported failure: {0}")]
    Api(String),
}

impl BackendError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Unauthorized)
    }
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct ActiveFlag {
    activo: bool,
}

#[derive(Serialize)]
struct UserTypeBody<'a> {
    #[serde(rename = "tipoUsuario")]
    user_type: &'a str,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        // ---
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(request: RequestBuilder, token: &str) -> RequestBuilder {
        request.header("Authorization", format!("Bearer {token}"))
    }

    // --- sensor readings

    /// `GET /sensors/latest[?device_id=]`, authenticated when a token is at hand.
    pub async fn latest_reading(
        &self,
        token: Option<&str>,
        device_id: Option<&str>,
    ) -> Result<Reading, BackendError> {
        // ---
        let mut request = self.http.get(self.url("/sensors/latest"));
        if let Some(token) = token {
            request = Self::bearer(request, token);
        }
        if let Some(id) = device_id {
            request = request.query(&[("device_id", id)]);
        }
        tracing::debug!("Fetching latest reading (device: {:?})", device_id);
        decode(request.send().await?).await
    }

    /// `GET /sensors/history[?device_id=][&limit=]`
    pub async fn reading_history(
        &self,
        token: Option<&str>,
        device_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Reading>, BackendError> {
        // ---
        let mut request = self.http.get(self.url("/sensors/history"));
        if let Some(token) = token {
            request = Self::bearer(request, token);
        }
        if let Some(id) = device_id {
            request = request.query(&[("device_id", id)]);
        }
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        tracing::debug!("Fetching reading history (device: {:?}, limit: {:?})", device_id, limit);
        decode(request.send().await?).await
    }

    // --- authentication

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, BackendError> {
        // ---
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(credentials)
            .send()
            .await?;
        decode(response).await
    }

    /// The backend's reply is passed through untouched.
    pub async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value, BackendError> {
        // ---
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    // --- plant profiles

    pub async fn list_profiles(
        &self,
        token: &str,
        include_inactive: bool,
    ) -> Result<Vec<RangeProfile>, BackendError> {
        // ---
        let mut request = Self::bearer(self.http.get(self.url("/plant-profiles")), token);
        if include_inactive {
            request = request.query(&[("incluirInactivos", "true")]);
        }
        decode(request.send().await?).await
    }

    pub async fn get_profile(&self, token: &str, id: i64) -> Result<RangeProfile, BackendError> {
        // ---
        let request = self.http.get(self.url(&format!("/plant-profiles/{id}")));
        decode(Self::bearer(request, token).send().await?).await
    }

    pub async fn create_profile(
        &self,
        token: &str,
        draft: &ProfileDraft,
    ) -> Result<RangeProfile, BackendError> {
        // ---
        let request = self.http.post(self.url("/plant-profiles")).json(draft);
        decode(Self::bearer(request, token).send().await?).await
    }

    pub async fn update_profile(
        &self,
        token: &str,
        id: i64,
        draft: &ProfileDraft,
    ) -> Result<RangeProfile, BackendError> {
        // ---
        let request = self
            .http
            .patch(self.url(&format!("/plant-profiles/{id}")))
            .json(draft);
        decode(Self::bearer(request, token).send().await?).await
    }

    /// Soft delete: the profile stays in the backend with `activo = false`.
    pub async fn deactivate_profile(&self, token: &str, id: i64) -> Result<RangeProfile, BackendError> {
        // ---
        let request = self
            .http
            .patch(self.url(&format!("/plant-profiles/{id}")))
            .json(&ActiveFlag { activo: false });
        decode(Self::bearer(request, token).send().await?).await
    }

    pub async fn reactivate_profile(&self, token: &str, id: i64) -> Result<RangeProfile, BackendError> {
        // ---
        let request = self
            .http
            .patch(self.url(&format!("/plant-profiles/{id}/reactivar")))
            .json(&serde_json::json!({}));
        decode(Self::bearer(request, token).send().await?).await
    }

    /// Physical delete. Not reversible.
    pub async fn delete_profile(&self, token: &str, id: i64) -> Result<(), BackendError> {
        // ---
        let request = self
            .http
            .delete(self.url(&format!("/plant-profiles/{id}/fisico")));
        check(Self::bearer(request, token).send().await?).map(|_| ())
    }

    pub async fn profile_stats(&self, token: &str) -> Result<serde_json::Value, BackendError> {
        // ---
        let request = self.http.get(self.url("/plant-profiles/estadisticas"));
        decode(Self::bearer(request, token).send().await?).await
    }

    // --- user administration

    pub async fn list_users(&self, token: &str) -> Result<Vec<User>, BackendError> {
        // ---
        let request = self.http.get(self.url("/users"));
        let envelope: ApiResponse<Vec<User>> = decode(Self::bearer(request, token).send().await?).await?;
        unwrap_envelope(envelope)
    }

    pub async fn toggle_user_status(&self, token: &str, id: i64) -> Result<User, BackendError> {
        // ---
        let request = self
            .http
            .patch(self.url(&format!("/users/{id}/toggle-status")))
            .json(&serde_json::json!({}));
        let envelope: ApiResponse<User> = decode(Self::bearer(request, token).send().await?).await?;
        unwrap_envelope(envelope)
    }

    pub async fn update_user_type(
        &self,
        token: &str,
        id: i64,
        user_type: &str,
    ) -> Result<User, BackendError> {
        // ---
        let request = self
            .http
            .patch(self.url(&format!("/users/{id}/user-type")))
            .json(&UserTypeBody { user_type });
        let envelope: ApiResponse<User> = decode(Self::bearer(request, token).send().await?).await?;
        unwrap_envelope(envelope)
    }
}

// ---

fn check(response: Response) -> Result<Response, BackendError> {
    // ---
    match response.status() {
        StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
        status if !status.is_success() => Err(BackendError::ServerError(status)),
        _ => Ok(response),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    Ok(check(response)?.json::<T>().await?)
}

fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T, BackendError> {
    // ---
    match envelope {
        ApiResponse {
            success: true,
            data: Some(data),
            ..
        } => Ok(data),
        ApiResponse { error, message, .. } => Err(BackendError::Api(
            error.filter(|e| !e.is_empty()).unwrap_or(message),
        )),
    }
}
