//! Login, registration, logout and the current session with its
//! permission map.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::error::ApiError;
use crate::models::{LoginCredentials, RegisterRequest, UserInfo};
use crate::policy::{can, Action, Role};
use crate::store::Session;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/session", get(current))
        .route("/session/login", post(login))
        .route("/session/register", post(register))
        .route("/session/logout", post(logout))
}

#[derive(Debug, Serialize)]
struct SessionView {
    authenticated: bool,
    user: Option<UserInfo>,
    role: Option<Role>,
    permissions: HashMap<Action, bool>,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        // ---
        let role = session.role();
        Self {
            authenticated: session.is_authenticated(),
            permissions: Action::ALL.iter().map(|&a| (a, can(a, role))).collect(),
            user: session.user,
            role,
        }
    }
}

async fn current(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.store.session().await?.into()))
}

async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<LoginCredentials>,
) -> Result<Json<SessionView>, ApiError> {
    // ---
    tracing::info!("POST /session/login for {}", credentials.email);

    let response = match state.backend.login(&credentials).await {
        Ok(response) => response,
        Err(e) if e.is_unauthorized() => {
            return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid credentials"));
        }
        Err(e) => return Err(e.into()),
    };
    state.store.save_session(&response).await?;

    if let Some(profile) = state.restore_active_profile().await {
        tracing::info!("Restored active profile '{}' after login", profile.name);
    }

    Ok(Json(state.store.session().await?.into()))
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    // ---
    if Role::parse(&request.user_type).is_none() {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Unknown user type '{}'", request.user_type),
        ));
    }

    tracing::info!("POST /session/register for {}", request.email);
    let created = state.backend.register(&request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn logout(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    // ---
    state.logout().await?;
    tracing::info!("POST /session/logout");
    Ok(StatusCode::NO_CONTENT)
}
