//! User administration for the configuration screen.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::error::{authorize, ApiError};
use crate::models::User;
use crate::policy::{Action, Role};
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/users", get(list))
        .route("/users/{id}/toggle-status", post(toggle_status))
        .route("/users/{id}/type", put(update_type))
}

#[derive(Debug, Deserialize)]
struct UserTypeBody {
    #[serde(rename = "tipoUsuario")]
    user_type: String,
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    // ---
    let (_, token) = authorize(&state, Action::AccessConfiguration).await?;
    Ok(Json(state.backend.list_users(&token).await?))
}

async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    // ---
    let (_, token) = authorize(&state, Action::AccessConfiguration).await?;
    let user = state.backend.toggle_user_status(&token, id).await?;
    tracing::info!("User {} is now {}", id, if user.active { "active" } else { "inactive" });
    Ok(Json(user))
}

async fn update_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UserTypeBody>,
) -> Result<Json<User>, ApiError> {
    // ---
    let (_, token) = authorize(&state, Action::AccessConfiguration).await?;
    let Some(role) = Role::parse(&body.user_type) else {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Unknown user type '{}'", body.user_type),
        ));
    };

    let user = state.backend.update_user_type(&token, id, role.as_str()).await?;
    tracing::info!("User {} changed to {}", id, role.as_str());
    Ok(Json(user))
}
