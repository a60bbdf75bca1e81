use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::models::Theme;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/theme", get(current).put(set))
        .route("/theme/toggle", post(toggle))
}

#[derive(Debug, Serialize, Deserialize)]
struct ThemeBody {
    theme: Theme,
}

async fn current(State(state): State<AppState>) -> Result<Json<ThemeBody>, ApiError> {
    Ok(Json(ThemeBody {
        theme: state.store.theme().await?,
    }))
}

async fn set(
    State(state): State<AppState>,
    Json(body): Json<ThemeBody>,
) -> Result<Json<ThemeBody>, ApiError> {
    // ---
    state.store.set_theme(body.theme).await?;
    tracing::debug!("Theme set to {}", body.theme.as_str());
    Ok(Json(body))
}

async fn toggle(State(state): State<AppState>) -> Result<Json<ThemeBody>, ApiError> {
    // ---
    let theme = state.store.theme().await?.toggled();
    state.store.set_theme(theme).await?;
    tracing::debug!("Theme toggled to {}", theme.as_str());
    Ok(Json(ThemeBody { theme }))
}
