//! Dashboard snapshot, on-demand refresh and the irrigation switch.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::error::{authorize, ApiError};
use crate::dashboard::DashboardSnapshot;
use crate::policy::Action;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/dashboard", get(snapshot))
        .route("/dashboard/refresh", post(refresh))
        .route("/irrigation/toggle", post(toggle_irrigation))
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    /// False when the poll failed; the snapshot is then the previous one.
    updated: bool,
    #[serde(flatten)]
    dashboard: DashboardSnapshot,
}

#[derive(Debug, Serialize)]
struct IrrigationResponse {
    irrigation_active: bool,
}

async fn snapshot(State(state): State<AppState>) -> Result<Json<DashboardSnapshot>, ApiError> {
    // ---
    authorize(&state, Action::ViewDashboard).await?;
    Ok(Json(state.dashboard.read().await.snapshot()))
}

async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    // ---
    authorize(&state, Action::ViewDashboard).await?;
    let updated = state.poll_latest().await.is_some();
    Ok(Json(RefreshResponse {
        updated,
        dashboard: state.dashboard.read().await.snapshot(),
    }))
}

async fn toggle_irrigation(
    State(state): State<AppState>,
) -> Result<Json<IrrigationResponse>, ApiError> {
    // ---
    let (session, _) = authorize(&state, Action::ControlIrrigation).await?;
    let irrigation_active = state.dashboard.write().await.toggle_irrigation();

    let who = session.user.as_ref().map_or("unknown", |u| u.email.as_str());
    tracing::info!(
        "Irrigation {} by {}",
        if irrigation_active { "activated" } else { "deactivated" },
        who
    );
    Ok(Json(IrrigationResponse { irrigation_active }))
}
