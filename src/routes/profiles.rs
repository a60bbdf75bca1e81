//! Plant profile management and active profile selection.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::error::{authorize, ApiError};
use crate::dashboard::DashboardSnapshot;
use crate::models::{DraftMode, ProfileDraft};
use crate::policy::Action;
use crate::{AppState, RangeProfile};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/profiles", get(list).post(create))
        .route("/profiles/stats", get(stats))
        .route("/profiles/active", put(select_active))
        .route(
            "/profiles/{id}",
            get(fetch).patch(update).delete(remove),
        )
        .route("/profiles/{id}/deactivate", post(deactivate))
        .route("/profiles/{id}/reactivate", post(reactivate))
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    id: Option<i64>,
}

fn validated(draft: &ProfileDraft, mode: DraftMode) -> Result<(), ApiError> {
    // ---
    draft.validate(mode).map_err(|e| {
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Invalid profile").with_details(e.0)
    })
}

async fn list(State(state): State<AppState>) -> Json<Vec<RangeProfile>> {
    Json(state.load_profiles().await)
}

async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RangeProfile>, ApiError> {
    // ---
    let (_, token) = authorize(&state, Action::ViewDashboard).await?;
    Ok(Json(state.backend.get_profile(&token, id).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(draft): Json<ProfileDraft>,
) -> Result<(StatusCode, Json<RangeProfile>), ApiError> {
    // ---
    let (_, token) = authorize(&state, Action::ManageProfiles).await?;
    validated(&draft, DraftMode::Create)?;

    let profile = state.backend.create_profile(&token, &draft).await?;
    tracing::info!("Profile '{}' created with id {}", profile.name, profile.id);
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(draft): Json<ProfileDraft>,
) -> Result<Json<RangeProfile>, ApiError> {
    // ---
    let (_, token) = authorize(&state, Action::ManageProfiles).await?;
    // Bounds the edit leaves out still constrain the ones it sets
    let current = state.backend.get_profile(&token, id).await?;
    validated(&draft.over(&current), DraftMode::Update)?;

    let profile = state.backend.update_profile(&token, id, &draft).await?;
    state.profile_updated(&profile).await?;
    tracing::info!("Profile {} updated", id);
    Ok(Json(profile))
}

async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RangeProfile>, ApiError> {
    // ---
    let (_, token) = authorize(&state, Action::ManageProfiles).await?;
    let profile = state.backend.deactivate_profile(&token, id).await?;
    state.profile_updated(&profile).await?;
    tracing::info!("Profile {} deactivated", id);
    Ok(Json(profile))
}

async fn reactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RangeProfile>, ApiError> {
    // ---
    let (_, token) = authorize(&state, Action::ManageProfiles).await?;
    let profile = state.backend.reactivate_profile(&token, id).await?;
    tracing::info!("Profile {} reactivated", id);
    Ok(Json(profile))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, ApiError> {
    // ---
    let (_, token) = authorize(&state, Action::ManageProfiles).await?;
    state.backend.delete_profile(&token, id).await?;
    state.profile_removed(id).await?;
    tracing::info!("Profile {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    // ---
    let (_, token) = authorize(&state, Action::ManageProfiles).await?;
    Ok(Json(state.backend.profile_stats(&token).await?))
}

async fn select_active(
    State(state): State<AppState>,
    Json(body): Json<SelectBody>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    // ---
    authorize(&state, Action::SelectProfile).await?;
    state.select_profile(body.id).await?;
    Ok(Json(state.dashboard.read().await.snapshot()))
}
