//! Error responses and the session/permission guard shared by the handlers.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;

use crate::backend::BackendError;
use crate::policy::{can, Action};
use crate::state::SelectProfileError;
use crate::store::Session;
use crate::AppState;

// ---

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", e);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        let body = if self.details.is_empty() {
            json!({ "error": self.message })
        } else {
            json!({ "error": self.message, "details": self.details })
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        // ---
        match e {
            BackendError::Unauthorized => {
                ApiError::new(StatusCode::UNAUTHORIZED, "Session rejected by backend")
            }
            BackendError::ServerError(status) if status == StatusCode::NOT_FOUND => {
                ApiError::new(StatusCode::NOT_FOUND, "Not found")
            }
            other => {
                tracing::warn!("Backend call failed: {}", other);
                ApiError::new(StatusCode::BAD_GATEWAY, other.to_string())
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::internal(e)
    }
}

impl From<SelectProfileError> for ApiError {
    fn from(e: SelectProfileError) -> Self {
        // ---
        match e {
            SelectProfileError::Selection(e) => ApiError::new(StatusCode::CONFLICT, e.to_string()),
            SelectProfileError::Backend(e) => e.into(),
            SelectProfileError::Store(e) => e.into(),
            SelectProfileError::NoSession => ApiError::new(StatusCode::UNAUTHORIZED, "No session"),
        }
    }
}

/// Load the session and check it may perform `action`.
///
/// 401 without a session, 403 when the role does not allow the action.
pub async fn authorize(state: &AppState, action: Action) -> Result<(Session, String), ApiError> {
    // ---
    let session = state.store.session().await?;
    let Some(token) = session.token.clone() else {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "No session"));
    };
    if !can(action, session.role()) {
        tracing::debug!("{:?} denied for role {:?}", action, session.role());
        return Err(ApiError::new(StatusCode::FORBIDDEN, "Permission denied"));
    }
    Ok((session, token))
}
