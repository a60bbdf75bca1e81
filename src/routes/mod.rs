use axum::Router;

use crate::AppState;

mod dashboard;
mod error;
mod health;
mod profiles;
mod reports;
mod session;
mod theme;
mod users;

// ---

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(session::router())
        .merge(theme::router())
        .merge(dashboard::router())
        .merge(profiles::router())
        .merge(reports::router())
        .merge(users::router())
        .merge(health::router())
        .with_state(state)
}
