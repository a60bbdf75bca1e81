//! SMIIVERN dashboard session service.
//!
//! Holds the authenticated session and the active plant profile, polls the
//! backend for sensor readings, derives per-parameter status and alerts,
//! generates historical reports and exposes all of it over a local JSON API.

pub mod backend;
pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod poller;
pub mod policy;
pub mod ranges;
pub mod report;
pub mod routes;
pub mod schema;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::AppState;

// Routes and the core modules import these through the crate root so they do
// not depend on where the wire types live.
pub use models::{RangeProfile, Reading};
