//! Application entry point for the `smiivern` dashboard service.
//!
//! This binary orchestrates the full startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Opening the SQLite store that persists the client state
//! - Creating the state schema if it does not exist
//! - Restoring the stored session's active plant profile
//! - Starting the reading poller
//! - Mounting all API routes via the `routes` gateway and serving them
//!
//! # Environment Variables
//! - `SMIIVERN_API_URL` (**required**) – backend base URL
//! - `STATE_DB_URL` (optional) – state database (default: `sqlite://smiivern.db?mode=rwc`)
//! - `SMIIVERN_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `SMIIVERN_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the remaining options.
use std::{env, io::IsTerminal, net::SocketAddr};

use anyhow::{Context, Result};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use smiivern::backend::BackendClient;
use smiivern::poller::PollHandle;
use smiivern::store::StateStore;
use smiivern::{config, routes, schema, AppState};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Opening state database: {}", config::mask_credentials(&cfg.db_url));

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .with_context(|| format!("Failed to open state database '{}'", cfg.db_url))?;

    schema::create_schema(&pool).await?;

    let backend = BackendClient::new(&cfg.api_url).context("Failed to build HTTP client")?;
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.listen_port));
    let poll_interval = cfg.poll_interval;

    let state = AppState::new(cfg, backend, StateStore::new(pool));

    if let Some(profile) = state.restore_active_profile().await {
        tracing::info!("Restored active profile '{}'", profile.name);
    }

    let poll_state = state.clone();
    let poller = PollHandle::start(poll_interval, move || {
        let state = poll_state.clone();
        async move {
            state.poll_latest().await;
        }
    });

    let app = routes::router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(poller))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C, after the poller has been stopped.
async fn shutdown_signal(poller: PollHandle) {
    // ---
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
    }
    tracing::info!("Shutdown requested, stopping poller");
    poller.stop().await;
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `SMIIVERN_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `SMIIVERN_LOG_LEVEL` env var
///
/// Call once at startup, before any logging macro runs.
fn init_tracing() {
    // ---
    let span_events = match env::var("SMIIVERN_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // RUST_LOG wins over SMIIVERN_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("SMIIVERN_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
