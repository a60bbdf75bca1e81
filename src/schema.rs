//! Database schema management for the persisted client state.
//!
//! Ensures the key/value table exists before anything reads it.
//! Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::SqlitePool;

// ---

/// Create the `client_state` table (idempotent).
///
/// Safe to call on every startup; no-op if the table already exists.
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Session token, user info, active profile id and theme live here
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS client_state (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
