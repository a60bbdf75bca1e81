//! Persisted client state.
//!
//! A small key/value table holding what survives a restart: the session
//! token and user, the active profile id and the theme.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::models::{LoginResponse, Theme, UserInfo};
use crate::policy::Role;

// ---

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_INFO_KEY: &str = "user_info";
pub const ACTIVE_PROFILE_KEY: &str = "perfil_activo_id";
pub const THEME_KEY: &str = "smiivern-theme";

/// The logged-in session, as far as this side knows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub token: Option<String>,
    pub user: Option<UserInfo>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Role of the logged-in user; `None` without a token.
    pub fn role(&self) -> Option<Role> {
        self.token.as_ref()?;
        self.user.as_ref()?.role()
    }
}

#[derive(Debug, Clone)]
pub struct StateStore {
    pool: SqlitePool,
}

impl StateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        // ---
        sqlx::query_scalar::<_, String>("SELECT value FROM client_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO client_state (key, value) VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), sqlx::Error> {
        // ---
        sqlx::query("DELETE FROM client_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- session

    /// Load token and user. A user record that no longer parses is dropped.
    pub async fn session(&self) -> Result<Session, sqlx::Error> {
        // ---
        let token = self.get(ACCESS_TOKEN_KEY).await?;
        let user = match self.get(USER_INFO_KEY).await? {
            Some(raw) => match serde_json::from_str::<UserInfo>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!("Discarding unreadable {}: {}", USER_INFO_KEY, e);
                    None
                }
            },
            None => None,
        };
        Ok(Session { token, user })
    }

    pub async fn save_session(&self, login: &LoginResponse) -> Result<(), sqlx::Error> {
        // ---
        let user = serde_json::to_string(&login.user)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let mut tx = self.pool.begin().await?;
        for (key, value) in [
            (ACCESS_TOKEN_KEY, login.access_token.as_str()),
            (USER_INFO_KEY, user.as_str()),
        ] {
            sqlx::query(
                r#"
                INSERT INTO client_state (key, value) VALUES (?, ?)
                ON CONFLICT (key) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!("Session stored for {}", login.user.email);
        Ok(())
    }

    /// Forget token and user info.
    pub async fn clear_auth(&self) -> Result<(), sqlx::Error> {
        // ---
        sqlx::query("DELETE FROM client_state WHERE key IN (?, ?)")
            .bind(ACCESS_TOKEN_KEY)
            .bind(USER_INFO_KEY)
            .execute(&self.pool)
            .await?;
        tracing::info!("Stored credentials cleared");
        Ok(())
    }

    // --- active profile

    /// Stored active profile id. A value that is not a number reads as none.
    pub async fn active_profile_id(&self) -> Result<Option<i64>, sqlx::Error> {
        // ---
        Ok(self
            .get(ACTIVE_PROFILE_KEY)
            .await?
            .and_then(|raw| raw.trim().parse::<i64>().ok()))
    }

    pub async fn set_active_profile_id(&self, id: Option<i64>) -> Result<(), sqlx::Error> {
        match id {
            Some(id) => self.set(ACTIVE_PROFILE_KEY, &id.to_string()).await,
            None => self.remove(ACTIVE_PROFILE_KEY).await,
        }
    }

    // --- theme

    pub async fn theme(&self) -> Result<Theme, sqlx::Error> {
        Ok(self
            .get(THEME_KEY)
            .await?
            .map(|raw| Theme::parse(&raw))
            .unwrap_or_default())
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), sqlx::Error> {
        self.set(THEME_KEY, theme.as_str()).await
    }
}
