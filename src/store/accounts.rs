//! User accounts and sign-in sessions.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::UserAccount;

/// A user row together with its password material.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: UserAccount,
    pub password_hash: String,
    pub password_salt: String,
}

/// Account and session persistence.
#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the account for `email`, or replace its password and name if it exists.
    pub async fn upsert_user(
        &self,
        email: &str,
        display_name: Option<&str>,
        password_hash: &str,
        password_salt: &str,
    ) -> Result<UserAccount, AppError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO users (id, email, display_name, password_hash, password_salt, created_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(email) DO UPDATE SET
                   display_name = excluded.display_name,
                   password_hash = excluded.password_hash,
                   password_salt = excluded.password_salt"#,
        )
        .bind(&id)
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .bind(password_salt)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_credentials(email)
            .await?
            .map(|c| c.user)
            .ok_or_else(|| AppError::Internal(format!("User {} vanished after upsert", email)))
    }

    pub async fn find_credentials(&self, email: &str) -> Result<Option<StoredCredentials>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, display_name, created_at, password_hash, password_salt FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| StoredCredentials {
            user: user_from_row(&row),
            password_hash: row.get("password_hash"),
            password_salt: row.get("password_salt"),
        }))
    }

    pub async fn create_session(
        &self,
        token: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(token)
            .bind(user_id)
            .bind(session_time(Utc::now()))
            .bind(session_time(expires_at))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The user owning an unexpired session token.
    pub async fn session_user(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserAccount>, AppError> {
        let row = sqlx::query(
            r#"SELECT u.id, u.email, u.display_name, u.created_at, s.expires_at
               FROM sessions s JOIN users u ON u.id = s.user_id
               WHERE s.token = ?"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: String = row.get("expires_at");
        let live = DateTime::parse_from_rfc3339(&expires_at)
            .map(|t| t.with_timezone(&Utc) > now)
            .unwrap_or(false);

        Ok(live.then(|| user_from_row(&row)))
    }

    /// Remove a session. Returns whether it existed.
    pub async fn delete_session(&self, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(session_time(now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Fixed-width so that session times compare correctly as text.
fn session_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn user_from_row(row: &SqliteRow) -> UserAccount {
    let created_at: String = row.get("created_at");
    UserAccount {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default(),
    }
}
