//! Email/password sign-in, sign-out and current-user lookup.

use chrono::{Duration, Utc};

use super::passwords::{hash_password, new_salt, verify_password};
use crate::errors::AppError;
use crate::models::{Session, UserAccount};
use crate::store::AccountStore;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Session-based authentication over the account store.
#[derive(Clone)]
pub struct AuthService {
    accounts: AccountStore,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(accounts: AccountStore, session_ttl_hours: i64) -> Result<Self, AppError> {
        let session_ttl = Duration::try_hours(session_ttl_hours)
            .filter(|ttl| *ttl >= Duration::zero())
            .ok_or_else(|| {
                AppError::Internal(format!("Invalid session TTL: {} hours", session_ttl_hours))
            })?;
        Ok(Self {
            accounts,
            session_ttl,
        })
    }

    /// Create the account, or reset its password if it already exists.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserAccount, AppError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let salt = new_salt();
        let hash = hash_password(password, &salt);
        self.accounts
            .upsert_user(&email, display_name, &hash, &salt)
            .await
    }

    /// Verify credentials and open a session.
    ///
    /// Failures are logged here and returned to the caller unchanged.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        match self.try_sign_in(email, password).await {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, "User signed in");
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(email = %normalize_email(email), "Sign-in failed: {}", e);
                Err(e)
            }
        }
    }

    async fn try_sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let credentials = self
            .accounts
            .find_credentials(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(
            password,
            &credentials.password_salt,
            &credentials.password_hash,
        ) {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = new_session_token();
        let expires_at = Utc::now()
            .checked_add_signed(self.session_ttl)
            .ok_or_else(|| AppError::Internal("Session expiry out of range".to_string()))?;
        self.accounts
            .create_session(&token, &credentials.user.id, expires_at)
            .await?;

        Ok(Session {
            token,
            expires_at,
            user: credentials.user,
        })
    }

    /// End a session. Signing out an unknown token is not an error.
    pub async fn sign_out(&self, token: &str) -> Result<(), AppError> {
        if self.accounts.delete_session(token).await? {
            tracing::info!("Session closed");
        }
        Ok(())
    }

    /// The user behind a session token, if the session is still live.
    pub async fn current_user(&self, token: &str) -> Result<Option<UserAccount>, AppError> {
        self.accounts.session_user(token, Utc::now()).await
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        self.accounts.purge_expired_sessions(Utc::now()).await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn new_session_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}
