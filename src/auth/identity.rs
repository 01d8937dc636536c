//! Signed-in identity and access token for the drive.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Account;

#[derive(Debug, Clone)]
struct AuthSession {
    account: Account,
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Holds the active account and hands out its access token to the drive adapters.
#[derive(Debug)]
pub struct Identity {
    session: RwLock<Option<AuthSession>>,
    configured_token: Option<String>,
    token_ttl: Duration,
}

impl Identity {
    /// `configured_token` is used as the bearer token when present; otherwise
    /// each sign-in mints a fresh one.
    pub fn new(configured_token: Option<String>, token_ttl_secs: i64) -> Self {
        Self {
            session: RwLock::new(None),
            configured_token,
            token_ttl: Duration::seconds(token_ttl_secs.max(0)),
        }
    }

    pub async fn login(&self, account: Account) -> Account {
        let access_token = self
            .configured_token
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        let expires_at = Utc::now() + self.token_ttl;

        tracing::info!(username = %account.username, "Signed in");
        *self.session.write().await = Some(AuthSession {
            account: account.clone(),
            access_token,
            expires_at,
        });
        account
    }

    pub async fn logout(&self) {
        if let Some(session) = self.session.write().await.take() {
            tracing::info!(username = %session.account.username, "Signed out");
        }
    }

    pub async fn is_logged_in(&self) -> bool {
        self.access_token().await.is_ok()
    }

    pub async fn account(&self) -> Option<Account> {
        self.session.read().await.as_ref().map(|s| s.account.clone())
    }

    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.session.read().await.as_ref().map(|s| s.expires_at)
    }

    /// Current bearer token, or `AppError::Auth` when signed out or expired.
    pub async fn access_token(&self) -> Result<String, AppError> {
        let guard = self.session.read().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| AppError::Auth("Not signed in".to_string()))?;

        if Utc::now() >= session.expires_at {
            return Err(AppError::Auth(
                "Access token expired, please sign in again".to_string(),
            ));
        }

        Ok(session.access_token.clone())
    }
}
