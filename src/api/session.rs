//! Session API endpoints.

use axum::{body::Bytes, extract::State};
use chrono::SecondsFormat;

use super::{success, ApiResult};
use crate::models::{Account, LoginRequest, SessionInfo};
use crate::AppState;

/// POST /api/session - Sign in and make sure the slide documents exist.
///
/// The body is optional; missing fields use the configured account.
pub async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult<SessionInfo> {
    let request: LoginRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LoginRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };

    let account = Account {
        name: non_blank(request.name).unwrap_or_else(|| state.config.account_name.clone()),
        username: non_blank(request.username)
            .unwrap_or_else(|| state.config.account_username.clone()),
    };

    let account = state.identity.login(account).await;
    // Cached state belongs to the previous session
    state.library.clear_cache().await;
    let created = state.library.initialize().await?;

    tracing::info!(username = %account.username, store_created = created, "Signed in");
    let mut info = session_info(&state).await;
    info.store_created = Some(created);
    success(info)
}

/// GET /api/session - Report the signed-in account, if any.
pub async fn get_session(State(state): State<AppState>) -> ApiResult<SessionInfo> {
    success(session_info(&state).await)
}

/// DELETE /api/session - Sign out and drop both caches.
pub async fn logout(State(state): State<AppState>) -> ApiResult<SessionInfo> {
    state.identity.logout().await;
    state.library.clear_cache().await;
    success(session_info(&state).await)
}

async fn session_info(state: &AppState) -> SessionInfo {
    SessionInfo {
        logged_in: state.identity.is_logged_in().await,
        account: state.identity.account().await,
        expires_at: state
            .identity
            .expires_at()
            .await
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        store_created: None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
