//! Signed-in account model.

use serde::{Deserialize, Serialize};

/// The account returned by sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub username: String,
}

/// Request body for signing in. Missing fields fall back to the configured account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Session information reported to the taskpane.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// Whether sign-in had to create slides.json / tags.json
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_created: Option<bool>,
}
