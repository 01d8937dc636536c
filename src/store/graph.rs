//! Drive reached over HTTP using Graph drive item addressing.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};

use super::{FolderStatus, RemoteStore};
use crate::auth::Identity;
use crate::errors::AppError;

/// HTTP drive client authenticated with the identity's bearer token.
pub struct GraphDrive {
    client: Client,
    base_url: Url,
    identity: Arc<Identity>,
}

impl GraphDrive {
    pub fn new(base_url: &str, timeout_secs: u64, identity: Arc<Identity>) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Validation(format!("Invalid drive URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "Drive URL cannot be a base: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            identity,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/me/drive/root:/{path}` or `{base}/me/drive/root:/{path}:/{action}`.
    fn item_url(&self, path: &str, action: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["me", "drive", "root:"]);
            for (i, part) in parts.iter().enumerate() {
                if i + 1 == parts.len() && action.is_some() {
                    segments.push(&format!("{}:", part));
                } else {
                    segments.push(part);
                }
            }
            if let Some(action) = action {
                segments.push(action);
            }
        }
        url
    }

    fn children_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["me", "drive", "root", "children"]);
        }
        url
    }
}

/// Map a non-success drive status onto the error taxonomy.
fn status_error(status: StatusCode, what: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::Auth(format!("Drive rejected the access token ({})", status))
        }
        StatusCode::NOT_FOUND => AppError::NotFound(format!("{} not found", what)),
        s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
            AppError::Network(format!("Drive unavailable for {} ({})", what, s))
        }
        s => AppError::BadRequest(format!("Drive refused {} ({})", what, s)),
    }
}

impl RemoteStore for GraphDrive {
    async fn read_document(&self, path: &str) -> Result<Value, AppError> {
        let token = self.identity.access_token().await?;
        let response = self
            .client
            .get(self.item_url(path, Some("content")))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, path));
        }
        Ok(response.json().await?)
    }

    async fn write_document(&self, path: &str, document: &Value) -> Result<(), AppError> {
        let token = self.identity.access_token().await?;
        let response = self
            .client
            .put(self.item_url(path, Some("content")))
            .bearer_auth(token)
            .json(document)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, path));
        }
        tracing::debug!(path, %status, "Document uploaded");
        Ok(())
    }

    async fn ensure_folder(&self, name: &str) -> Result<FolderStatus, AppError> {
        let token = self.identity.access_token().await?;
        let response = self
            .client
            .post(self.children_url())
            .bearer_auth(token)
            .json(&json!({
                "name": name,
                "folder": {},
                "@microsoft.graph.conflictBehavior": "fail"
            }))
            .send()
            .await?;

        match response.status() {
            StatusCode::CONFLICT => Ok(FolderStatus::AlreadyExists),
            s if s.is_success() => {
                tracing::info!(folder = name, "Folder created");
                Ok(FolderStatus::Created)
            }
            s => Err(status_error(s, name)),
        }
    }

    async fn document_exists(&self, path: &str) -> Result<bool, AppError> {
        let token = self.identity.access_token().await?;
        let response = self
            .client
            .get(self.item_url(path, None))
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(status_error(s, path)),
        }
    }
}
