//! Drive backed by a directory on the local file system.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use super::{FolderStatus, RemoteStore};
use crate::auth::Identity;
use crate::errors::AppError;

/// A drive rooted at a local directory.
///
/// Every call requires a valid access token, mirroring the cloud drive.
pub struct LocalDrive {
    root: PathBuf,
    identity: Arc<Identity>,
}

impl LocalDrive {
    pub fn new(root: &Path, identity: Arc<Identity>) -> Self {
        Self {
            root: root.to_path_buf(),
            identity,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a drive path onto the root, rejecting anything that escapes it.
    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || relative.as_os_str().is_empty() {
            return Err(AppError::Validation(format!("Invalid drive path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

impl RemoteStore for LocalDrive {
    async fn read_document(&self, path: &str) -> Result<Value, AppError> {
        self.identity.access_token().await?;
        let file = self.resolve(path)?;

        let bytes = tokio::fs::read(&file).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(format!("Document {} not found", path)),
            _ => AppError::from(e),
        })?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::BadRequest(format!("Document {} is not valid JSON: {}", path, e)))
    }

    async fn write_document(&self, path: &str, document: &Value) -> Result<(), AppError> {
        self.identity.access_token().await?;
        let file = self.resolve(path)?;

        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write beside the target and rename so readers never see a torn file
        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = file.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &file).await {
            tokio::fs::remove_file(&tmp).await.ok();
            return Err(e.into());
        }

        tracing::debug!(path, bytes = bytes.len(), "Document written");
        Ok(())
    }

    async fn ensure_folder(&self, name: &str) -> Result<FolderStatus, AppError> {
        self.identity.access_token().await?;
        let dir = self.resolve(name)?;

        if tokio::fs::try_exists(&dir).await? {
            return Ok(FolderStatus::AlreadyExists);
        }
        tokio::fs::create_dir_all(&dir).await?;
        tracing::info!(folder = name, "Folder created");
        Ok(FolderStatus::Created)
    }

    async fn document_exists(&self, path: &str) -> Result<bool, AppError> {
        self.identity.access_token().await?;
        let file = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&file).await?)
    }
}
