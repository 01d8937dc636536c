//! Remote store module.
//!
//! The drive is the source of truth: two whole-file JSON documents in one
//! application folder, read and written in full with no partial updates.

mod graph;
mod local;
#[cfg(test)]
pub mod memory;

pub use graph::*;
pub use local::*;

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::auth::Identity;
use crate::config::{Config, DriveKind};
use crate::errors::AppError;

/// File name of the slide list document.
pub const SLIDES_FILE: &str = "slides.json";
/// File name of the tag index document.
pub const TAGS_FILE: &str = "tags.json";

/// Outcome of [`RemoteStore::ensure_folder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderStatus {
    Created,
    AlreadyExists,
}

/// Whole-document access to the drive.
pub trait RemoteStore: Send + Sync {
    /// Read a whole document. `NotFound` when the path does not exist.
    fn read_document(&self, path: &str) -> impl Future<Output = Result<Value, AppError>> + Send;

    /// Replace the whole document at `path`.
    fn write_document(
        &self,
        path: &str,
        document: &Value,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn ensure_folder(&self, name: &str)
        -> impl Future<Output = Result<FolderStatus, AppError>> + Send;

    /// `false` for a missing document; any other failure propagates.
    fn document_exists(&self, path: &str) -> impl Future<Output = Result<bool, AppError>> + Send;
}

/// Read and decode a typed document.
pub async fn read_json<T, S>(store: &S, path: &str) -> Result<T, AppError>
where
    T: DeserializeOwned,
    S: RemoteStore,
{
    let value = store.read_document(path).await?;
    serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Malformed document {}: {}", path, e)))
}

/// Encode and write a typed document.
pub async fn write_json<T, S>(store: &S, path: &str, document: &T) -> Result<(), AppError>
where
    T: Serialize,
    S: RemoteStore,
{
    let value = serde_json::to_value(document)?;
    store.write_document(path, &value).await
}

/// Well-known paths of the two documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub folder: String,
    pub slides_path: String,
    pub tags_path: String,
}

impl StoreLayout {
    pub fn new(folder: &str) -> Self {
        let folder = folder.trim_matches('/').to_string();
        Self {
            slides_path: format!("{}/{}", folder, SLIDES_FILE),
            tags_path: format!("{}/{}", folder, TAGS_FILE),
            folder,
        }
    }
}

/// The configured drive adapter.
pub enum Drive {
    Local(LocalDrive),
    Graph(GraphDrive),
}

impl Drive {
    pub fn from_config(config: &Config, identity: Arc<Identity>) -> Result<Self, AppError> {
        match config.drive {
            DriveKind::Local => Ok(Drive::Local(LocalDrive::new(&config.drive_root, identity))),
            DriveKind::Graph => Ok(Drive::Graph(GraphDrive::new(
                &config.graph_url,
                config.http_timeout_secs,
                identity,
            )?)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Drive::Local(drive) => format!("local drive at {:?}", drive.root()),
            Drive::Graph(drive) => format!("graph drive at {}", drive.base_url()),
        }
    }
}

impl RemoteStore for Drive {
    async fn read_document(&self, path: &str) -> Result<Value, AppError> {
        match self {
            Drive::Local(drive) => drive.read_document(path).await,
            Drive::Graph(drive) => drive.read_document(path).await,
        }
    }

    async fn write_document(&self, path: &str, document: &Value) -> Result<(), AppError> {
        match self {
            Drive::Local(drive) => drive.write_document(path, document).await,
            Drive::Graph(drive) => drive.write_document(path, document).await,
        }
    }

    async fn ensure_folder(&self, name: &str) -> Result<FolderStatus, AppError> {
        match self {
            Drive::Local(drive) => drive.ensure_folder(name).await,
            Drive::Graph(drive) => drive.ensure_folder(name).await,
        }
    }

    async fn document_exists(&self, path: &str) -> Result<bool, AppError> {
        match self {
            Drive::Local(drive) => drive.document_exists(path).await,
            Drive::Graph(drive) => drive.document_exists(path).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = StoreLayout::new("/myapp/");
        assert_eq!(layout.folder, "myapp");
        assert_eq!(layout.slides_path, "myapp/slides.json");
        assert_eq!(layout.tags_path, "myapp/tags.json");
    }
}
