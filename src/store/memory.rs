//! In-memory drive with call counters and failure injection, for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use super::{FolderStatus, RemoteStore};
use crate::errors::AppError;

#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, Value>>,
    folders: Mutex<HashSet<String>>,
    failing_writes: Mutex<HashSet<String>>,
    failing_reads: Mutex<HashSet<String>>,
    read_delay: Mutex<Option<Duration>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, document: Value) {
        self.files.lock().unwrap().insert(path.to_string(), document);
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn fail_writes_to(&self, path: &str) {
        self.failing_writes.lock().unwrap().insert(path.to_string());
    }

    pub fn fail_reads_of(&self, path: &str) {
        self.failing_reads.lock().unwrap().insert(path.to_string());
    }

    pub fn heal(&self) {
        self.failing_writes.lock().unwrap().clear();
        self.failing_reads.lock().unwrap().clear();
    }

    pub fn delay_reads(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl RemoteStore for MemoryStore {
    async fn read_document(&self, path: &str) -> Result<Value, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_reads.lock().unwrap().contains(path) {
            return Err(AppError::Network(format!("read of {} failed", path)));
        }
        self.get(path)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", path)))
    }

    async fn write_document(&self, path: &str, document: &Value) -> Result<(), AppError> {
        if self.failing_writes.lock().unwrap().contains(path) {
            return Err(AppError::Network(format!("write of {} failed", path)));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert(path, document.clone());
        Ok(())
    }

    async fn ensure_folder(&self, name: &str) -> Result<FolderStatus, AppError> {
        if self.folders.lock().unwrap().insert(name.to_string()) {
            Ok(FolderStatus::Created)
        } else {
            Ok(FolderStatus::AlreadyExists)
        }
    }

    async fn document_exists(&self, path: &str) -> Result<bool, AppError> {
        Ok(self.files.lock().unwrap().contains_key(path))
    }
}
