//! Config Store Port
//!
//! Abstract key/value store used to keep the copy-trade configuration
//! durable across restarts, plus a JSON-file implementation with atomic
//! write-then-rename.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Failed to read store file: {0}")]
    ReadError(String),
    #[error("Failed to write store file: {0}")]
    WriteError(String),
    #[error("Store file is corrupted: {0}")]
    CorruptedFile(String),
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch a value, or None when the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<String>, ConfigStoreError>;

    /// Insert or replace a value.
    async fn upsert(&self, key: &str, value: &str) -> Result<(), ConfigStoreError>;
}

/// JSON-file backed store. One flat object of string keys to string values.
pub struct FileConfigStore {
    path: PathBuf,
    state: tokio::sync::Mutex<()>,
}

impl FileConfigStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: tokio::sync::Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<serde_json::Map<String, serde_json::Value>, ConfigStoreError> {
        if !self.path.exists() {
            return Ok(serde_json::Map::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| ConfigStoreError::ReadError(e.to_string()))?;
        if content.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| ConfigStoreError::CorruptedFile(e.to_string()))
    }

    fn write_all(
        &self,
        map: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), ConfigStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigStoreError::WriteError(e.to_string()))?;
            }
        }
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| ConfigStoreError::WriteError(e.to_string()))?;

        // Write to a sibling temp file first so a crash mid-write never
        // corrupts the live store.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content)
            .map_err(|e| ConfigStoreError::WriteError(e.to_string()))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| ConfigStoreError::WriteError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ConfigStoreError> {
        let _guard = self.state.lock().await;
        let map = self.read_all()?;
        Ok(map.get(key).and_then(|v| v.as_str().map(String::from)))
    }

    async fn upsert(&self, key: &str, value: &str) -> Result<(), ConfigStoreError> {
        let _guard = self.state.lock().await;
        let mut map = self.read_all()?;
        map.insert(key.to_string(), serde_json::Value::String(value.to_string()));
        self.write_all(&map)
    }
}
