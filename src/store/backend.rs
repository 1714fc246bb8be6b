// SPDX-License-Identifier: PMPL-1.0-or-later
//! Storage backends holding the serialized report collection

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;

/// A single keyed slot holding the whole serialized collection
///
/// Backends are replaced wholesale on every write; there is no append or
/// partial update.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Acquire whatever the backend needs before first use
    async fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Current payload, `None` if nothing has been stored yet
    async fn read(&self) -> Result<Option<String>>;

    /// Replace the payload
    async fn write(&self, payload: &str) -> Result<()>;

    /// Drop the payload entirely
    async fn remove(&self) -> Result<()>;

    /// Release resources; the backend is not used afterwards
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: StorageBackend + ?Sized> StorageBackend for Box<T> {
    async fn open(&mut self) -> Result<()> {
        (**self).open().await
    }

    async fn read(&self) -> Result<Option<String>> {
        (**self).read().await
    }

    async fn write(&self, payload: &str) -> Result<()> {
        (**self).write(payload).await
    }

    async fn remove(&self) -> Result<()> {
        (**self).remove().await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}

/// In-process backend, for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self) -> Result<Option<String>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn write(&self, payload: &str) -> Result<()> {
        *self.slot.lock().await = Some(payload.to_string());
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        *self.slot.lock().await = None;
        Ok(())
    }
}

/// Backend storing the collection as one JSON file
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.accessscan/reports.json`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".accessscan").join("reports.json")
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn open(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        debug!(path = %self.path.display(), "Opened file store");
        Ok(())
    }

    async fn read(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, payload: &str) -> Result<()> {
        tokio::fs::write(&self.path, payload).await?;
        debug!(path = %self.path.display(), bytes = payload.len(), "Wrote report collection");
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
