use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{Storage, StorageError};

/// Stores all entries as one flat JSON object in a file.
///
/// A missing file reads as empty. The whole file is rewritten on every change,
/// through a sibling temp file that is renamed into place. A file that no
/// longer parses is reported by `get` and replaced by the next `set` or
/// `remove`.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&raw).map_err(|source| StorageError::Format {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Entries to start a read-modify-write cycle from, and whether the file
    /// was unreadable. A corrupt file is dropped so the token can still be
    /// stored or cleared.
    async fn entries_for_update(&self) -> Result<(BTreeMap<String, String>, bool), StorageError> {
        match self.read_entries().await {
            Ok(entries) => Ok((entries, false)),
            Err(e @ StorageError::Format { .. }) => {
                warn!("Discarding corrupt storage file: {}", e);
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let serialized = serde_json::to_vec_pretty(entries).map_err(|source| StorageError::Format {
            path: self.path.display().to_string(),
            source,
        })?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, serialized)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!("Wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let (mut entries, _) = self.entries_for_update().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let (mut entries, corrupt) = self.entries_for_update().await?;
        if entries.remove(key).is_none() && !corrupt {
            return Ok(());
        }
        self.write_entries(&entries).await
    }
}
