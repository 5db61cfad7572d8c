use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use super::{file_storage::FileStorage, memory_storage::MemoryStorage};
use crate::config::StorageConfig;

/// Key holding the raw bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Key holding the theme preference ("light" or "dark").
pub const THEME_MODE_KEY: &str = "mode";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is not a JSON object: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable string key/value storage shared by the session and theme stores.
///
/// Reads and writes are not transactional. Removing a missing key is not an
/// error.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn is_durable(&self) -> bool {
        // Only the memory backend forgets everything on exit
        true
    }
}

/// Creates a concrete storage backend based on the StorageConfig.
pub fn create_storage(config: &StorageConfig) -> Arc<dyn Storage> {
    match config {
        StorageConfig::Memory => {
            info!("Using in-memory storage; the session will not survive a restart.");
            Arc::new(MemoryStorage::new())
        }
        StorageConfig::File { path } => {
            info!("Using file storage at {}", path.display());
            Arc::new(FileStorage::new(path.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_create_storage_picks_backend() {
        assert!(!create_storage(&StorageConfig::Memory).is_durable());
        let file = create_storage(&StorageConfig::File {
            path: PathBuf::from("unused.json"),
        });
        assert!(file.is_durable());
    }
}
