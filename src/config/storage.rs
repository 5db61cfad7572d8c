use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where persisted client state (the access token, the theme mode) lives.
/// Backends are told apart by a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum StorageConfig {
    /// Kept in memory; lost when the process exits.
    #[serde(rename = "memory")]
    Memory,
    /// A JSON object on disk, durable across runs.
    #[serde(rename = "file")]
    File { path: PathBuf },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            path: PathBuf::from("./.damayanti/storage.json"),
        }
    }
}
