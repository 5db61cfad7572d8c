use std::path::Path;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::storage::StorageConfig;

/// Environment variable that overrides `api.base_url`.
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";

/// Origin and prefix used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://damayanti-api.vercel.app/api";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0. Every section falls back to its defaults.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigV1 {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Where the REST API lives.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    /// The configured base URL without a trailing slash, so paths like
    /// `/students` can be appended directly.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Routes the session store navigates to when the user is signed out.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Target of an explicit logout.
    pub login_route: String,
    /// Target when a persisted token turns out to be expired or unreadable.
    pub expired_route: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            login_route: "/login".to_string(),
            expired_route: "/login".to_string(),
        }
    }
}

/// Layers the YAML file at `path` (if it exists) and the `API_BASE_URL`
/// environment override on top of the built-in defaults.
pub fn build_figment(path: impl AsRef<Path>) -> Figment {
    Figment::from(Serialized::default("version", "1.0.0"))
        .merge(Yaml::file(path.as_ref()))
        .merge(
            Env::raw()
                .only(&[API_BASE_URL_ENV])
                .map(|_| "api.base_url".into()),
        )
}

/// Extracts a `ConfigV1` from an already assembled figment.
pub fn extract_config(figment: &Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
    // handle configuration migration between versions here when necessary
}

/// Load config from the YAML file at `path`, falling back to defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigV1, figment::Error> {
    extract_config(&build_figment(path))
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
