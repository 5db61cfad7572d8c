#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use damayanti_client::config::{ApiConfig, ConfigV1, SessionConfig, StorageConfig};
use damayanti_client::session::Navigator;
use damayanti_client::startup::{build_state, start};
use damayanti_client::state::AppState;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// A signed JWT whose `exp` lies `expires_in` seconds from now.
pub fn mint_token(expires_in: i64) -> String {
    let claims = Claims {
        sub: "guru@school.id".to_string(),
        exp: Utc::now().timestamp() + expires_in,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"damayanti-test"),
    )
    .expect("JWT should encode")
}

/// Navigator that remembers every route it was asked to visit.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Routes visited so far, oldest first.
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

pub fn test_config(base_url: &str, storage: StorageConfig) -> ConfigV1 {
    ConfigV1 {
        api: ApiConfig {
            base_url: base_url.to_string(),
        },
        storage,
        session: SessionConfig::default(),
        ..Default::default()
    }
}

pub fn file_storage(path: &Path) -> StorageConfig {
    StorageConfig::File {
        path: path.to_path_buf(),
    }
}

/// State that has not been initialized yet.
pub fn build_app(config: ConfigV1) -> (AppState, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::default());
    let state = build_state(Arc::new(config), navigator.clone()).expect("state should build");
    (state, navigator)
}

/// State whose session store has already restored from storage.
pub async fn start_app(config: ConfigV1) -> (AppState, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::default());
    let state = start(Arc::new(config), navigator.clone())
        .await
        .expect("state should start");
    (state, navigator)
}
