//! Application startup.
//!
//! Builds the storage backend, session store and API client from the
//! configuration, then restores any persisted session.

use std::sync::Arc;

use tracing::info;

use crate::client::ApiClient;
use crate::config::ConfigV1;
use crate::session::{Navigator, SessionStore};
use crate::state::AppState;
use crate::storage::create_storage;
use crate::theme::ThemeStore;

/// Wires up the application state without touching storage or the network.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn build_state(
    config: Arc<ConfigV1>,
    navigator: Arc<dyn Navigator>,
) -> Result<AppState, reqwest::Error> {
    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let storage = create_storage(&config.storage);
    let base_url = config.api.base_url().to_string();

    let session = Arc::new(SessionStore::new(
        storage.clone(),
        navigator,
        http.clone(),
        base_url.clone(),
        config.session.clone(),
    ));
    let client = ApiClient::new(http, base_url, session.clone());
    let theme = Arc::new(ThemeStore::new(storage.clone()));

    Ok(AppState {
        config,
        storage,
        session,
        client,
        theme,
    })
}

/// Builds the state and initializes the session store from storage.
pub async fn start(
    config: Arc<ConfigV1>,
    navigator: Arc<dyn Navigator>,
) -> Result<AppState, reqwest::Error> {
    let state = build_state(config, navigator)?;
    info!("Using API at {}", state.client.base_url());
    state.session.initialize().await;
    Ok(state)
}
