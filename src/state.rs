//! Shared application state.
//!
//! Owned by the application root and cloned into whatever needs it; there is
//! no global session or client.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::config::ConfigV1;
use crate::resources::{ContainersApi, ReportsApi, SensorDataApi, StudentsApi};
use crate::session::SessionStore;
use crate::storage::Storage;
use crate::theme::ThemeStore;

/// Everything a front end needs to talk to the API.
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Persisted key/value storage shared by the stores.
    pub storage: Arc<dyn Storage>,
    /// Authentication state and token persistence.
    pub session: Arc<SessionStore>,
    /// Authenticated REST client reading its token from `session`.
    pub client: ApiClient,
    pub theme: Arc<ThemeStore>,
}

impl AppState {
    pub fn students(&self) -> StudentsApi {
        StudentsApi::new(self.client.clone())
    }

    pub fn containers(&self) -> ContainersApi {
        ContainersApi::new(self.client.clone())
    }

    pub fn sensor_data(&self) -> SensorDataApi {
        SensorDataApi::new(self.client.clone())
    }

    pub fn reports(&self) -> ReportsApi {
        ReportsApi::new(self.client.clone())
    }
}
