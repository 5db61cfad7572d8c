//! Light/dark preference, persisted under the `mode` key.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::storage::{Storage, THEME_MODE_KEY};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(format!("Unknown theme mode '{}'", other)),
        }
    }
}

/// Observable theme preference.
pub struct ThemeStore {
    mode: watch::Sender<ThemeMode>,
    storage: Arc<dyn Storage>,
}

impl ThemeStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let (mode, _) = watch::channel(ThemeMode::default());
        ThemeStore { mode, storage }
    }

    /// Restores the saved mode, or follows the system preference when
    /// nothing usable is saved. The result is persisted.
    pub async fn init(&self, system_prefers_dark: bool) -> ThemeMode {
        let saved = match self.storage.get(THEME_MODE_KEY).await {
            Ok(saved) => saved,
            Err(e) => {
                error!("Failed to read theme mode: {}", e);
                None
            }
        };
        let mode = match saved.as_deref().map(ThemeMode::from_str) {
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                warn!("Ignoring saved theme: {}", e);
                Self::system_default(system_prefers_dark)
            }
            None => Self::system_default(system_prefers_dark),
        };
        self.set_mode(mode).await;
        mode
    }

    pub fn mode(&self) -> ThemeMode {
        *self.mode.borrow()
    }

    pub fn is_dark(&self) -> bool {
        self.mode() == ThemeMode::Dark
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeMode> {
        self.mode.subscribe()
    }

    pub async fn toggle(&self) -> ThemeMode {
        let mode = self.mode().toggled();
        self.set_mode(mode).await;
        mode
    }

    pub async fn set_mode(&self, mode: ThemeMode) {
        debug!("Applying theme mode {}", mode);
        self.mode.send_replace(mode);
        if let Err(e) = self.storage.set(THEME_MODE_KEY, mode.as_str()).await {
            error!("Failed to persist theme mode: {}", e);
        }
    }

    fn system_default(prefers_dark: bool) -> ThemeMode {
        if prefers_dark {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }
}
