//! Settings persistence.
//!
//! One JSON document at a fixed path, replaced wholesale on save. A
//! missing or unreadable file falls back to the built-in defaults and is
//! never surfaced to the caller; a failed save is.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use visionmix_core::Settings;
use visionmix_protocol::{ServerMessage, ServerPayload};

/// Default settings path, relative to the working directory. Override
/// with `VISIONMIX_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "config/defaults.json";

/// Errors surfaced by [`ConfigStore::save`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Load/save of the settings document plus the in-memory cached copy.
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Settings>,
    events: broadcast::Sender<ServerMessage>,
}

impl ConfigStore {
    /// Reads the settings document from `path`, falling back to the
    /// defaults when the file is missing or unparseable.
    pub fn load(path: impl Into<PathBuf>, events: broadcast::Sender<ServerMessage>) -> Self {
        let path = path.into();
        let settings = read_settings(&path);

        Self {
            path,
            current: RwLock::new(settings),
            events,
        }
    }

    /// The path the document persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current in-memory settings.
    pub async fn current(&self) -> Settings {
        self.current.read().await.clone()
    }

    /// Replaces the whole document: writes it to disk, updates the
    /// cached copy, and broadcasts `config_updated`.
    pub async fn save(&self, settings: Settings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                    path: self.path.clone(),
                    source: e,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&self.path, json).map_err(|e| ConfigError::Write {
            path: self.path.clone(),
            source: e,
        })?;

        *self.current.write().await = settings.clone();
        info!(path = %self.path.display(), "Settings saved");

        let _ = self.events.send(ServerMessage::new(ServerPayload::ConfigUpdated {
            config: settings,
        }));

        Ok(())
    }
}

fn read_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(settings) => {
                info!(path = %path.display(), "Settings loaded from file");
                settings
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Settings file unparseable, using defaults"
                );
                Settings::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No settings file, using defaults");
            Settings::default()
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Settings file unreadable, using defaults"
            );
            Settings::default()
        }
    }
}
