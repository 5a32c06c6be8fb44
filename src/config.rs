//! Instance configuration, stored as JSON.

use crate::error::NowPlayingError;
use crate::event_bus::{CHANNEL_CAPACITY, MAX_EVENT_CAPACITY};
use log::{debug, info, warn};
use np_remote::{DEFAULT_FRAMEWORK_PATH, FrameworkOptions, notifications};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides `framework_path` when set.
pub const FRAMEWORK_PATH_ENV: &str = "NOWPLAYING_FRAMEWORK_PATH";

const CONFIG_DIR: &str = "nowplaying";
const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NowPlayingConfig {
    /// Framework binary to resolve the entry points from
    pub framework_path: PathBuf,
    /// Notification names that trigger a refresh once auto update is on
    pub notifications: Vec<String>,
    /// Capacity of the update event channel
    pub event_capacity: usize,
    /// Issue one refresh while constructing the instance
    pub initial_update: bool,
}

impl Default for NowPlayingConfig {
    fn default() -> Self {
        Self {
            framework_path: PathBuf::from(DEFAULT_FRAMEWORK_PATH),
            notifications: notifications::defaults(),
            event_capacity: CHANNEL_CAPACITY,
            initial_update: true,
        }
    }
}

impl NowPlayingConfig {
    /// `<config dir>/nowplaying/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from config file, or return default if missing or malformed
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(NowPlayingError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, NowPlayingError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load-or-default from `path` with environment overrides applied.
    pub fn from_path(path: &Path) -> Self {
        Self::load(path).with_env_overrides()
    }

    /// `from_path` at `default_path()`. Defaults plus overrides when the
    /// platform has no config dir.
    pub fn from_default_location() -> Self {
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => Self::default().with_env_overrides(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), NowPlayingError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = env::var_os(FRAMEWORK_PATH_ENV).filter(|p| !p.is_empty()) {
            self.framework_path = PathBuf::from(path);
            debug!("Framework path from {}", FRAMEWORK_PATH_ENV);
        }
        self
    }

    pub fn validate(&self) -> Result<(), NowPlayingError> {
        if self.framework_path.as_os_str().is_empty() {
            return Err(NowPlayingError::Config("framework_path is empty".into()));
        }
        if self.event_capacity == 0 {
            return Err(NowPlayingError::Config(
                "event_capacity must be at least 1".into(),
            ));
        }
        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(NowPlayingError::Config(format!(
                "event_capacity must be at most {}",
                MAX_EVENT_CAPACITY
            )));
        }
        if self.notifications.iter().any(|n| n.is_empty()) {
            return Err(NowPlayingError::Config(
                "notification names must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn framework_options(&self) -> FrameworkOptions {
        FrameworkOptions {
            path: self.framework_path.clone(),
            notifications: self.notifications.clone(),
        }
    }
}
