use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::capture::DEFAULT_DELAY_SECS;
use crate::geometry::DEFAULT_MARGIN;
use crate::paths::get_config_dir;
use crate::shortcuts::{Action, Keymap};
use crate::toast::DEFAULT_TOAST_DURATION;
use crate::types::{DEFAULT_WINDOW_SIZE, WINDOW_SIZE_MIN};

/// Startup configuration. Read once; the viewer never writes it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerSettings {
    pub window_margin: f64,
    pub capture_delay_secs: u32,
    pub toast_duration_ms: u64,
    pub initial_window_size: f64,
    pub shortcuts_enabled: bool,
    /// Key name -> action, applied over the default table.
    pub keymap: HashMap<String, Action>,
    pub log_filter: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            window_margin: DEFAULT_MARGIN,
            capture_delay_secs: DEFAULT_DELAY_SECS,
            toast_duration_ms: DEFAULT_TOAST_DURATION.as_millis() as u64,
            initial_window_size: DEFAULT_WINDOW_SIZE,
            shortcuts_enabled: true,
            keymap: HashMap::new(),
            log_filter: "info".to_string(),
        }
    }
}

impl ViewerSettings {
    /// Clamps values into ranges the viewer can use.
    pub fn sanitized(mut self) -> Self {
        if !self.window_margin.is_finite() || self.window_margin < 0.0 {
            self.window_margin = DEFAULT_MARGIN;
        }
        self.capture_delay_secs = self.capture_delay_secs.max(1);
        if !self.initial_window_size.is_finite() {
            self.initial_window_size = DEFAULT_WINDOW_SIZE;
        }
        self.initial_window_size = self.initial_window_size.max(WINDOW_SIZE_MIN);
        self
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn keymap(&self) -> Keymap {
        Keymap::with_overrides(&self.keymap)
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub fn get_settings_path() -> PathBuf {
    get_config_dir().join("settings.json")
}

/// Loads settings, falling back to defaults when the file is missing or invalid.
pub fn load_settings() -> ViewerSettings {
    let path = get_settings_path();

    if !path.exists() {
        return ViewerSettings::default();
    }

    match load_settings_from_file(&path) {
        Ok(settings) => {
            tracing::info!(target: "system", "Settings loaded from {:?}", path);
            settings
        }
        Err(e) => {
            tracing::warn!(target: "system", "Failed to load settings: {}, using defaults", e);
            ViewerSettings::default()
        }
    }
}

pub fn load_settings_from_file(path: &Path) -> Result<ViewerSettings, SettingsError> {
    let contents = std::fs::read_to_string(path)?;
    let settings: ViewerSettings = serde_json::from_str(&contents)?;
    Ok(settings.sanitized())
}
