//! Editor timing, layout and presence settings.
//!
//! Every field has a default, so a config file only lists what it changes.
//! Files are read as JSON or TOML depending on their extension.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::presence::{MAX_JITTER, PresenceBounds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period before the debounced notification.
    pub debounce_ms: u64,
    /// Longest a continuous burst may delay the debounced notification.
    /// `null` (or 0) gives a pure trailing debounce.
    pub max_wait_ms: Option<u64>,
    /// How long the toolbar stays up after the surface loses focus.
    pub focus_grace_ms: u64,
    /// Toolbar distance from the selection's top edge, negative is above.
    pub toolbar_offset: f64,
    pub presence_period_ms: u64,
    pub presence_jitter: f64,
    pub presence_bounds: PresenceBounds,
    /// Fixed seed for the presence drift; random when absent.
    pub presence_seed: Option<u64>,
    /// Undo history length.
    pub undo_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            max_wait_ms: Some(1000),
            focus_grace_ms: 100,
            toolbar_offset: -40.0,
            presence_period_ms: 3000,
            presence_jitter: 25.0,
            presence_bounds: PresenceBounds::default(),
            presence_seed: None,
            undo_depth: 100,
        }
    }
}

impl EditorConfig {
    /// Load from a `.json` or `.toml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&text)?,
            Some("toml") => toml::from_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.presence_bounds.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "presence_bounds must be finite with min <= max: {:?}",
                self.presence_bounds
            )));
        }
        if self.presence_period_ms == 0 {
            return Err(ConfigError::Invalid("presence_period_ms must be positive".into()));
        }
        if !self.toolbar_offset.is_finite() || !self.presence_jitter.is_finite() {
            return Err(ConfigError::Invalid("offsets must be finite".into()));
        }
        if !(0.0..=MAX_JITTER).contains(&self.presence_jitter) {
            return Err(ConfigError::Invalid(format!(
                "presence_jitter must be within 0..={MAX_JITTER}, got {}",
                self.presence_jitter
            )));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    pub fn focus_grace(&self) -> Duration {
        Duration::from_millis(self.focus_grace_ms)
    }

    pub fn presence_period(&self) -> Duration {
        Duration::from_millis(self.presence_period_ms)
    }
}
