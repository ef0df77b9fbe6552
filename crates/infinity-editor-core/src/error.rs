//! Error types for editor operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the host surface (selection, geometry, rendering).
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PlatformError {
    /// The surface is not attached to a live view.
    #[error("surface is not mounted")]
    NotMounted,

    /// The live selection could not be read or written.
    #[error("selection unavailable: {0}")]
    Selection(String),

    /// Element geometry could not be measured.
    #[error("geometry unavailable: {0}")]
    Geometry(String),

    /// Rendering markup into the surface failed.
    #[error("render failed: {0}")]
    Render(String),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError::Other(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError::Other(s)
    }
}

/// Errors from parsing or executing a formatting command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    /// The action name is not a known formatting command.
    #[error("unknown format action: {0}")]
    UnknownAction(String),

    /// The command needs a value and none was given.
    #[error("{action} requires a value")]
    MissingValue { action: &'static str },

    /// The value is empty or carries characters that would break the markup.
    #[error("invalid value for {action}: {value:?}")]
    InvalidValue { action: &'static str, value: String },

    /// There is no saved selection to format.
    #[error("no selection to format")]
    NoSelection,

    /// The saved selection is a caret.
    #[error("selection is collapsed")]
    CollapsedSelection,

    /// The selection reaches past the end of the document.
    #[error("range {start}..{end} is out of bounds for length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

/// Errors from loading editor configuration.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file extension is neither `.json` nor `.toml`.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),

    /// A value parsed but makes no sense (e.g. an empty presence box).
    #[error("invalid config value: {0}")]
    Invalid(String),
}
