//! Error types for Lectern settings

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading, validating or saving settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read settings file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write settings file {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Settings file {path} is not valid TOML: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Cannot serialize settings: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// One or more fields are out of range; the message lists every field
    #[error("Settings validation failed: {0}")]
    ValidationError(String),

    /// Written by a newer release than this one understands
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Cannot create settings directory {path}: {source}")]
    DirectoryCreationError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot determine settings directory: {reason}")]
    PathResolutionError { reason: String },

    #[error("Cannot back up settings file: {source}")]
    BackupError { source: std::io::Error },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Validation failure for a single settings field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the field (e.g. "player.default_speed")
    pub field: String,
    pub message: String,
    /// The rejected value, if it can be shown
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: Some(value.to_string()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.message)?;
        if let Some(ref value) = self.value {
            write!(f, " (got {})", value)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
