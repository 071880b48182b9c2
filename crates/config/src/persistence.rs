//! Settings file storage
//!
//! Writes land in a temporary file next to the target and are renamed into
//! place. The file being replaced is copied to `config.toml.backup` first.
//! Loading only warns about out-of-range values so hand edits survive.

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Location of the copy taken before each overwrite
    pub fn backup_path(&self) -> PathBuf {
        self.config_path.with_extension("toml.backup")
    }

    /// Reads the settings file; a missing file yields defaults
    pub fn load(&self) -> ConfigResult<Config> {
        let Some(text) = self.read_text()? else {
            log::info!(
                "No settings file at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        };

        let config = self.upgrade(self.decode(&text)?)?;
        if let Some(problems) = config.problems() {
            log::warn!("Settings out of range: {}", problems);
        }
        Ok(config)
    }

    /// Validates, backs up the previous file and writes atomically
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        if let Some(problems) = config.problems() {
            return Err(ConfigError::ValidationError(problems));
        }

        let dir = self.ensure_parent_dir()?;
        self.backup_existing()?;

        let text = toml::to_string_pretty(config)?;
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(text.as_bytes())?;
        staged.flush()?;
        staged
            .persist(&self.config_path)
            .map_err(|e| ConfigError::WriteError {
                path: self.config_path.clone(),
                source: e.error,
            })?;

        log::info!("Settings saved to {}", self.config_path.display());
        Ok(())
    }

    /// `None` when there is no file; a blank file is an error
    fn read_text(&self) -> ConfigResult<Option<String>> {
        let text = match fs::read_to_string(&self.config_path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::ReadError {
                    path: self.config_path.clone(),
                    source,
                })
            }
        };

        if text.trim().is_empty() {
            return Err(ConfigError::ReadError {
                path: self.config_path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidData, "settings file is empty"),
            });
        }
        Ok(Some(text))
    }

    fn decode(&self, text: &str) -> ConfigResult<Config> {
        toml::from_str(text).map_err(|source| ConfigError::ParseError {
            path: self.config_path.clone(),
            source,
        })
    }

    /// Rejects files from newer releases and stamps older ones as current
    fn upgrade(&self, mut config: Config) -> ConfigResult<Config> {
        let version = config.version;
        match version {
            v if v > CONFIG_VERSION => Err(ConfigError::UnsupportedVersion {
                found: v,
                supported: CONFIG_VERSION,
            }),
            v if v < CONFIG_VERSION => {
                log::info!("Upgrading settings from version {} to {}", v, CONFIG_VERSION);
                config.version = CONFIG_VERSION;
                Ok(config)
            }
            _ => Ok(config),
        }
    }

    fn ensure_parent_dir(&self) -> ConfigResult<&Path> {
        let dir = self
            .config_path
            .parent()
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "settings path has no parent directory".to_string(),
            })?;

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::DirectoryCreationError {
                path: dir.to_path_buf(),
                source,
            })?;
            log::info!("Created settings directory {}", dir.display());
        }
        Ok(dir)
    }

    fn backup_existing(&self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Ok(());
        }
        let backup = self.backup_path();
        fs::copy(&self.config_path, &backup).map_err(|source| ConfigError::BackupError { source })?;
        log::debug!("Previous settings kept at {}", backup.display());
        Ok(())
    }
}
