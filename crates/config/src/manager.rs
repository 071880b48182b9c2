//! Configuration manager - main API for settings operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

/// Loads, saves and overrides Lectern settings
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for the platform config directory
    ///
    /// - Linux: `~/.config/lectern/`
    /// - macOS: `~/Library/Application Support/lectern/`
    /// - Windows: `%APPDATA%\lectern\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a manager rooted at a custom directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let persistence = ConfigPersistence::new(config_dir.join(CONFIG_FILE));

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "lectern")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "could not determine user config directory".to_string(),
            })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.persistence.path().to_path_buf()
    }

    /// Loads settings; a missing file yields defaults
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads settings, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load settings: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and saves settings atomically
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads, applies `update_fn`, and saves
    ///
    /// ```rust,no_run
    /// # use lectern_config::ConfigManager;
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.player.default_pause_secs = 2.0;
    /// }).expect("Failed to update settings");
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default settings file if none exists
    ///
    /// Returns `Ok(true)` if a file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Settings file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        Ok(true)
    }

    /// Overwrites the settings file with defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Returns every validation problem in the stored settings
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads settings and applies `LECTERN_*` environment overrides
    ///
    /// Recognised variables:
    /// - `LECTERN_PLAYER_DEFAULT_SPEED`
    /// - `LECTERN_PLAYER_DEFAULT_PAUSE_SECS`
    /// - `LECTERN_APP_CATALOG_PATH`
    /// - `LECTERN_APP_LOG_LEVEL`
    ///
    /// Unparsable values are ignored with a warning.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        if let Err(errors) = config.validate() {
            log::warn!(
                "Settings validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(speed) = lookup("LECTERN_PLAYER_DEFAULT_SPEED") {
        match speed.parse::<f32>() {
            Ok(s) => config.player.default_speed = s,
            Err(_) => log::warn!("Ignoring LECTERN_PLAYER_DEFAULT_SPEED={}", speed),
        }
    }

    if let Some(pause) = lookup("LECTERN_PLAYER_DEFAULT_PAUSE_SECS") {
        match pause.parse::<f32>() {
            Ok(p) => config.player.default_pause_secs = p,
            Err(_) => log::warn!("Ignoring LECTERN_PLAYER_DEFAULT_PAUSE_SECS={}", pause),
        }
    }

    if let Some(path) = lookup("LECTERN_APP_CATALOG_PATH") {
        config.app.catalog_path = PathBuf::from(path);
    }

    if let Some(level) = lookup("LECTERN_APP_LOG_LEVEL") {
        match level.parse::<LogLevel>() {
            Ok(l) => config.app.log_level = l,
            Err(e) => log::warn!("Ignoring LECTERN_APP_LOG_LEVEL: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())
            .expect("Failed to create manager");
        (temp_dir, manager)
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_load_or_default_with_corrupted_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "not = [valid").expect("write");
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_update() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");

        manager
            .update(|config| config.player.default_speed = 1.25)
            .expect("Should update");

        assert_eq!(manager.load().expect("load").player.default_speed, 1.25);
    }

    #[test]
    fn test_initialize_only_once() {
        let (_temp_dir, manager) = setup_test_manager();
        assert!(manager.initialize().expect("first"));
        assert!(!manager.initialize().expect("second"));
        assert!(manager.config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();
        let mut config = Config::default();
        config.player.autoplay = false;
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");
        assert_eq!(manager.load().expect("load"), Config::default());
    }

    #[test]
    fn test_validate_valid_config() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");
        assert!(manager.validate().expect("validate").is_empty());
    }

    #[test]
    fn test_validate_reports_hand_edited_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(
            manager.config_path(),
            "[player]\ndefault_pause_secs = 90.0\n",
        )
        .expect("write");

        let errors = manager.validate().expect("validate");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("player.default_pause_secs"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LECTERN_PLAYER_DEFAULT_SPEED", "1.5"),
            ("LECTERN_PLAYER_DEFAULT_PAUSE_SECS", "2"),
            ("LECTERN_APP_CATALOG_PATH", "/books/catalog.json"),
            ("LECTERN_APP_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.player.default_speed, 1.5);
        assert_eq!(config.player.default_pause_secs, 2.0);
        assert_eq!(config.app.catalog_path, PathBuf::from("/books/catalog.json"));
        assert_eq!(config.app.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_env_overrides_ignore_garbage() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| match key {
            "LECTERN_PLAYER_DEFAULT_SPEED" => Some("fast".to_string()),
            _ => None,
        });
        assert_eq!(config.player.default_speed, 1.0);
    }
}
